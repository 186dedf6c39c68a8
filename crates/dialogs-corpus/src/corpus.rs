//! The four-file corpus as a set of byte sources.

use std::{
  fs::File,
  io::{BufRead, BufReader, Cursor},
  path::Path,
};

use dialogs_core::entity::{Character, Line};

use crate::{
  error::{Error, Result},
  reader::TypedReader,
  records::{ConversationRecord, MovieRecord},
  schema::{CHARACTERS, CONVERSATIONS, LINES, MOVIES, Schema},
};

/// A boxed, sendable byte source for one corpus file.
pub type Source = Box<dyn BufRead + Send>;

/// Open sources for every corpus file. Each can be read exactly once.
pub struct Corpus {
  pub movies:        Source,
  pub characters:    Source,
  pub conversations: Source,
  pub lines:         Source,
}

impl Corpus {
  /// Open the standard file names under `dir`.
  pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    let open = |schema: &Schema| -> Result<Source> {
      let path = dir.join(schema.file_name);
      let file = File::open(&path).map_err(|source| Error::Open { path, source })?;
      Ok(Box::new(BufReader::new(file)))
    };
    Ok(Self {
      movies:        open(&MOVIES)?,
      characters:    open(&CHARACTERS)?,
      conversations: open(&CONVERSATIONS)?,
      lines:         open(&LINES)?,
    })
  }

  /// Build a corpus from in-memory file contents.
  pub fn from_bytes(
    movies: impl Into<Vec<u8>>,
    characters: impl Into<Vec<u8>>,
    conversations: impl Into<Vec<u8>>,
    lines: impl Into<Vec<u8>>,
  ) -> Self {
    fn source(bytes: impl Into<Vec<u8>>) -> Source { Box::new(Cursor::new(bytes.into())) }
    Self {
      movies:        source(movies),
      characters:    source(characters),
      conversations: source(conversations),
      lines:         source(lines),
    }
  }
}

pub type MovieReader = TypedReader<Source, MovieRecord>;
pub type CharacterReader = TypedReader<Source, Character>;
pub type ConversationReader = TypedReader<Source, ConversationRecord>;
pub type LineReader = TypedReader<Source, Line>;
