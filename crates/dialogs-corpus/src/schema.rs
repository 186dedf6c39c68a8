//! Static schema descriptors for the four corpus files.
//!
//! Each descriptor lists the record's fields in file order. Whether a field
//! is a scalar or a bracketed set is declared here once, never inferred from
//! the record contents.

/// The literal field separator used by every corpus file.
pub const DELIMITER: &str = " +++$+++ ";

/// The literal token that stands for an absent value.
pub const NULL_SENTINEL: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Scalar,
  /// A bracketed list literal, decoded into a duplicate-free set.
  Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  pub name: &'static str,
  pub kind: FieldKind,
}

impl Field {
  pub const fn scalar(name: &'static str) -> Self {
    Self { name, kind: FieldKind::Scalar }
  }

  pub const fn set(name: &'static str) -> Self { Self { name, kind: FieldKind::Set } }
}

/// The layout of one corpus file.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
  pub file_name: &'static str,
  pub fields:    &'static [Field],
}

impl Schema {
  pub fn arity(&self) -> usize { self.fields.len() }
}

pub static MOVIES: Schema = Schema {
  file_name: "movie_titles_metadata.txt",
  fields:    &[
    Field::scalar("id"),
    Field::scalar("title"),
    Field::scalar("year"),
    Field::scalar("imdb_rating"),
    Field::scalar("num_imdb_votes"),
    Field::set("genres"),
  ],
};

pub static CHARACTERS: Schema = Schema {
  file_name: "movie_characters_metadata.txt",
  fields:    &[
    Field::scalar("id"),
    Field::scalar("name"),
    Field::scalar("movie_id"),
    Field::scalar("movie_title"),
    Field::scalar("gender"),
    Field::scalar("credit_pos"),
  ],
};

pub static CONVERSATIONS: Schema = Schema {
  file_name: "movie_conversations.txt",
  fields:    &[
    Field::scalar("first_char_id"),
    Field::scalar("second_char_id"),
    Field::scalar("movie_id"),
    Field::set("line_ids"),
  ],
};

pub static LINES: Schema = Schema {
  file_name: "movie_lines.txt",
  fields:    &[
    Field::scalar("id"),
    Field::scalar("character_id"),
    Field::scalar("movie_id"),
    Field::scalar("character_name"),
    Field::scalar("text"),
  ],
};
