//! Typed corpus records built from decoded field maps.

use std::collections::BTreeSet;

use dialogs_core::entity::{Character, Line, Movie};

use crate::{
  error::Result,
  parse::Record,
  reader::FromRecord,
  schema::{CHARACTERS, CONVERSATIONS, LINES, MOVIES, Schema},
};

/// A movie row plus the genre names declared on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
  pub movie:  Movie,
  pub genres: BTreeSet<String>,
}

impl FromRecord for MovieRecord {
  const SCHEMA: &'static Schema = &MOVIES;

  fn from_record(mut r: Record) -> Result<Self> {
    Ok(Self {
      movie:  Movie {
        id:             r.take_required("id")?,
        title:          r.take_text("title").unwrap_or_default(),
        year:           r.take_text("year"),
        imdb_rating:    r.take_number("imdb_rating")?,
        num_imdb_votes: r.take_number("num_imdb_votes")?,
      },
      genres: r.take_set("genres"),
    })
  }
}

impl FromRecord for Character {
  const SCHEMA: &'static Schema = &CHARACTERS;

  fn from_record(mut r: Record) -> Result<Self> {
    Ok(Character {
      id:          r.take_required("id")?,
      name:        r.take_text("name").unwrap_or_default(),
      movie_id:    r.take_required("movie_id")?,
      movie_title: r.take_text("movie_title").unwrap_or_default(),
      gender:      r.take_text("gender"),
      credit_pos:  r.take_number("credit_pos")?,
    })
  }
}

/// A conversation as listed in the source file: two participants and the
/// ids of lines that do not exist yet. The id is assigned on ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRecord {
  pub first_char_id:  String,
  pub second_char_id: String,
  pub movie_id:       String,
  pub line_ids:       BTreeSet<String>,
}

impl FromRecord for ConversationRecord {
  const SCHEMA: &'static Schema = &CONVERSATIONS;

  fn from_record(mut r: Record) -> Result<Self> {
    Ok(Self {
      first_char_id:  r.take_required("first_char_id")?,
      second_char_id: r.take_required("second_char_id")?,
      movie_id:       r.take_required("movie_id")?,
      line_ids:       r.take_set("line_ids"),
    })
  }
}

/// Lines carry no conversation back-reference in the source; the
/// `conversation_id` is left empty here and filled in by the resolver.
impl FromRecord for Line {
  const SCHEMA: &'static Schema = &LINES;

  fn from_record(mut r: Record) -> Result<Self> {
    Ok(Line {
      id:              r.take_required("id")?,
      character_id:    r.take_required("character_id")?,
      character_name:  r.take_text("character_name").unwrap_or_default(),
      movie_id:        r.take_required("movie_id")?,
      conversation_id: None,
      text:            r.take_text("text"),
    })
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;
  use crate::{Error, reader::TypedReader};

  fn read<T: FromRecord>(data: &'static [u8]) -> Vec<Result<T>> {
    TypedReader::<_, T>::new(Cursor::new(data)).collect()
  }

  #[test]
  fn movie_scenario_round_trips_every_field() {
    let rows = read::<MovieRecord>(
      b"m0 +++$+++ movie title +++$+++ 1999 +++$+++ 7.5 +++$+++ 100 +++$+++ ['comedy','drama']\n",
    );
    let rec = rows.into_iter().next().unwrap().unwrap();
    assert_eq!(rec.movie.id, "m0");
    assert_eq!(rec.movie.title, "movie title");
    assert_eq!(rec.movie.year.as_deref(), Some("1999"));
    assert_eq!(rec.movie.imdb_rating, Some(7.5));
    assert_eq!(rec.movie.num_imdb_votes, Some(100));
    assert_eq!(
      rec.genres,
      ["comedy", "drama"].into_iter().map(String::from).collect()
    );
  }

  #[test]
  fn character_optional_fields_accept_sentinel() {
    let rows = read::<Character>(
      b"u0 +++$+++ BIANCA +++$+++ m0 +++$+++ 10 things i hate about you +++$+++ f +++$+++ 4\n\
        u1 +++$+++ BRUCE +++$+++ m0 +++$+++ 10 things i hate about you +++$+++ ? +++$+++ ?\n",
    );
    let chars: Vec<Character> = rows.into_iter().collect::<Result<_>>().unwrap();
    assert_eq!(chars[0].gender.as_deref(), Some("f"));
    assert_eq!(chars[0].credit_pos, Some(4));
    assert_eq!(chars[1].gender, None);
    assert_eq!(chars[1].credit_pos, None);
    assert_eq!(chars[1].movie_title, "10 things i hate about you");
  }

  #[test]
  fn conversation_lists_pending_line_ids() {
    let rows = read::<ConversationRecord>(
      b"u0 +++$+++ u2 +++$+++ m0 +++$+++ ['L194', 'L195', 'L196', 'L197']\n",
    );
    let conv = rows.into_iter().next().unwrap().unwrap();
    assert_eq!(conv.first_char_id, "u0");
    assert_eq!(conv.second_char_id, "u2");
    assert_eq!(conv.line_ids.len(), 4);
    assert!(conv.line_ids.contains("L196"));
  }

  #[test]
  fn line_text_may_be_absent() {
    let rows = read::<Line>(b"L9 +++$+++ u0 +++$+++ m0 +++$+++ BIANCA +++$+++ ?\n");
    let line = rows.into_iter().next().unwrap().unwrap();
    assert_eq!(line.text, None);
    assert_eq!(line.conversation_id, None);
  }

  #[test]
  fn missing_id_is_a_parse_error() {
    let rows = read::<Line>(b"? +++$+++ u0 +++$+++ m0 +++$+++ BIANCA +++$+++ hi\n");
    assert!(matches!(
      rows[0],
      Err(Error::MissingField { line: 1, field: "id" })
    ));
  }
}
