//! Mapping between SQLite rows and domain entities.
//!
//! Each entity kind has a fixed column list; `*_from_row` expects exactly
//! those columns in that order.

use dialogs_core::entity::{Character, Conversation, Entity, EntityKind, Genre, Line, Movie};
use rusqlite::{Row, types::Value};

pub const MOVIE_COLUMNS: &str = "id, title, year, imdb_rating, num_imdb_votes";
pub const GENRE_COLUMNS: &str = "id, name";
pub const CHARACTER_COLUMNS: &str =
  "id, name, movie_id, movie_title, gender, credit_pos";
pub const CONVERSATION_COLUMNS: &str = "id, first_char_id, second_char_id, movie_id";
pub const LINE_COLUMNS: &str =
  "id, character_id, character_name, movie_id, conversation_id, text";

pub fn columns(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Movie => MOVIE_COLUMNS,
    EntityKind::Genre => GENRE_COLUMNS,
    EntityKind::Character => CHARACTER_COLUMNS,
    EntityKind::Conversation => CONVERSATION_COLUMNS,
    EntityKind::Line => LINE_COLUMNS,
  }
}

pub fn movie_from_row(row: &Row<'_>) -> rusqlite::Result<Movie> {
  Ok(Movie {
    id:             row.get(0)?,
    title:          row.get(1)?,
    year:           row.get(2)?,
    imdb_rating:    row.get(3)?,
    num_imdb_votes: row.get(4)?,
  })
}

pub fn genre_from_row(row: &Row<'_>) -> rusqlite::Result<Genre> {
  Ok(Genre { id: row.get(0)?, name: row.get(1)? })
}

pub fn character_from_row(row: &Row<'_>) -> rusqlite::Result<Character> {
  Ok(Character {
    id:          row.get(0)?,
    name:        row.get(1)?,
    movie_id:    row.get(2)?,
    movie_title: row.get(3)?,
    gender:      row.get(4)?,
    credit_pos:  row.get(5)?,
  })
}

pub fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
  Ok(Conversation {
    id:             row.get(0)?,
    first_char_id:  row.get(1)?,
    second_char_id: row.get(2)?,
    movie_id:       row.get(3)?,
  })
}

pub fn line_from_row(row: &Row<'_>) -> rusqlite::Result<Line> {
  Ok(Line {
    id:              row.get(0)?,
    character_id:    row.get(1)?,
    character_name:  row.get(2)?,
    movie_id:        row.get(3)?,
    conversation_id: row.get(4)?,
    text:            row.get(5)?,
  })
}

pub fn entity_from_row(kind: EntityKind, row: &Row<'_>) -> rusqlite::Result<Entity> {
  Ok(match kind {
    EntityKind::Movie => Entity::Movie(movie_from_row(row)?),
    EntityKind::Genre => Entity::Genre(genre_from_row(row)?),
    EntityKind::Character => Entity::Character(character_from_row(row)?),
    EntityKind::Conversation => Entity::Conversation(conversation_from_row(row)?),
    EntityKind::Line => Entity::Line(line_from_row(row)?),
  })
}

/// Bind a string key with the affinity of the kind's primary key.
///
/// Returns `None` for a non-numeric key of an integer-keyed kind; such a key
/// can never match a row.
pub fn key_value(kind: EntityKind, key: String) -> Option<Value> {
  if kind.has_integer_id() {
    key.parse::<i64>().ok().map(Value::Integer)
  } else {
    Some(Value::Text(key))
  }
}

/// `?1, ?2, …, ?n`
pub fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integer_kinds_reject_non_numeric_keys() {
    assert_eq!(
      key_value(EntityKind::Conversation, "12".into()),
      Some(Value::Integer(12))
    );
    assert_eq!(key_value(EntityKind::Genre, "drama".into()), None);
    assert_eq!(
      key_value(EntityKind::Movie, "m5".into()),
      Some(Value::Text("m5".into()))
    );
  }

  #[test]
  fn placeholder_list() {
    assert_eq!(placeholders(3), "?1, ?2, ?3");
    assert_eq!(placeholders(0), "");
  }
}
