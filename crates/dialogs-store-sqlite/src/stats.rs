//! Gathers the rows behind the descriptive statistics in
//! [`dialogs_core::stats`]. Each function returns `None` for an unknown id.

use dialogs_core::stats::{CharacterStats, ConversationStats, MovieStats};
use rusqlite::{Connection, OptionalExtension as _};

fn texts(
  conn: &Connection,
  sql: &str,
  key: &dyn rusqlite::ToSql,
) -> rusqlite::Result<Vec<Option<String>>> {
  let mut stmt = conn.prepare_cached(sql)?;
  let rows = stmt
    .query_map([key], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn count(conn: &Connection, sql: &str, key: &dyn rusqlite::ToSql) -> rusqlite::Result<usize> {
  let n: i64 = conn.query_row(sql, [key], |r| r.get(0))?;
  Ok(usize::try_from(n).unwrap_or_default())
}

fn exists(conn: &Connection, table: &str, key: &dyn rusqlite::ToSql) -> rusqlite::Result<bool> {
  conn
    .query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1"), [key], |_| Ok(()))
    .optional()
    .map(|row| row.is_some())
}

pub(crate) fn conversation(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<Option<ConversationStats>> {
  if !exists(conn, "conversations", &id)? {
    return Ok(None);
  }
  let lines = texts(conn, "SELECT text FROM lines WHERE conversation_id = ?1", &id)?;
  Ok(Some(ConversationStats::compute(id, &lines)))
}

pub(crate) fn character(conn: &Connection, id: &str) -> rusqlite::Result<Option<CharacterStats>> {
  if !exists(conn, "characters", &id)? {
    return Ok(None);
  }
  Ok(Some(character_unchecked(conn, id)?))
}

fn character_unchecked(conn: &Connection, id: &str) -> rusqlite::Result<CharacterStats> {
  let conversations =
    count(conn, "SELECT COUNT(*) FROM convs_chars WHERE character_id = ?1", &id)?;
  let lines = texts(conn, "SELECT text FROM lines WHERE character_id = ?1", &id)?;
  Ok(CharacterStats::compute(id, conversations, &lines))
}

pub(crate) fn movie(conn: &Connection, id: &str) -> rusqlite::Result<Option<MovieStats>> {
  if !exists(conn, "movies", &id)? {
    return Ok(None);
  }
  let conversations =
    count(conn, "SELECT COUNT(*) FROM conversations WHERE movie_id = ?1", &id)?;
  let lines = texts(conn, "SELECT text FROM lines WHERE movie_id = ?1", &id)?;

  let cast: Vec<(String, Option<String>)> = {
    let mut stmt = conn.prepare_cached(
      "SELECT id, gender FROM characters WHERE movie_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt
      .query_map([id], |r| Ok((r.get(0)?, r.get(1)?)))?
      .collect::<rusqlite::Result<_>>()?;
    rows
  };
  let characters = cast
    .iter()
    .map(|(character_id, _)| character_unchecked(conn, character_id))
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let genders: Vec<Option<String>> = cast.into_iter().map(|(_, gender)| gender).collect();

  Ok(Some(MovieStats::compute(id, conversations, &lines, &characters, &genders)))
}
