//! Entity store writer: one transaction per entity type.
//!
//! Each `write_*` function consumes a typed corpus reader inside a single
//! transaction. A parse error returns early, which drops the transaction and
//! rolls back every row written for that file. Unresolved references are
//! recorded as [`Diagnostic`]s and the record is skipped.
//!
//! Dependency order is the caller's responsibility: movies (with genres),
//! then characters, then conversations, then lines.

use dialogs_core::entity::EntityKind;
use dialogs_corpus::{
  CharacterReader, ConversationMap, ConversationReader, ConversationRecord, Diagnostic,
  LastResolved, LineReader, MovieReader, MovieRecord, ReferenceError, resolve,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::Result;

/// Outcome of writing one corpus file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
  pub kind:        EntityKind,
  pub inserted:    usize,
  /// Records skipped because a reference could not be resolved.
  pub diagnostics: Vec<Diagnostic>,
}

impl StageReport {
  fn new(kind: EntityKind) -> Self { Self { kind, inserted: 0, diagnostics: Vec::new() } }

  fn skip(&mut self, record: impl Into<String>, error: ReferenceError) {
    self.diagnostics.push(Diagnostic::new(self.kind, record, error));
  }
}

// ─── Movies and genres ───────────────────────────────────────────────────────

pub(crate) fn write_movies(conn: &mut Connection, records: MovieReader) -> Result<StageReport> {
  let tx = conn.transaction()?;
  let mut report = StageReport::new(EntityKind::Movie);
  {
    let mut insert_movie = tx.prepare_cached(
      "INSERT INTO movies (id, title, year, imdb_rating, num_imdb_votes)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut find_genre = tx.prepare_cached("SELECT id FROM genres WHERE name = ?1")?;
    let mut insert_genre = tx.prepare_cached("INSERT INTO genres (name) VALUES (?1)")?;
    let mut link_genre = tx.prepare_cached(
      "INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?1, ?2)",
    )?;

    for record in records {
      let MovieRecord { movie, genres } = record?;
      insert_movie.execute(params![
        movie.id,
        movie.title,
        movie.year,
        movie.imdb_rating,
        movie.num_imdb_votes,
      ])?;

      for name in &genres {
        let genre_id = match find_genre
          .query_row([name], |row| row.get::<_, i64>(0))
          .optional()?
        {
          Some(id) => id,
          None => insert_genre.insert([name])?,
        };
        link_genre.execute(params![movie.id, genre_id])?;
      }
      report.inserted += 1;
    }
  }
  tx.commit()?;
  Ok(report)
}

// ─── Characters ──────────────────────────────────────────────────────────────

pub(crate) fn write_characters(
  conn: &mut Connection,
  records: CharacterReader,
) -> Result<StageReport> {
  let tx = conn.transaction()?;
  let mut report = StageReport::new(EntityKind::Character);
  {
    let mut find_movie =
      tx.prepare_cached("SELECT 1 FROM movies WHERE id = ?1 AND title = ?2")?;
    let mut insert = tx.prepare_cached(
      "INSERT INTO characters (id, name, movie_id, movie_title, gender, credit_pos)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut movies = LastResolved::new();

    for record in records {
      let c = record?;
      let known = movies.get_or_resolve(
        (c.movie_id.clone(), c.movie_title.clone()),
        |(id, title)| find_movie.exists(params![id, title]),
      )?;
      if !known {
        report.skip(c.id, ReferenceError::UnknownMovie {
          id:    c.movie_id,
          title: c.movie_title,
        });
        continue;
      }

      insert.execute(params![c.id, c.name, c.movie_id, c.movie_title, c.gender, c.credit_pos])?;
      report.inserted += 1;
    }
  }
  tx.commit()?;
  Ok(report)
}

// ─── Conversations (first pass) ──────────────────────────────────────────────

/// Insert conversations and build the pending `line id → conversation id`
/// map for the line pass.
pub(crate) fn write_conversations(
  conn: &mut Connection,
  records: ConversationReader,
) -> Result<(StageReport, ConversationMap)> {
  let tx = conn.transaction()?;
  let mut report = StageReport::new(EntityKind::Conversation);
  let mut map = ConversationMap::new();
  {
    let mut find_character = tx.prepare_cached("SELECT 1 FROM characters WHERE id = ?1")?;
    let mut find_movie = tx.prepare_cached("SELECT 1 FROM movies WHERE id = ?1")?;
    let mut insert = tx.prepare_cached(
      "INSERT INTO conversations (id, first_char_id, second_char_id, movie_id)
       VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut add_member = tx.prepare_cached(
      "INSERT OR IGNORE INTO convs_chars (conversation_id, character_id) VALUES (?1, ?2)",
    )?;
    // Cached value: the first participant that does not exist, if any.
    let mut participants = LastResolved::<(String, String), Option<String>>::new();
    let mut movies = LastResolved::new();

    for (id, record) in resolve::sequence(records) {
      let ConversationRecord { first_char_id, second_char_id, movie_id, line_ids } = record?;

      let missing = participants.get_or_resolve(
        (first_char_id.clone(), second_char_id.clone()),
        |(first, second)| -> rusqlite::Result<Option<String>> {
          for character_id in [first, second] {
            if !find_character.exists([character_id])? {
              return Ok(Some(character_id.clone()));
            }
          }
          Ok(None)
        },
      )?;
      if let Some(character_id) = missing {
        report.skip(id.to_string(), ReferenceError::UnknownParticipant { character_id });
        continue;
      }
      if !movies.get_or_resolve(movie_id.clone(), |id| find_movie.exists([id]))? {
        report.skip(id.to_string(), ReferenceError::UnknownMovieId { id: movie_id });
        continue;
      }

      insert.execute(params![id, first_char_id, second_char_id, movie_id])?;
      add_member.execute(params![id, first_char_id])?;
      add_member.execute(params![id, second_char_id])?;

      for (line_id, previous) in map.assign(id, &line_ids) {
        tracing::warn!(%line_id, previous, conversation = id, "line listed by two conversations");
      }
      report.inserted += 1;
    }
  }
  tx.commit()?;
  Ok((report, map))
}

// ─── Lines (second pass) ─────────────────────────────────────────────────────

/// Insert lines, attaching each to the conversation that listed it.
pub(crate) fn write_lines(
  conn: &mut Connection,
  records: LineReader,
  map: &ConversationMap,
) -> Result<StageReport> {
  let tx = conn.transaction()?;
  let mut report = StageReport::new(EntityKind::Line);
  {
    let mut find_character =
      tx.prepare_cached("SELECT 1 FROM characters WHERE id = ?1 AND name = ?2")?;
    let mut find_movie = tx.prepare_cached("SELECT 1 FROM movies WHERE id = ?1")?;
    let mut insert = tx.prepare_cached(
      "INSERT INTO lines (id, character_id, character_name, movie_id, conversation_id, text)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut characters = LastResolved::new();
    let mut movies = LastResolved::new();

    for record in records {
      let mut line = record?;

      let conversation_id = match map.resolve(&line.id) {
        Ok(id) => id,
        Err(e) => {
          report.skip(line.id, e);
          continue;
        }
      };

      let known = characters.get_or_resolve(
        (line.character_id.clone(), line.character_name.clone()),
        |(id, name)| find_character.exists(params![id, name]),
      )?;
      if !known {
        report.skip(line.id, ReferenceError::UnknownCharacter {
          id:   line.character_id,
          name: line.character_name,
        });
        continue;
      }
      if !movies.get_or_resolve(line.movie_id.clone(), |id| find_movie.exists([id]))? {
        report.skip(line.id, ReferenceError::UnknownMovieId { id: line.movie_id });
        continue;
      }

      line.conversation_id = Some(conversation_id);
      insert.execute(params![
        line.id,
        line.character_id,
        line.character_name,
        line.movie_id,
        line.conversation_id,
        line.text,
      ])?;
      report.inserted += 1;
    }
  }
  tx.commit()?;
  Ok(report)
}
