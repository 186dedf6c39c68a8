//! [`SqliteStore`], the SQLite implementation of [`CorpusStore`].

use std::path::Path;

use dialogs_core::{
  duplicate::DuplicatePair,
  entity::{Entity, EntityKind, Line},
  page::PageRequest,
  search::IndexDocument,
  stats::{CharacterStats, ConversationStats, MovieStats},
  store::CorpusStore,
  view::{CharacterView, ConversationView, GenreView, MovieView},
};
use dialogs_corpus::{
  CharacterReader, ConversationMap, ConversationReader, LineReader, MovieReader,
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};

use crate::{
  Result,
  encode::{
    CHARACTER_COLUMNS, CONVERSATION_COLUMNS, GENRE_COLUMNS, LINE_COLUMNS, MOVIE_COLUMNS,
    character_from_row, columns, conversation_from_row, entity_from_row, genre_from_row,
    key_value, line_from_row, movie_from_row, placeholders,
  },
  merge::{self, MergeOutcome},
  schema::SCHEMA,
  stats,
  writer::{self, StageReport},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A corpus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Ingestion stages ──────────────────────────────────────────────────
  //
  // Each stage streams its reader into one transaction on the database
  // thread and commits once.

  pub async fn insert_movies(&self, records: MovieReader) -> Result<StageReport> {
    self
      .conn
      .call(move |conn| Ok(writer::write_movies(conn, records)))
      .await?
  }

  pub async fn insert_characters(&self, records: CharacterReader) -> Result<StageReport> {
    self
      .conn
      .call(move |conn| Ok(writer::write_characters(conn, records)))
      .await?
  }

  pub async fn insert_conversations(
    &self,
    records: ConversationReader,
  ) -> Result<(StageReport, ConversationMap)> {
    self
      .conn
      .call(move |conn| Ok(writer::write_conversations(conn, records)))
      .await?
  }

  pub async fn insert_lines(
    &self,
    records: LineReader,
    map: ConversationMap,
  ) -> Result<StageReport> {
    self
      .conn
      .call(move |conn| Ok(writer::write_lines(conn, records, &map)))
      .await?
  }

  // ── Duplicate repair ──────────────────────────────────────────────────

  /// Merge one duplicate character into its canonical record atomically.
  pub async fn merge_duplicate(&self, pair: DuplicatePair) -> Result<MergeOutcome> {
    self
      .conn
      .call(move |conn| Ok(merge::merge_pair(conn, &pair)))
      .await?
  }

  /// Ids of every character currently stored. Used by tests and sanity
  /// checks after a merge.
  pub async fn character_ids(&self) -> Result<Vec<String>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM characters ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  // ── Statistics ────────────────────────────────────────────────────────

  pub async fn movie_stats(&self, id: String) -> Result<Option<MovieStats>> {
    let stats = self
      .conn
      .call(move |conn| Ok(stats::movie(conn, &id)?))
      .await?;
    Ok(stats)
  }

  pub async fn character_stats(&self, id: String) -> Result<Option<CharacterStats>> {
    let stats = self
      .conn
      .call(move |conn| Ok(stats::character(conn, &id)?))
      .await?;
    Ok(stats)
  }

  pub async fn conversation_stats(&self, id: i64) -> Result<Option<ConversationStats>> {
    let stats = self
      .conn
      .call(move |conn| Ok(stats::conversation(conn, id)?))
      .await?;
    Ok(stats)
  }

  /// Run raw SQL against the store, e.g. to install a trigger.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Read helpers (run on the database thread) ──────────────────────────────

fn ids<T: rusqlite::types::FromSql>(
  conn: &Connection,
  sql: &str,
  key: impl rusqlite::ToSql,
) -> rusqlite::Result<Vec<T>> {
  let mut stmt = conn.prepare_cached(sql)?;
  let rows = stmt
    .query_map([key], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<T>>>()?;
  Ok(rows)
}

// ─── CorpusStore impl ────────────────────────────────────────────────────────

impl CorpusStore for SqliteStore {
  type Error = crate::Error;

  async fn get_movie(&self, id: String) -> Result<Option<MovieView>> {
    let view = self
      .conn
      .call(move |conn| {
        let Some(movie) = conn
          .query_row(
            &format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ?1"),
            [&id],
            movie_from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        Ok(Some(MovieView {
          genres: ids(
            conn,
            "SELECT g.name FROM genres g
             JOIN movie_genres mg ON mg.genre_id = g.id
             WHERE mg.movie_id = ?1 ORDER BY g.name",
            &id,
          )?,
          characters: ids(
            conn,
            "SELECT id FROM characters WHERE movie_id = ?1 ORDER BY rowid",
            &id,
          )?,
          conversations: ids(
            conn,
            "SELECT id FROM conversations WHERE movie_id = ?1 ORDER BY id",
            &id,
          )?,
          movie,
        }))
      })
      .await?;
    Ok(view)
  }

  async fn get_genre(&self, id: i64) -> Result<Option<GenreView>> {
    let view = self
      .conn
      .call(move |conn| {
        let Some(genre) = conn
          .query_row(
            &format!("SELECT {GENRE_COLUMNS} FROM genres WHERE id = ?1"),
            [id],
            genre_from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        Ok(Some(GenreView {
          movies: ids(
            conn,
            "SELECT movie_id FROM movie_genres WHERE genre_id = ?1 ORDER BY movie_id",
            id,
          )?,
          genre,
        }))
      })
      .await?;
    Ok(view)
  }

  async fn get_character(&self, id: String) -> Result<Option<CharacterView>> {
    let view = self
      .conn
      .call(move |conn| {
        let Some(character) = conn
          .query_row(
            &format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = ?1"),
            [&id],
            character_from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        Ok(Some(CharacterView {
          lines: ids(
            conn,
            "SELECT id FROM lines WHERE character_id = ?1 ORDER BY rowid",
            &id,
          )?,
          conversations: ids(
            conn,
            "SELECT conversation_id FROM convs_chars
             WHERE character_id = ?1 ORDER BY conversation_id",
            &id,
          )?,
          character,
        }))
      })
      .await?;
    Ok(view)
  }

  async fn get_conversation(&self, id: i64) -> Result<Option<ConversationView>> {
    let view = self
      .conn
      .call(move |conn| {
        let Some(conversation) = conn
          .query_row(
            &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
            [id],
            conversation_from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        Ok(Some(ConversationView {
          characters: ids(
            conn,
            "SELECT character_id FROM convs_chars
             WHERE conversation_id = ?1 ORDER BY character_id",
            id,
          )?,
          lines: ids(
            conn,
            "SELECT id FROM lines WHERE conversation_id = ?1 ORDER BY rowid",
            id,
          )?,
          conversation,
        }))
      })
      .await?;
    Ok(view)
  }

  async fn get_line(&self, id: String) -> Result<Option<Line>> {
    let line = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {LINE_COLUMNS} FROM lines WHERE id = ?1"),
              [&id],
              line_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(line)
  }

  async fn count(&self, kind: EntityKind) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", kind.table()), [], |r| {
          r.get(0)
        })?)
      })
      .await?;
    Ok(n as usize)
  }

  async fn list(&self, kind: EntityKind, page: PageRequest) -> Result<Vec<Entity>> {
    // SQLite reads a negative LIMIT as unbounded and a negative OFFSET as
    // zero, so out-of-range values clamp rather than wrap.
    let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.start).unwrap_or(i64::MAX);

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM {} ORDER BY rowid LIMIT ?1 OFFSET ?2",
          columns(kind),
          kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![limit, offset], |row| entity_from_row(kind, row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn fetch_many(&self, kind: EntityKind, ids: Vec<String>) -> Result<Vec<Entity>> {
    let keys: Vec<_> = ids
      .into_iter()
      .filter_map(|id| key_value(kind, id))
      .collect();
    if keys.is_empty() {
      return Ok(Vec::new());
    }

    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM {} WHERE id IN ({}) ORDER BY rowid",
          columns(kind),
          kind.table(),
          placeholders(keys.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(keys), |row| entity_from_row(kind, row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn documents(&self, kind: EntityKind) -> Result<Vec<IndexDocument>> {
    let rows = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM {} ORDER BY rowid", columns(kind), kind.table());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| entity_from_row(kind, row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows.iter().map(IndexDocument::from_entity).collect())
  }
}
