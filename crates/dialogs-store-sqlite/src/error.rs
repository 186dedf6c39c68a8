//! Error type for `dialogs-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("corpus error: {0}")]
  Corpus(#[from] dialogs_corpus::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// Ingestion only ever targets an empty store.
  #[error("store already holds {0} movies; ingest into an empty store")]
  NotEmpty(usize),

  /// A duplicate merge would leave a dangling reference. The pair's
  /// transaction has been rolled back.
  #[error("cannot merge {duplicate} into {canonical}: {reason}")]
  ConsistencyViolation {
    duplicate: String,
    canonical: String,
    reason:    String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
