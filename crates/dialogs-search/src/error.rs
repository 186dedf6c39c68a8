//! Error type for `dialogs-search`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No index is configured. Queries never return this; they degrade to an
  /// empty page instead.
  #[error("search is disabled")]
  Disabled,

  #[error("{op} timed out")]
  Timeout { op: &'static str },

  /// The index service could not be asked whether an index exists.
  #[error("search index unavailable: {0}")]
  Unavailable(#[source] Box<Error>),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("index responded with {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed index response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("bulk load rejected documents: {0}")]
  Bulk(String),

  #[error("cannot read index settings from {path}: {source}")]
  Settings {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("index error: {0}")]
  Index(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
