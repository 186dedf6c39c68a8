//! Error types for `dialogs-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown entity kind: {0:?}")]
  UnknownEntityKind(String),

  #[error("page limit must be at least 1")]
  ZeroLimit,

  #[error("page limit {limit} exceeds the maximum of {max}")]
  LimitTooLarge { limit: usize, max: usize },

  #[error("start offset {start} is past the last of {total} items")]
  StartOutOfRange { start: usize, total: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
