//! Error types for the corpus reader.
//!
//! Every variant is a parse error: it aborts ingestion of the file it was
//! raised for. Unresolved cross-file references are not errors of this kind;
//! see [`crate::resolve::ReferenceError`].

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to open {path:?}: {source}")]
  Open {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("read error after line {line}: {source}")]
  Io {
    line:   usize,
    #[source]
    source: io::Error,
  },

  #[error("line {line}: expected {expected} fields, found {found}")]
  FieldCount { line: usize, expected: usize, found: usize },

  #[error("line {line}: missing required field {field}")]
  MissingField { line: usize, field: &'static str },

  #[error("line {line}: invalid number in {field}: {value:?}")]
  InvalidNumber { line: usize, field: &'static str, value: String },

  #[error("line {line}: malformed set literal in {field}: {value:?}")]
  InvalidSet { line: usize, field: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
