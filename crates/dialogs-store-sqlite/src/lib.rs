//! SQLite backend for the movie-dialog corpus.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Besides the read-only
//! [`CorpusStore`](dialogs_core::store::CorpusStore) implementation, this
//! crate owns the two batch jobs that mutate the store: ingestion
//! ([`ingest`]) and duplicate repair ([`repair`]).

mod encode;
mod merge;
mod pipeline;
mod schema;
mod stats;
mod store;
mod writer;

pub mod error;

pub use error::{Error, Result};
pub use merge::{MergeOutcome, MergeReport};
pub use pipeline::{IngestReport, ingest, repair};
pub use store::SqliteStore;
pub use writer::StageReport;
