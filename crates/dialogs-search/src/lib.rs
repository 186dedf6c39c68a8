//! Ranked retrieval over an external full-text index.
//!
//! [`ElasticIndex`] speaks the Elasticsearch REST protocol and implements
//! [`dialogs_core::search::SearchIndex`]. [`Retriever`] combines any such
//! index with a [`dialogs_core::store::CorpusStore`]: the index decides
//! which records match and in what order, the store supplies the records.

pub mod elastic;
pub mod error;
pub mod retrieval;

pub use elastic::ElasticIndex;
pub use error::{Error, Result};
pub use retrieval::{RetrievalConfig, Retriever};
