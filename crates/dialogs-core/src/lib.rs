//! Core types and trait definitions for the movie-dialog corpus store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The corpus reader, the SQLite store, the retrieval engine and the API all
//! depend on it; it depends on nothing of theirs.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod duplicate;
pub mod entity;
pub mod error;
pub mod page;
pub mod search;
pub mod stats;
pub mod store;
pub mod view;

pub use error::{Error, Result};
