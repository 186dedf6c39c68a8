//! JSON REST API for the movie-dialog corpus.
//!
//! Exposes an axum [`Router`] backed by any
//! [`dialogs_core::store::CorpusStore`] and a [`Retriever`] over any
//! [`dialogs_core::search::SearchIndex`]. The API is read-only.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/moviedb/api/v0.1", dialogs_api::api_router(state))
//! ```
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/{kind}` | `?start=&limit=`; 404 past the last item |
//! | `GET`  | `/{kind}/search` | `?q=&start=&limit=` |
//! | `GET`  | `/{kind}/{id}` | 404 if not found |
//!
//! `kind` is a table name (`movies`, `genres`, `characters`,
//! `conversations`, `lines`) or its singular.

pub mod error;
pub mod listing;
pub mod records;
pub mod search;

use std::sync::Arc;

use axum::{Router, routing::get};
use dialogs_core::{entity::EntityKind, search::SearchIndex, store::CorpusStore};
use dialogs_search::Retriever;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S, I> {
  pub store:     Arc<S>,
  pub retriever: Arc<Retriever<S, I>>,
}

impl<S, I> Clone for ApiState<S, I> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), retriever: self.retriever.clone() }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, I>(state: ApiState<S, I>) -> Router<()>
where
  S: CorpusStore + 'static,
  I: SearchIndex + 'static,
{
  Router::new()
    .route("/{kind}", get(listing::handler::<S, I>))
    .route("/{kind}/search", get(search::handler::<S, I>))
    .route("/{kind}/{id}", get(records::get_one::<S, I>))
    .with_state(state)
}

/// Resolve the `{kind}` path segment. An unknown kind is a missing resource.
fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
  raw
    .parse()
    .map_err(|_| ApiError::NotFound(format!("no such collection: {raw}")))
}

fn store_error<E>(e: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Store(Box::new(e))
}
