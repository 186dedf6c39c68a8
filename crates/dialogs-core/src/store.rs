//! The `CorpusStore` trait: the read side of the relational store.
//!
//! The trait is implemented by storage backends (e.g.
//! `dialogs-store-sqlite`). The retrieval engine and the HTTP layer depend on
//! this abstraction, not on any concrete backend. Ingestion and duplicate
//! repair are batch operations owned by the backend itself.

use std::future::Future;

use crate::{
  entity::{Entity, EntityKind, Line},
  page::PageRequest,
  search::IndexDocument,
  view::{CharacterView, ConversationView, GenreView, MovieView},
};

/// Read-only access to a fully ingested corpus.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CorpusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Single lookups ────────────────────────────────────────────────────

  fn get_movie(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Option<MovieView>, Self::Error>> + Send + '_;

  fn get_genre(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<GenreView>, Self::Error>> + Send + '_;

  fn get_character(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Option<CharacterView>, Self::Error>> + Send + '_;

  fn get_conversation(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ConversationView>, Self::Error>> + Send + '_;

  fn get_line(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Option<Line>, Self::Error>> + Send + '_;

  // ── Bulk reads ────────────────────────────────────────────────────────

  /// Total number of rows of `kind`.
  fn count(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// A window of rows of `kind` in store order.
  fn list(
    &self,
    kind: EntityKind,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Entity>, Self::Error>> + Send + '_;

  /// Fetch the rows of `kind` whose keys are in `ids`.
  ///
  /// The result is in store order; unknown ids are silently absent. Callers
  /// that need another order must sort the result themselves.
  fn fetch_many(
    &self,
    kind: EntityKind,
    ids: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Entity>, Self::Error>> + Send + '_;

  /// Every row of `kind` in its searchable document form.
  fn documents(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<Vec<IndexDocument>, Self::Error>> + Send + '_;
}
