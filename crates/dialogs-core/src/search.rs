//! The `SearchIndex` trait and the types exchanged with an external
//! full-text index.
//!
//! The index only ever stores searchable copies of store rows keyed by
//! [`Entity::key`](crate::entity::Entity::key). Ranking is computed entirely
//! by the index; the store is consulted afterwards to fetch full records.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::{Entity, EntityKind};

/// A searchable copy of one store row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
  pub id:   String,
  pub body: serde_json::Value,
}

impl IndexDocument {
  /// Build the searchable copy of `entity`. Conversations have no free text
  /// and are indexed by their reference columns.
  pub fn from_entity(entity: &Entity) -> Self {
    let body = match entity {
      Entity::Movie(m) => json!({ "title": m.title, "year": m.year }),
      Entity::Genre(g) => json!({ "name": g.name }),
      Entity::Character(c) => json!({ "name": c.name, "movie_title": c.movie_title }),
      Entity::Conversation(c) => json!({
        "first_char_id":  c.first_char_id,
        "second_char_id": c.second_char_id,
        "movie_id":       c.movie_id,
      }),
      Entity::Line(l) => json!({ "character_name": l.character_name, "text": l.text }),
    };
    Self { id: entity.key(), body }
  }
}

/// One page of index hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHits {
  /// Matching keys in relevance order.
  pub ids:   Vec<String>,
  /// Total number of matches across all pages.
  pub total: usize,
}

impl SearchHits {
  pub fn is_empty(&self) -> bool { self.total == 0 }
}

/// Abstraction over an external full-text index with one index per entity
/// kind.
///
/// `create` must be idempotent (create-if-absent) so that concurrent first
/// callers cannot fail each other.
pub trait SearchIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn exists(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Create the index for `kind` unless it already exists.
  fn create(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Add or replace documents in the index for `kind`.
  fn add_documents(
    &self,
    kind: EntityKind,
    docs: Vec<IndexDocument>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve once documents added so far are visible to queries.
  fn wait_ready(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Run a free-text query and return one page of hits.
  fn query<'a>(
    &'a self,
    kind: EntityKind,
    text: &'a str,
    start: usize,
    limit: usize,
  ) -> impl Future<Output = Result<SearchHits, Self::Error>> + Send + 'a;
}
