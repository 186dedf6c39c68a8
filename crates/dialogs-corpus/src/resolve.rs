//! Two-pass reference resolution.
//!
//! Conversation records enumerate the ids of their lines, but the line file
//! carries no back-reference. The first pass numbers conversations and
//! records `line id → conversation id` in a [`ConversationMap`]; the second
//! pass looks each line up in that map as it is inserted.
//!
//! A reference that cannot be resolved is a [`ReferenceError`]. It is never
//! fatal: the offending record is skipped and a [`Diagnostic`] is kept.

use std::collections::HashMap;

use dialogs_core::entity::EntityKind;
use thiserror::Error;

use crate::{error::Result, records::ConversationRecord};

// ─── Diagnostics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
  #[error("line {line_id} is not listed by any conversation")]
  UnknownLine { line_id: String },

  #[error("no character with id {id:?} and name {name:?}")]
  UnknownCharacter { id: String, name: String },

  #[error("no movie with id {id:?} and title {title:?}")]
  UnknownMovie { id: String, title: String },

  #[error("no movie with id {id:?}")]
  UnknownMovieId { id: String },

  #[error("unknown participant {character_id:?}")]
  UnknownParticipant { character_id: String },
}

/// A skipped record and the reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub kind:   EntityKind,
  /// Key of the skipped record.
  pub record: String,
  pub error:  ReferenceError,
}

impl Diagnostic {
  pub fn new(kind: EntityKind, record: impl Into<String>, error: ReferenceError) -> Self {
    Self { kind, record: record.into(), error }
  }
}

// ─── First pass ──────────────────────────────────────────────────────────────

/// Attach sequential 1-based ids to conversation records in file order.
///
/// A record that fails to parse still consumes its id so that ids always
/// reflect file position.
pub fn sequence<I>(records: I) -> impl Iterator<Item = (i64, Result<ConversationRecord>)>
where
  I: IntoIterator<Item = Result<ConversationRecord>>,
{
  (1..).zip(records)
}

/// Pending `line id → conversation id` assignments.
#[derive(Debug, Clone, Default)]
pub struct ConversationMap {
  owners: HashMap<String, i64>,
}

impl ConversationMap {
  pub fn new() -> Self { Self::default() }

  /// Record that `conversation_id` owns every id in `line_ids`.
  ///
  /// A line already owned by another conversation moves to the new one; the
  /// ids that moved are returned so the caller can report them.
  pub fn assign<'a>(
    &mut self,
    conversation_id: i64,
    line_ids: impl IntoIterator<Item = &'a String>,
  ) -> Vec<(String, i64)> {
    let mut moved = Vec::new();
    for line_id in line_ids {
      if let Some(previous) = self.owners.insert(line_id.clone(), conversation_id)
        && previous != conversation_id
      {
        moved.push((line_id.clone(), previous));
      }
    }
    moved
  }

  pub fn owner(&self, line_id: &str) -> Option<i64> {
    self.owners.get(line_id).copied()
  }

  // ── Second pass ───────────────────────────────────────────────────────

  /// Look up the conversation that owns `line_id`.
  pub fn resolve(&self, line_id: &str) -> Result<i64, ReferenceError> {
    self
      .owner(line_id)
      .ok_or_else(|| ReferenceError::UnknownLine { line_id: line_id.to_owned() })
  }

  pub fn len(&self) -> usize { self.owners.len() }

  pub fn is_empty(&self) -> bool { self.owners.is_empty() }
}

// ─── Lookup cache ────────────────────────────────────────────────────────────

/// Remembers the most recently resolved key.
///
/// Consecutive corpus records usually repeat the same movie or participant
/// pair. Only successful lookups are cached, and a miss always falls through
/// to the lookup, so results never depend on the cache.
#[derive(Debug)]
pub struct LastResolved<K, V> {
  entry: Option<(K, V)>,
}

impl<K, V> Default for LastResolved<K, V> {
  fn default() -> Self { Self { entry: None } }
}

impl<K: PartialEq, V: Clone> LastResolved<K, V> {
  pub fn new() -> Self { Self::default() }

  pub fn get_or_resolve<E>(
    &mut self,
    key: K,
    resolve: impl FnOnce(&K) -> Result<V, E>,
  ) -> Result<V, E> {
    if let Some((k, v)) = &self.entry
      && *k == key
    {
      return Ok(v.clone());
    }
    let value = resolve(&key)?;
    self.entry = Some((key, value.clone()));
    Ok(value)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::Error;

  fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn conv(lines: &[&str]) -> Result<ConversationRecord> {
    Ok(ConversationRecord {
      first_char_id:  "u0".into(),
      second_char_id: "u2".into(),
      movie_id:       "m0".into(),
      line_ids:       ids(lines),
    })
  }

  #[test]
  fn forward_references_resolve_after_first_pass() {
    let mut map = ConversationMap::new();
    for (id, rec) in sequence(vec![conv(&["L1", "L2", "L3"])]) {
      map.assign(id, &rec.unwrap().line_ids);
    }
    assert_eq!(map.owner("L1"), Some(1));
    assert_eq!(map.owner("L2"), Some(1));
    assert_eq!(map.owner("L3"), Some(1));
    assert_eq!(map.resolve("L2"), Ok(1));
    assert_eq!(map.len(), 3);
  }

  #[test]
  fn unknown_line_is_a_reference_error() {
    let map = ConversationMap::new();
    assert_eq!(
      map.resolve("L404"),
      Err(ReferenceError::UnknownLine { line_id: "L404".into() })
    );
  }

  #[test]
  fn ids_follow_file_position_even_past_bad_records() {
    let records = vec![
      conv(&["L1"]),
      Err(Error::MissingField { line: 2, field: "movie_id" }),
      conv(&["L3"]),
    ];
    let numbered: Vec<i64> = sequence(records).map(|(id, _)| id).collect();
    assert_eq!(numbered, vec![1, 2, 3]);
  }

  #[test]
  fn reassigned_line_moves_to_later_conversation() {
    let mut map = ConversationMap::new();
    assert!(map.assign(1, &ids(&["L1", "L2"])).is_empty());
    let moved = map.assign(2, &ids(&["L2"]));
    assert_eq!(moved, vec![("L2".to_string(), 1)]);
    assert_eq!(map.owner("L2"), Some(2));
  }

  #[test]
  fn cache_serves_repeated_key_without_lookup() {
    let mut cache = LastResolved::new();
    let mut calls = 0;
    for _ in 0..3 {
      let v: Result<i32, ()> = cache.get_or_resolve(("u0", "u2"), |_| {
        calls += 1;
        Ok(7)
      });
      assert_eq!(v, Ok(7));
    }
    assert_eq!(calls, 1);
  }

  #[test]
  fn cache_does_not_remember_failures() {
    let mut cache = LastResolved::<&str, bool>::new();
    assert!(cache.get_or_resolve("u9", |_| Err("missing")).is_err());
    assert_eq!(cache.get_or_resolve("u9", |_| Ok::<_, &str>(true)), Ok(true));
  }
}
