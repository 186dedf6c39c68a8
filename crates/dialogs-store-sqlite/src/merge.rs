//! Duplicate identity merger.
//!
//! Each `(duplicate → canonical)` pair is repaired in its own transaction:
//!
//! 1. load both characters;
//! 2. repoint lines, updating the id and the denormalised name in one
//!    statement so the composite reference never splits;
//! 3. repoint conversations, both the named participant columns and the
//!    participant set;
//! 4. verify nothing references the duplicate any more, then delete it.
//!
//! Any failure drops the transaction, leaving the pair untouched.

use dialogs_core::duplicate::DuplicatePair;
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{Error, Result};

/// What a successful merge moved onto the canonical character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
  pub pair:                DuplicatePair,
  pub lines_moved:         usize,
  /// Conversations the duplicate named or belonged to.
  pub conversations_moved: usize,
}

/// Result of repairing a whole remap table.
#[derive(Debug, Default)]
pub struct MergeReport {
  pub merged: Vec<MergeOutcome>,
  /// Pairs whose transaction was rolled back, with the reason.
  pub failed: Vec<(DuplicatePair, Error)>,
}

impl MergeReport {
  pub fn is_clean(&self) -> bool { self.failed.is_empty() }
}

pub(crate) fn merge_pair(conn: &mut Connection, pair: &DuplicatePair) -> Result<MergeOutcome> {
  let DuplicatePair { duplicate, canonical } = pair;
  let violation = |reason: String| Error::ConsistencyViolation {
    duplicate: duplicate.clone(),
    canonical: canonical.clone(),
    reason,
  };

  if duplicate == canonical {
    return Err(violation("a character cannot be merged into itself".into()));
  }

  let tx = conn.transaction()?;

  // ── 1. Load ───────────────────────────────────────────────────────────
  let name_of = |id: &str| {
    tx.query_row("SELECT name FROM characters WHERE id = ?1", [id], |r| {
      r.get::<_, String>(0)
    })
    .optional()
  };
  if name_of(duplicate.as_str())?.is_none() {
    return Err(violation(format!("duplicate character {duplicate} does not exist")));
  }
  let canonical_name = name_of(canonical.as_str())?
    .ok_or_else(|| violation(format!("canonical character {canonical} does not exist")))?;

  // ── 2. Lines ──────────────────────────────────────────────────────────
  let lines_moved = tx.execute(
    "UPDATE lines SET character_id = ?1, character_name = ?2 WHERE character_id = ?3",
    params![canonical, canonical_name, duplicate],
  )?;

  // ── 3. Conversations ──────────────────────────────────────────────────
  let conversations_moved: i64 = tx.query_row(
    "SELECT COUNT(*) FROM (
       SELECT conversation_id FROM convs_chars WHERE character_id = ?1
       UNION
       SELECT id FROM conversations WHERE first_char_id = ?1 OR second_char_id = ?1
     )",
    [duplicate],
    |r| r.get(0),
  )?;

  tx.execute(
    "INSERT OR IGNORE INTO convs_chars (conversation_id, character_id)
       SELECT conversation_id, ?2 FROM convs_chars WHERE character_id = ?1
       UNION
       SELECT id, ?2 FROM conversations WHERE first_char_id = ?1 OR second_char_id = ?1",
    params![duplicate, canonical],
  )?;
  tx.execute(
    "UPDATE conversations SET first_char_id = ?2 WHERE first_char_id = ?1",
    params![duplicate, canonical],
  )?;
  tx.execute(
    "UPDATE conversations SET second_char_id = ?2 WHERE second_char_id = ?1",
    params![duplicate, canonical],
  )?;
  tx.execute("DELETE FROM convs_chars WHERE character_id = ?1", [duplicate])?;

  // ── 4. Verify and retire ──────────────────────────────────────────────
  let dangling: i64 = tx.query_row(
    "SELECT (SELECT COUNT(*) FROM lines WHERE character_id = ?1)
          + (SELECT COUNT(*) FROM conversations
               WHERE first_char_id = ?1 OR second_char_id = ?1)
          + (SELECT COUNT(*) FROM convs_chars WHERE character_id = ?1)",
    [duplicate],
    |r| r.get(0),
  )?;
  if dangling != 0 {
    return Err(violation(format!("{dangling} references to {duplicate} remain")));
  }
  tx.execute("DELETE FROM characters WHERE id = ?1", [duplicate])?;

  tx.commit()?;
  Ok(MergeOutcome {
    pair: pair.clone(),
    lines_moved,
    conversations_moved: conversations_moved as usize,
  })
}
