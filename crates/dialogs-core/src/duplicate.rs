//! The duplicate-identity remap table.
//!
//! The corpus contains a handful of characters that were entered twice under
//! different ids. The table is static configuration supplied at merge time.

use serde::{Deserialize, Serialize};

/// A `(duplicate → canonical)` character id pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicatePair {
  /// The id that is retired by the merge.
  pub duplicate: String,
  /// The id that survives and absorbs the duplicate's dependents.
  pub canonical: String,
}

impl DuplicatePair {
  pub fn new(duplicate: impl Into<String>, canonical: impl Into<String>) -> Self {
    Self { duplicate: duplicate.into(), canonical: canonical.into() }
  }
}

/// Character ids known to be duplicated in the Cornell movie-dialogs corpus.
pub const KNOWN_DUPLICATES: [(&str, &str); 3] = [
  ("u5784", "u5783"),
  ("u5786", "u5785"),
  ("u6564", "u6563"),
];

pub fn known_duplicates() -> Vec<DuplicatePair> {
  KNOWN_DUPLICATES
    .iter()
    .map(|(dup, canon)| DuplicatePair::new(*dup, *canon))
    .collect()
}
