//! Read-model views: an entity together with the ids of its related rows.
//!
//! Views are computed on read by indexed lookups and never stored. They
//! replace live back-references between entities.

use serde::{Deserialize, Serialize};

use crate::entity::{Character, Conversation, Genre, Movie};

/// A movie with its genre names, characters and conversations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieView {
  #[serde(flatten)]
  pub movie:         Movie,
  pub genres:        Vec<String>,
  pub characters:    Vec<String>,
  pub conversations: Vec<i64>,
}

/// A genre with the ids of the movies tagged with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreView {
  #[serde(flatten)]
  pub genre:  Genre,
  pub movies: Vec<String>,
}

/// A character with the lines it speaks and the conversations it is a member
/// of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterView {
  #[serde(flatten)]
  pub character:     Character,
  pub lines:         Vec<String>,
  pub conversations: Vec<i64>,
}

/// A conversation with its participant set and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationView {
  #[serde(flatten)]
  pub conversation: Conversation,
  /// Membership set; always contains both named participants.
  pub characters:   Vec<String>,
  pub lines:        Vec<String>,
}
