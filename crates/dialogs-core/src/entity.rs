//! Entity rows: the five record types of the dialogue corpus.
//!
//! Entities never hold references to one another. Relationships are plain id
//! columns (simple or composite) and are traversed through explicit store
//! lookups, see [`crate::view`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A film. `(id, title)` is unique and is the target of the composite
/// character → movie reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
  pub id:             String,
  pub title:          String,
  pub year:           Option<String>,
  pub imdb_rating:    Option<f64>,
  pub num_imdb_votes: Option<i64>,
}

/// A genre name, shared by many movies. Ids are store-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
  pub id:   i64,
  pub name: String,
}

/// A speaking character. `(id, name)` is unique and is the target of the
/// composite line → character reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
  pub id:          String,
  pub name:        String,
  pub movie_id:    String,
  pub movie_title: String,
  pub gender:      Option<String>,
  pub credit_pos:  Option<i64>,
}

/// An exchange between two characters. The id is the 1-based position of the
/// record in the conversation file, not a value from the raw data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
  pub id:             i64,
  pub first_char_id:  String,
  pub second_char_id: String,
  pub movie_id:       String,
}

/// A single utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
  pub id:              String,
  pub character_id:    String,
  pub character_name:  String,
  pub movie_id:        String,
  pub conversation_id: Option<i64>,
  pub text:            Option<String>,
}

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Discriminant for the five entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Movie,
  Genre,
  Character,
  Conversation,
  Line,
}

impl EntityKind {
  pub const ALL: [EntityKind; 5] = [
    EntityKind::Movie,
    EntityKind::Genre,
    EntityKind::Character,
    EntityKind::Conversation,
    EntityKind::Line,
  ];

  /// Table name, also used as the search index name.
  pub fn table(self) -> &'static str {
    match self {
      EntityKind::Movie => "movies",
      EntityKind::Genre => "genres",
      EntityKind::Character => "characters",
      EntityKind::Conversation => "conversations",
      EntityKind::Line => "lines",
    }
  }

  /// Singular name, used as the key of single-record responses.
  pub fn singular(self) -> &'static str {
    match self {
      EntityKind::Movie => "movie",
      EntityKind::Genre => "genre",
      EntityKind::Character => "character",
      EntityKind::Conversation => "conversation",
      EntityKind::Line => "line",
    }
  }

  /// Whether ids of this kind are store-assigned integers.
  pub fn has_integer_id(self) -> bool {
    matches!(self, EntityKind::Genre | EntityKind::Conversation)
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.table())
  }
}

impl FromStr for EntityKind {
  type Err = Error;

  /// Accepts both the singular kind and the plural table name.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    EntityKind::ALL
      .into_iter()
      .find(|k| {
        s.eq_ignore_ascii_case(k.table())
          || s.eq_ignore_ascii_case(k.singular())
      })
      .ok_or_else(|| Error::UnknownEntityKind(s.to_owned()))
  }
}

// ─── Any entity ──────────────────────────────────────────────────────────────

/// One row of any kind, as returned by mixed-kind fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entity {
  Movie(Movie),
  Genre(Genre),
  Character(Character),
  Conversation(Conversation),
  Line(Line),
}

impl Entity {
  pub fn kind(&self) -> EntityKind {
    match self {
      Entity::Movie(_) => EntityKind::Movie,
      Entity::Genre(_) => EntityKind::Genre,
      Entity::Character(_) => EntityKind::Character,
      Entity::Conversation(_) => EntityKind::Conversation,
      Entity::Line(_) => EntityKind::Line,
    }
  }

  /// The primary key rendered as a string, the form the search index uses.
  pub fn key(&self) -> String {
    match self {
      Entity::Movie(m) => m.id.clone(),
      Entity::Genre(g) => g.id.to_string(),
      Entity::Character(c) => c.id.clone(),
      Entity::Conversation(c) => c.id.to_string(),
      Entity::Line(l) => l.id.clone(),
    }
  }
}
