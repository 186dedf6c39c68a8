//! Descriptive statistics over stored dialogue.
//!
//! Line lengths are counted in characters after inline markup such as
//! `<i>never</i>` is reduced to its content. Lines without text are left out
//! of length averages. Every ratio is `None` when its denominator is zero.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

static MARKUP: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<\w+>(.+?)</\w+>").expect("markup pattern is valid"));

/// Replace each `<tag>text</tag>` span with `text`.
pub fn strip_markup(text: &str) -> Cow<'_, str> { MARKUP.replace_all(text, "$1") }

/// Length of a line in characters, ignoring inline markup.
pub fn line_length(text: &str) -> usize { strip_markup(text).chars().count() }

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
  let (sum, n) = values
    .into_iter()
    .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
  (n > 0).then(|| sum / n as f64)
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
  (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn mean_line_length<'a>(texts: impl IntoIterator<Item = &'a Option<String>>) -> Option<f64> {
  mean(texts.into_iter().flatten().map(|t| line_length(t) as f64))
}

// ─── Conversation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationStats {
  pub id:              i64,
  pub lines:           usize,
  pub avg_line_length: Option<f64>,
}

impl ConversationStats {
  pub fn compute(id: i64, texts: &[Option<String>]) -> Self {
    Self { id, lines: texts.len(), avg_line_length: mean_line_length(texts) }
  }
}

// ─── Character ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterStats {
  pub id:                     String,
  pub conversations:          usize,
  pub lines:                  usize,
  pub lines_per_conversation: Option<f64>,
  pub avg_line_length:        Option<f64>,
}

impl CharacterStats {
  /// `conversations` counts the conversations the character belongs to.
  pub fn compute(id: impl Into<String>, conversations: usize, texts: &[Option<String>]) -> Self {
    Self {
      id: id.into(),
      conversations,
      lines: texts.len(),
      lines_per_conversation: ratio(texts.len(), conversations),
      avg_line_length: mean_line_length(texts),
    }
  }
}

// ─── Movie ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieStats {
  pub id:                                String,
  pub characters:                        usize,
  pub conversations:                     usize,
  pub lines:                             usize,
  pub lines_per_conversation:            Option<f64>,
  pub avg_line_length:                   Option<f64>,
  /// Share of `f` among characters whose gender is `f` or `m`.
  pub female_ratio:                      Option<f64>,
  /// Mean of the per-character values that are defined.
  pub characters_lines_per_conversation: Option<f64>,
  pub characters_avg_line_length:        Option<f64>,
}

impl MovieStats {
  /// `genders` holds one entry per character of the movie.
  pub fn compute(
    id: impl Into<String>,
    conversations: usize,
    texts: &[Option<String>],
    characters: &[CharacterStats],
    genders: &[Option<String>],
  ) -> Self {
    let (female, known) = genders
      .iter()
      .flatten()
      .map(|g| g.to_ascii_lowercase())
      .fold((0, 0), |(f, n), g| match g.as_str() {
        "f" => (f + 1, n + 1),
        "m" => (f, n + 1),
        _ => (f, n),
      });

    Self {
      id: id.into(),
      characters: characters.len(),
      conversations,
      lines: texts.len(),
      lines_per_conversation: ratio(texts.len(), conversations),
      avg_line_length: mean_line_length(texts),
      female_ratio: ratio(female, known),
      characters_lines_per_conversation: mean(
        characters.iter().filter_map(|c| c.lines_per_conversation),
      ),
      characters_avg_line_length: mean(characters.iter().filter_map(|c| c.avg_line_length)),
    }
  }
}
