//! Record decoding.
//!
//! Pipeline:
//!   raw bytes
//!     └─ decode_latin1()        → String
//!          └─ parse_record()    → Record
//!               └─ parse_set()  → BTreeSet<String> (set-valued fields only)

use std::collections::{BTreeSet, HashMap};

use crate::{
  error::{Error, Result},
  schema::{DELIMITER, FieldKind, NULL_SENTINEL, Schema},
};

// ─── Values ──────────────────────────────────────────────────────────────────

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  /// The field held the null sentinel.
  Missing,
  Text(String),
  /// A bracketed list, duplicates removed. Order carries no meaning.
  Set(BTreeSet<String>),
}

/// A field-name-to-value mapping for one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  /// 1-based line number in the source file.
  pub line: usize,
  fields:   HashMap<&'static str, Value>,
}

impl Record {
  pub fn get(&self, field: &str) -> Option<&Value> { self.fields.get(field) }

  /// Remove and return a scalar field; `None` when absent or null.
  pub fn take_text(&mut self, field: &'static str) -> Option<String> {
    match self.fields.remove(field) {
      Some(Value::Text(s)) => Some(s),
      _ => None,
    }
  }

  /// Remove and return a scalar field that must be present.
  pub fn take_required(&mut self, field: &'static str) -> Result<String> {
    let line = self.line;
    self
      .take_text(field)
      .ok_or(Error::MissingField { line, field })
  }

  /// Remove and return a set-valued field; a null set is empty.
  pub fn take_set(&mut self, field: &'static str) -> BTreeSet<String> {
    match self.fields.remove(field) {
      Some(Value::Set(s)) => s,
      _ => BTreeSet::new(),
    }
  }

  /// Remove a scalar field and parse it as a number.
  pub fn take_number<T: std::str::FromStr>(
    &mut self,
    field: &'static str,
  ) -> Result<Option<T>> {
    let line = self.line;
    self
      .take_text(field)
      .map(|raw| {
        raw
          .trim()
          .parse::<T>()
          .map_err(|_| Error::InvalidNumber { line, field, value: raw })
      })
      .transpose()
  }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode ISO-8859-1 bytes. Every byte maps to the code point of equal value.
pub fn decode_latin1(bytes: &[u8]) -> String {
  bytes.iter().copied().map(char::from).collect()
}

/// Split one source line (without its line terminator) into a [`Record`].
pub fn parse_record(raw: &str, schema: &Schema, line: usize) -> Result<Record> {
  let parts: Vec<&str> = raw.split(DELIMITER).collect();
  if parts.len() != schema.arity() {
    return Err(Error::FieldCount {
      line,
      expected: schema.arity(),
      found: parts.len(),
    });
  }

  let mut fields = HashMap::with_capacity(parts.len());
  for (field, part) in schema.fields.iter().zip(parts) {
    let value = if part == NULL_SENTINEL {
      Value::Missing
    } else {
      match field.kind {
        FieldKind::Scalar => Value::Text(part.to_owned()),
        FieldKind::Set => Value::Set(parse_set(part).ok_or_else(|| {
          Error::InvalidSet { line, field: field.name, value: part.to_owned() }
        })?),
      }
    };
    fields.insert(field.name, value);
  }

  Ok(Record { line, fields })
}

/// Parse a bracketed list of quoted strings, e.g. `['comedy', "rock 'n' roll"]`.
///
/// Both quote styles and backslash escapes are accepted. Returns `None` for
/// anything that is not such a list.
pub fn parse_set(s: &str) -> Option<BTreeSet<String>> {
  let inner = s.trim().strip_prefix('[')?.strip_suffix(']')?;
  let mut items = BTreeSet::new();
  let mut chars = inner.chars().peekable();

  loop {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    let Some(quote) = chars.next() else { break };
    if quote != '\'' && quote != '"' {
      return None;
    }

    let mut item = String::new();
    loop {
      match chars.next()? {
        '\\' => match chars.next()? {
          'n' => item.push('\n'),
          't' => item.push('\t'),
          other => item.push(other),
        },
        c if c == quote => break,
        c => item.push(c),
      }
    }
    items.insert(item);

    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    match chars.next() {
      None => break,
      Some(',') => {}
      Some(_) => return None,
    }
  }

  Some(items)
}
