//! Streaming readers over corpus files.
//!
//! A reader is a finite, single-pass iterator. It holds one line in memory at
//! a time and cannot be rewound; reopen the source to read it again.

use std::{
  fs::File,
  io::{BufRead, BufReader},
  marker::PhantomData,
  path::Path,
};

use crate::{
  error::{Error, Result},
  parse::{Record, decode_latin1, parse_record},
  schema::Schema,
};

/// Yields one [`Record`] per non-blank source line.
pub struct RecordReader<R> {
  source: R,
  schema: &'static Schema,
  line:   usize,
  buf:    Vec<u8>,
  done:   bool,
}

impl<R: BufRead> RecordReader<R> {
  pub fn new(source: R, schema: &'static Schema) -> Self {
    Self { source, schema, line: 0, buf: Vec::new(), done: false }
  }

  pub fn schema(&self) -> &'static Schema { self.schema }
}

impl RecordReader<BufReader<File>> {
  /// Open `path` and read it against `schema`.
  pub fn open(path: impl AsRef<Path>, schema: &'static Schema) -> Result<Self> {
    let path = path.as_ref();
    let file = File::open(path)
      .map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
    Ok(Self::new(BufReader::new(file), schema))
  }
}

impl<R: BufRead> Iterator for RecordReader<R> {
  type Item = Result<Record>;

  fn next(&mut self) -> Option<Self::Item> {
    while !self.done {
      self.buf.clear();
      match self.source.read_until(b'\n', &mut self.buf) {
        Ok(0) => self.done = true,
        Ok(_) => {
          self.line += 1;
          let text = decode_latin1(&self.buf);
          let text = text.strip_suffix('\n').unwrap_or(&text);
          let text = text.strip_suffix('\r').unwrap_or(text);
          if text.is_empty() {
            continue;
          }
          return Some(parse_record(text, self.schema, self.line));
        }
        Err(source) => {
          self.done = true;
          return Some(Err(Error::Io { line: self.line, source }));
        }
      }
    }
    None
  }
}

// ─── Typed records ───────────────────────────────────────────────────────────

/// A type that can be built from one record of a fixed schema.
pub trait FromRecord: Sized {
  const SCHEMA: &'static Schema;

  fn from_record(record: Record) -> Result<Self>;
}

/// A [`RecordReader`] that converts each record into `T`.
pub struct TypedReader<R, T> {
  inner:   RecordReader<R>,
  _marker: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: FromRecord> TypedReader<R, T> {
  pub fn new(source: R) -> Self {
    Self { inner: RecordReader::new(source, T::SCHEMA), _marker: PhantomData }
  }
}

impl<R: BufRead, T: FromRecord> Iterator for TypedReader<R, T> {
  type Item = Result<T>;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|r| r.and_then(T::from_record))
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;
  use crate::{parse::Value, schema::LINES};

  #[test]
  fn reads_records_and_skips_blank_lines() {
    let data = b"L1 +++$+++ u0 +++$+++ m0 +++$+++ A +++$+++ hi\r\n\nL2 +++$+++ u1 +++$+++ m0 +++$+++ B +++$+++ yo\n";
    let records: Vec<_> = RecordReader::new(Cursor::new(&data[..]), &LINES)
      .collect::<Result<_>>()
      .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("text"), Some(&Value::Text("hi".into())));
    assert_eq!(records[1].line, 3);
    assert_eq!(records[1].get("id"), Some(&Value::Text("L2".into())));
  }

  #[test]
  fn last_line_without_newline_is_read() {
    let data = b"L1 +++$+++ u0 +++$+++ m0 +++$+++ A +++$+++ bye";
    let mut reader = RecordReader::new(Cursor::new(&data[..]), &LINES);
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().is_none());
    assert!(reader.next().is_none());
  }

  #[test]
  fn decodes_latin1_bytes() {
    let data = b"L1 +++$+++ u0 +++$+++ m0 +++$+++ A +++$+++ na\xefve\n";
    let record = RecordReader::new(Cursor::new(&data[..]), &LINES)
      .next()
      .unwrap()
      .unwrap();
    assert_eq!(record.get("text"), Some(&Value::Text("naïve".into())));
  }

  #[test]
  fn malformed_line_surfaces_its_number() {
    let data = b"L1 +++$+++ u0 +++$+++ m0 +++$+++ A +++$+++ ok\nL2 +++$+++ broken\n";
    let results: Vec<_> = RecordReader::new(Cursor::new(&data[..]), &LINES).collect();
    assert!(results[0].is_ok());
    assert!(matches!(
      results[1],
      Err(Error::FieldCount { line: 2, expected: 5, found: 2 })
    ));
  }

  #[test]
  fn open_missing_file_names_the_path() {
    let err = RecordReader::open("/nonexistent/movie_lines.txt", &LINES)
      .err()
      .unwrap();
    assert!(matches!(err, Error::Open { .. }));
  }
}
