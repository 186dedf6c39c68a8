//! Reader and reference resolver for the Cornell movie-dialogs corpus.
//!
//! Pure synchronous; no database dependencies. Files are decoded as
//! ISO-8859-1, split on a literal multi-character delimiter, and mapped onto
//! static per-file schemas.
//!
//! # Quick start
//!
//! ```no_run
//! use dialogs_corpus::{Corpus, MovieReader};
//!
//! let corpus = Corpus::open_dir("corpus").unwrap();
//! for movie in MovieReader::new(corpus.movies) {
//!   let movie = movie.unwrap();
//!   println!("{} has {} genres", movie.movie.title, movie.genres.len());
//! }
//! ```

mod corpus;
pub mod error;
pub mod parse;
pub mod reader;
pub mod records;
pub mod resolve;
pub mod schema;

pub use corpus::{
  CharacterReader, ConversationReader, Corpus, LineReader, MovieReader, Source,
};
pub use error::{Error, Result};
pub use records::{ConversationRecord, MovieRecord};
pub use resolve::{ConversationMap, Diagnostic, LastResolved, ReferenceError};
