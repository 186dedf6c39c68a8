//! The ingestion batch job and the duplicate repair job.
//!
//! Both thread an explicit [`SqliteStore`] handle through every stage. No
//! transaction spans more than one stage (ingestion) or one pair (repair).

use dialogs_core::{duplicate::DuplicatePair, entity::EntityKind, store::CorpusStore as _};
use dialogs_corpus::{
  CharacterReader, ConversationReader, Corpus, Diagnostic, LineReader, MovieReader,
};

use crate::{Error, MergeReport, Result, SqliteStore, StageReport};

/// Per-stage outcome of one ingestion run, in stage order.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
  pub stages: Vec<StageReport>,
}

impl IngestReport {
  /// Every skipped record across all stages.
  pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
    self.stages.iter().flat_map(|s| s.diagnostics.iter())
  }

  pub fn inserted(&self, kind: EntityKind) -> usize {
    self
      .stages
      .iter()
      .filter(|s| s.kind == kind)
      .map(|s| s.inserted)
      .sum()
  }

  fn record(&mut self, report: StageReport) {
    tracing::info!(
      kind = %report.kind,
      inserted = report.inserted,
      skipped = report.diagnostics.len(),
      "stage committed"
    );
    for d in &report.diagnostics {
      tracing::warn!(kind = %d.kind, record = %d.record, error = %d.error, "record skipped");
    }
    self.stages.push(report);
  }
}

/// Load a whole corpus into an empty store.
///
/// Stages run in dependency order and each commits on its own. A parse error
/// in one file aborts the run after rolling back that file; earlier stages
/// stay committed.
pub async fn ingest(store: &SqliteStore, corpus: Corpus) -> Result<IngestReport> {
  let existing = store.count(EntityKind::Movie).await?;
  if existing > 0 {
    return Err(Error::NotEmpty(existing));
  }

  let Corpus { movies, characters, conversations, lines } = corpus;
  let mut report = IngestReport::default();

  tracing::info!("ingesting movies and genres");
  report.record(store.insert_movies(MovieReader::new(movies)).await?);

  tracing::info!("ingesting characters");
  report.record(store.insert_characters(CharacterReader::new(characters)).await?);

  tracing::info!("ingesting conversations");
  let (stage, map) = store
    .insert_conversations(ConversationReader::new(conversations))
    .await?;
  tracing::debug!(pending_lines = map.len(), "line assignments collected");
  report.record(stage);

  tracing::info!("ingesting lines");
  report.record(store.insert_lines(LineReader::new(lines), map).await?);

  Ok(report)
}

/// Merge every pair of `table`, each in its own transaction.
///
/// A failing pair is rolled back and reported; the remaining pairs still run.
pub async fn repair(store: &SqliteStore, table: &[DuplicatePair]) -> MergeReport {
  let mut report = MergeReport::default();
  for pair in table {
    match store.merge_duplicate(pair.clone()).await {
      Ok(outcome) => {
        tracing::info!(
          duplicate = %pair.duplicate,
          canonical = %pair.canonical,
          lines = outcome.lines_moved,
          conversations = outcome.conversations_moved,
          "merged duplicate character"
        );
        report.merged.push(outcome);
      }
      Err(e) => {
        tracing::error!(
          duplicate = %pair.duplicate,
          canonical = %pair.canonical,
          error = %e,
          "duplicate merge rolled back"
        );
        report.failed.push((pair.clone(), e));
      }
    }
  }
  report
}
