//! `dialogs`: ingest, repair, index and serve the movie-dialog corpus.
//!
//! # Usage
//!
//! ```text
//! dialogs ingest --corpus ./corpus       # load an empty store, then merge duplicates
//! dialogs merge                          # duplicate repair only
//! dialogs index --rebuild movies lines   # (re)build search indices
//! dialogs search movies nightmare        # print one ranked page as JSON
//! dialogs stats movies m0                # line and cast statistics as JSON
//! dialogs serve --port 5000              # JSON API under /moviedb/api/v0.1
//! ```
//!
//! Settings come from `dialogs.toml` (or `--config`) and `DIALOGS_*`
//! environment variables.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use dialogs_api::{ApiState, api_router};
use dialogs_core::{entity::EntityKind, page::PageRequest};
use dialogs_corpus::Corpus;
use dialogs_search::{ElasticIndex, Retriever};
use dialogs_store_sqlite::{SqliteStore, ingest, repair};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

const API_PREFIX: &str = "/moviedb/api/v0.1";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "dialogs", version, about = "Movie-dialog corpus store and search")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dialogs.toml", global = true)]
  config: PathBuf,

  /// Override the store path from the configuration.
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load the corpus into an empty store and repair known duplicates.
  Ingest {
    /// Directory holding the four corpus files.
    #[arg(long)]
    corpus:     Option<PathBuf>,
    /// Leave duplicate characters in place.
    #[arg(long)]
    skip_merge: bool,
  },
  /// Merge duplicate characters listed in the configuration.
  Merge,
  /// Build missing search indices from the store.
  Index {
    /// Kinds to index; all kinds when omitted.
    kinds:   Vec<EntityKind>,
    /// Delete and rebuild even when an index already exists.
    #[arg(long)]
    rebuild: bool,
  },
  /// Run one search and print the page as JSON.
  Search {
    kind:  EntityKind,
    query: String,
    #[arg(long, default_value_t = 0)]
    start: usize,
    #[arg(long, default_value_t = PageRequest::DEFAULT_LIMIT)]
    limit: usize,
  },
  /// Print statistics for one movie, character or conversation as JSON.
  Stats {
    kind: EntityKind,
    id:   String,
  },
  /// Serve the JSON API.
  Serve {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::Ingest { corpus, skip_merge } => {
      let dir = corpus.unwrap_or_else(|| settings.corpus_dir.clone());
      let corpus = Corpus::open_dir(&dir)
        .with_context(|| format!("failed to open corpus in {}", dir.display()))?;
      let report = ingest(&store, corpus).await.context("ingestion failed")?;
      tracing::info!(
        movies = report.inserted(EntityKind::Movie),
        characters = report.inserted(EntityKind::Character),
        conversations = report.inserted(EntityKind::Conversation),
        lines = report.inserted(EntityKind::Line),
        skipped = report.diagnostics().count(),
        "ingestion complete"
      );
      if !skip_merge {
        merge(&store, &settings).await?;
      }
    }
    Command::Merge => merge(&store, &settings).await?,
    Command::Index { kinds, rebuild } => {
      let retriever = retriever(store, &settings)?;
      if !retriever.is_enabled() {
        bail!("search is disabled; set search.enabled = true");
      }
      let kinds = if kinds.is_empty() { EntityKind::ALL.to_vec() } else { kinds };
      for kind in kinds {
        let built = if rebuild {
          retriever.rebuild(kind).await
        } else {
          retriever.ensure_index(kind).await
        };
        built.with_context(|| format!("failed to build the {kind} index"))?;
      }
    }
    Command::Search { kind, query, start, limit } => {
      let retriever = retriever(store, &settings)?;
      let request = PageRequest::new(start, limit)?;
      let page = retriever.search(kind, &query, request).await?;
      println!("{}", serde_json::to_string_pretty(&page)?);
    }
    Command::Stats { kind, id } => {
      let stats = match kind {
        EntityKind::Movie => serde_json::to_value(store.movie_stats(id.clone()).await?)?,
        EntityKind::Character => {
          serde_json::to_value(store.character_stats(id.clone()).await?)?
        }
        EntityKind::Conversation => {
          let key: i64 = id
            .parse()
            .with_context(|| format!("conversation ids are integers, got {id:?}"))?;
          serde_json::to_value(store.conversation_stats(key).await?)?
        }
        other => bail!("no statistics are kept for {other}"),
      };
      if stats.is_null() {
        bail!("no {} with id {id}", kind.singular());
      }
      println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Command::Serve { host, port } => {
      let store = Arc::new(store);
      let retriever = Arc::new(Retriever::new(
        store.clone(),
        settings.search.index()?,
        settings.search.retrieval(),
      ));
      let app = axum::Router::new()
        .nest(API_PREFIX, api_router(ApiState { store, retriever }))
        .layer(TraceLayer::new_for_http());

      let address = format!(
        "{}:{}",
        host.unwrap_or(settings.server.host),
        port.unwrap_or(settings.server.port)
      );
      tracing::info!("Listening on http://{address}{API_PREFIX}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
    }
  }

  Ok(())
}

fn retriever(
  store: SqliteStore,
  settings: &Settings,
) -> Result<Retriever<SqliteStore, ElasticIndex>> {
  Ok(Retriever::new(
    Arc::new(store),
    settings.search.index()?,
    settings.search.retrieval(),
  ))
}

/// Run the duplicate repair; any rolled-back pair fails the command.
async fn merge(store: &SqliteStore, settings: &Settings) -> Result<()> {
  let report = repair(store, &settings.duplicates).await;
  tracing::info!(
    merged = report.merged.len(),
    failed = report.failed.len(),
    "duplicate repair complete"
  );
  if !report.is_clean() {
    let pairs: Vec<_> = report
      .failed
      .iter()
      .map(|(pair, _)| format!("{} -> {}", pair.duplicate, pair.canonical))
      .collect();
    bail!("duplicate repair rolled back {}", pairs.join(", "));
  }
  Ok(())
}
