//! Layered runtime configuration.
//!
//! An optional TOML file is read first; `DIALOGS_`-prefixed environment
//! variables override it, with `__` separating nested keys
//! (`DIALOGS_SEARCH__ENABLED=true`). Every key has a default.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use dialogs_core::duplicate::{DuplicatePair, known_duplicates};
use dialogs_search::{ElasticIndex, RetrievalConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path: PathBuf,
  pub corpus_dir: PathBuf,
  pub server:     ServerSettings,
  pub search:     SearchSettings,
  /// Remap table for the duplicate merge.
  pub duplicates: Vec<DuplicatePair>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("movie_dialogs.sqlite"),
      corpus_dir: PathBuf::from("corpus"),
      server:     ServerSettings::default(),
      search:     SearchSettings::default(),
      duplicates: known_duplicates(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  pub host: String,
  pub port: u16,
}

impl Default for ServerSettings {
  fn default() -> Self { Self { host: "127.0.0.1".into(), port: 5000 } }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
  pub enabled:            bool,
  pub url:                String,
  pub request_timeout_ms: u64,
  pub ready_timeout_ms:   u64,
  pub bulk_batch_size:    usize,
  /// JSON file with the index creation body; a built-in prefix analyzer is
  /// used when unset.
  pub settings_path:      Option<PathBuf>,
}

impl Default for SearchSettings {
  fn default() -> Self {
    Self {
      enabled:            false,
      url:                "http://localhost:9200".into(),
      request_timeout_ms: 5_000,
      ready_timeout_ms:   30_000,
      bulk_batch_size:    500,
      settings_path:      None,
    }
  }
}

impl SearchSettings {
  pub fn retrieval(&self) -> RetrievalConfig {
    RetrievalConfig {
      request_timeout: Duration::from_millis(self.request_timeout_ms),
      ready_timeout:   Duration::from_millis(self.ready_timeout_ms),
      bulk_batch_size: self.bulk_batch_size,
    }
  }

  /// The configured index client, or `None` when search is disabled.
  pub fn index(&self) -> Result<Option<Arc<ElasticIndex>>> {
    if !self.enabled {
      return Ok(None);
    }
    let retrieval = self.retrieval();
    let mut index =
      ElasticIndex::new(&self.url, retrieval.request_timeout, retrieval.ready_timeout)
        .context("failed to build search client")?;
    if let Some(path) = &self.settings_path {
      index = index.with_settings(ElasticIndex::load_settings(path)?);
    }
    Ok(Some(Arc::new(index)))
  }
}

impl Settings {
  /// Load from `path` (if it exists) and the environment.
  pub fn load(path: &std::path::Path) -> Result<Self> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
          Environment::with_prefix("DIALOGS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
        ),
    )
    .with_context(|| format!("failed to load configuration from {}", path.display()))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
    Ok(builder.build()?.try_deserialize()?)
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn from_toml(toml: &str) -> Settings {
    Settings::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
      .unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let s = from_toml("");
    assert_eq!(s.store_path, PathBuf::from("movie_dialogs.sqlite"));
    assert_eq!(s.server.port, 5000);
    assert!(!s.search.enabled);
    assert_eq!(s.duplicates, known_duplicates());
    assert!(s.search.index().unwrap().is_none());
  }

  #[test]
  fn nested_keys_override_defaults() {
    let s = from_toml(
      r#"
        store_path = "/tmp/dialogs.sqlite"

        [search]
        enabled = true
        request_timeout_ms = 250

        [[duplicates]]
        duplicate = "u2"
        canonical = "u1"
      "#,
    );
    assert_eq!(s.store_path, PathBuf::from("/tmp/dialogs.sqlite"));
    assert!(s.search.enabled);
    assert_eq!(s.search.url, "http://localhost:9200");
    assert_eq!(s.search.retrieval().request_timeout, Duration::from_millis(250));
    assert_eq!(s.search.retrieval().bulk_batch_size, 500);
    assert_eq!(s.duplicates, vec![DuplicatePair::new("u2", "u1")]);
  }
}
