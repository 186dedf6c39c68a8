//! Elasticsearch client for the per-kind corpus indices.
//!
//! Each entity kind lives in its own index named after its store table.
//! Request bodies and response parsing are plain functions so they can be
//! tested without a server.

use std::{path::Path, time::Duration};

use dialogs_core::{
  entity::EntityKind,
  search::{IndexDocument, SearchHits, SearchIndex},
};
use reqwest::{Client, Response, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, Result};

// ─── Client ──────────────────────────────────────────────────────────────────

/// An Elasticsearch cluster reached over HTTP.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ElasticIndex {
  client:          Client,
  base_url:        String,
  settings:        Value,
  request_timeout: Duration,
  ready_timeout:   Duration,
}

impl ElasticIndex {
  /// `request_timeout` bounds every call; `ready_timeout` is how long the
  /// cluster itself waits for the index to become usable.
  pub fn new(
    base_url: impl Into<String>,
    request_timeout: Duration,
    ready_timeout: Duration,
  ) -> Result<Self> {
    let client = Client::builder().timeout(request_timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      settings: default_settings(),
      request_timeout,
      ready_timeout,
    })
  }

  /// Replace the index creation body (settings and mappings).
  pub fn with_settings(mut self, settings: Value) -> Self {
    self.settings = settings;
    self
  }

  /// Read an index creation body from a JSON file.
  pub fn load_settings(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
      .map_err(|source| Error::Settings { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_str(&raw)?)
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.base_url.trim_end_matches('/'), path)
  }
}

/// Pass a successful response through; turn anything else into
/// [`Error::Status`] carrying the body.
async fn success(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { status: status.as_u16(), body })
}

// ─── SearchIndex impl ────────────────────────────────────────────────────────

impl SearchIndex for ElasticIndex {
  type Error = Error;

  async fn exists(&self, kind: EntityKind) -> Result<bool> {
    let resp = self.client.head(self.url(kind.table())).send().await?;
    match resp.status() {
      StatusCode::NOT_FOUND => Ok(false),
      _ => success(resp).await.map(|_| true),
    }
  }

  async fn create(&self, kind: EntityKind) -> Result<()> {
    let resp = self
      .client
      .put(self.url(kind.table()))
      .json(&self.settings)
      .send()
      .await?;
    match success(resp).await {
      Ok(_) => Ok(()),
      // Another caller won the race; the index is there either way.
      Err(Error::Status { status: 400, body }) if body.contains("resource_already_exists") => {
        Ok(())
      }
      Err(e) => Err(e),
    }
  }

  async fn delete(&self, kind: EntityKind) -> Result<()> {
    let resp = self.client.delete(self.url(kind.table())).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(());
    }
    success(resp).await?;
    Ok(())
  }

  async fn add_documents(&self, kind: EntityKind, docs: Vec<IndexDocument>) -> Result<()> {
    if docs.is_empty() {
      return Ok(());
    }
    let resp = self
      .client
      .post(self.url("_bulk"))
      .header(CONTENT_TYPE, "application/x-ndjson")
      .body(bulk_body(kind.table(), &docs))
      .send()
      .await?;
    let report: Value = success(resp).await?.json().await?;
    match bulk_failure(&report) {
      Some(reason) => Err(Error::Bulk(reason)),
      None => Ok(()),
    }
  }

  async fn wait_ready(&self, kind: EntityKind) -> Result<()> {
    let index = kind.table();
    success(
      self
        .client
        .post(self.url(&format!("{index}/_refresh")))
        .send()
        .await?,
    )
    .await?;

    let wait = format!("{}ms", self.ready_timeout.as_millis());
    let health: Value = success(
      self
        .client
        .get(self.url(&format!("_cluster/health/{index}")))
        .query(&[("wait_for_status", "yellow"), ("timeout", wait.as_str())])
        .timeout(self.ready_timeout + self.request_timeout)
        .send()
        .await?,
    )
    .await?
    .json()
    .await?;

    if health["timed_out"].as_bool() == Some(true) {
      return Err(Error::Timeout { op: "cluster health" });
    }
    Ok(())
  }

  async fn query<'a>(
    &'a self,
    kind: EntityKind,
    text: &'a str,
    start: usize,
    limit: usize,
  ) -> Result<SearchHits> {
    let resp = self
      .client
      .post(self.url(&format!("{}/_search", kind.table())))
      .json(&query_body(text, start, limit))
      .send()
      .await?;
    let body = success(resp).await?.bytes().await?;
    parse_hits(&body)
  }
}

// ─── Request bodies ──────────────────────────────────────────────────────────

/// Index creation body used when no settings file is configured: an
/// edge-ngram analyzer on every string field so partial words match.
pub fn default_settings() -> Value {
  json!({
    "settings": {
      "analysis": {
        "filter": {
          "prefixes": { "type": "edge_ngram", "min_gram": 1, "max_gram": 20 }
        },
        "analyzer": {
          "prefix_search": {
            "type":      "custom",
            "tokenizer": "standard",
            "filter":    ["lowercase", "prefixes"]
          }
        }
      }
    },
    "mappings": {
      "dynamic_templates": [{
        "strings": {
          "match_mapping_type": "string",
          "mapping": {
            "type":            "text",
            "analyzer":        "prefix_search",
            "search_analyzer": "standard"
          }
        }
      }]
    }
  })
}

/// Free-text query across every indexed field.
pub fn query_body(text: &str, start: usize, limit: usize) -> Value {
  json!({
    "query": { "multi_match": { "query": text, "fields": ["*"] } },
    "from":  start,
    "size":  limit,
  })
}

/// NDJSON for `_bulk`: an action line followed by the source line, per
/// document.
pub fn bulk_body(index: &str, docs: &[IndexDocument]) -> String {
  let mut out = String::new();
  for doc in docs {
    let action = json!({ "index": { "_index": index, "_id": doc.id } });
    out.push_str(&action.to_string());
    out.push('\n');
    out.push_str(&doc.body.to_string());
    out.push('\n');
  }
  out
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
  hits: HitsBlock,
}

#[derive(Deserialize)]
struct HitsBlock {
  total: Total,
  hits:  Vec<Hit>,
}

/// Older servers report a bare count, newer ones an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Total {
  Count(usize),
  Object { value: usize },
}

#[derive(Deserialize)]
struct Hit {
  #[serde(rename = "_id")]
  id: String,
}

/// Extract hit ids (in rank order) and the total from a `_search` response.
pub fn parse_hits(body: &[u8]) -> Result<SearchHits> {
  let SearchResponse { hits } = serde_json::from_slice(body)?;
  let total = match hits.total {
    Total::Count(n) | Total::Object { value: n } => n,
  };
  Ok(SearchHits { ids: hits.hits.into_iter().map(|h| h.id).collect(), total })
}

/// The first per-item failure reason of a `_bulk` response, if any item
/// failed.
fn bulk_failure(report: &Value) -> Option<String> {
  if report["errors"].as_bool() != Some(true) {
    return None;
  }
  let items = report["items"].as_array()?;
  let reason = items
    .iter()
    .filter_map(|item| item.as_object()?.values().next())
    .find_map(|result| result.get("error"))
    .map(|error| match error["reason"].as_str() {
      Some(reason) => reason.to_owned(),
      None => error.to_string(),
    });
  Some(reason.unwrap_or_else(|| "unknown failure".to_owned()))
}
