//! Handler for `GET /{kind}`, plus the page envelope shared with search.

use axum::{
  Json,
  extract::{OriginalUri, Path, Query, State, rejection::QueryRejection},
};
use dialogs_core::{
  entity::Entity,
  page::{Page, PageRequest, Pagination},
  search::SearchIndex,
  store::CorpusStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, parse_kind, store_error};

// ─── Envelope ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
  pub start: Option<usize>,
  pub limit: Option<usize>,
}

impl PageParams {
  pub fn request(&self) -> Result<PageRequest, ApiError> {
    PageRequest::new(
      self.start.unwrap_or(0),
      self.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))
  }
}

/// Links to the neighbouring pages, present only where such a page exists.
#[derive(Debug, Serialize)]
pub struct Links {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub prev: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageBody {
  pub results: Vec<Entity>,
  pub links:   Links,
  pub meta:    Pagination,
}

impl PageBody {
  /// `path` is the request path; `extra` is prepended to the paging query
  /// (e.g. `q=...&`).
  pub fn new(page: Page<Entity>, path: &str, extra: &str) -> Self {
    let Page { results, meta } = page;
    let link = |start: usize| format!("{path}?{extra}start={start}&limit={}", meta.limit);
    Self {
      results,
      links: Links { next: meta.next.map(link), prev: meta.prev.map(link) },
      meta,
    }
  }
}

pub(crate) fn params(
  query: Result<Query<PageParams>, QueryRejection>,
) -> Result<PageParams, ApiError> {
  query
    .map(|Query(p)| p)
    .map_err(|e| ApiError::BadRequest(e.body_text()))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /{kind}[?start=<n>][&limit=<n>]`
pub async fn handler<S, I>(
  State(state): State<ApiState<S, I>>,
  Path(kind): Path<String>,
  OriginalUri(uri): OriginalUri,
  query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<PageBody>, ApiError>
where
  S: CorpusStore,
  I: SearchIndex,
{
  let kind = parse_kind(&kind)?;
  let request = params(query)?.request()?;

  let total = state.store.count(kind).await.map_err(store_error)?;
  let meta = Pagination::checked(request, total)
    .map_err(|e| ApiError::NotFound(e.to_string()))?;
  let results = state
    .store
    .list(kind, request)
    .await
    .map_err(store_error)?;

  Ok(Json(PageBody::new(Page { results, meta }, uri.path(), "")))
}
