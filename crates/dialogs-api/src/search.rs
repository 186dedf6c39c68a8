//! Handler for `GET /{kind}/search`.

use axum::{
  Json,
  extract::{OriginalUri, Path, Query, State, rejection::QueryRejection},
};
use dialogs_core::{search::SearchIndex, store::CorpusStore};
use serde::Deserialize;

use crate::{
  ApiState,
  error::ApiError,
  listing::{PageBody, PageParams},
  parse_kind,
};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub q:     Option<String>,
  pub start: Option<usize>,
  pub limit: Option<usize>,
}

/// `GET /{kind}/search?q=<text>[&start=<n>][&limit=<n>]`
pub async fn handler<S, I>(
  State(state): State<ApiState<S, I>>,
  Path(kind): Path<String>,
  OriginalUri(uri): OriginalUri,
  query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<PageBody>, ApiError>
where
  S: CorpusStore,
  I: SearchIndex,
{
  let kind = parse_kind(&kind)?;
  let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let text = match params.q.as_deref().map(str::trim) {
    Some(q) if !q.is_empty() => q.to_owned(),
    _ => return Err(ApiError::BadRequest("missing query parameter q".into())),
  };
  let request = PageParams { start: params.start, limit: params.limit }.request()?;

  let page = state.retriever.search(kind, &text, request).await?;
  let extra = format!("q={}&", urlencoding::encode(&text));
  Ok(Json(PageBody::new(page, uri.path(), &extra)))
}
