//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Clients only ever see two outcomes: not found, or a generic bad request.
//! The underlying cause is logged, not returned.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("encoding error: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("search error: {0}")]
  Search(#[from] dialogs_search::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      _ => StatusCode::BAD_REQUEST,
    };
    match &self {
      ApiError::NotFound(_) | ApiError::BadRequest(_) => {
        tracing::debug!(error = %self, "request rejected")
      }
      _ => tracing::error!(error = %self, "request failed"),
    }
    let message = status.canonical_reason().unwrap_or("error");
    (status, Json(json!({ "error": message }))).into_response()
  }
}
