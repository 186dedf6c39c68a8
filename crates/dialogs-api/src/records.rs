//! Handler for `GET /{kind}/{id}`.
//!
//! Responds with `{"<kind>": record}`, where movies, genres, characters and
//! conversations carry the ids of their related rows.

use axum::{
  Json,
  extract::{Path, State},
};
use dialogs_core::{entity::EntityKind, search::SearchIndex, store::CorpusStore};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{ApiState, error::ApiError, parse_kind, store_error};

/// `GET /{kind}/{id}`
pub async fn get_one<S, I>(
  State(state): State<ApiState<S, I>>,
  Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: CorpusStore,
  I: SearchIndex,
{
  let kind = parse_kind(&kind)?;
  let store = &state.store;
  let missing = || ApiError::NotFound(format!("no {} with id {id}", kind.singular()));

  let found = match kind {
    EntityKind::Movie => envelope(kind, store.get_movie(id.clone()).await.map_err(store_error)?),
    EntityKind::Character => {
      envelope(kind, store.get_character(id.clone()).await.map_err(store_error)?)
    }
    EntityKind::Line => envelope(kind, store.get_line(id.clone()).await.map_err(store_error)?),
    EntityKind::Genre => {
      let key = id.parse().map_err(|_| missing())?;
      envelope(kind, store.get_genre(key).await.map_err(store_error)?)
    }
    EntityKind::Conversation => {
      let key = id.parse().map_err(|_| missing())?;
      envelope(kind, store.get_conversation(key).await.map_err(store_error)?)
    }
  };
  found?.ok_or_else(missing)
}

/// Wrap a found record as `{"<kind>": record}`; `None` passes through.
fn envelope<T: Serialize>(
  kind: EntityKind,
  record: Option<T>,
) -> Result<Option<Json<Value>>, ApiError> {
  let Some(record) = record else { return Ok(None) };
  let mut body = Map::new();
  body.insert(kind.singular().to_owned(), serde_json::to_value(record)?);
  Ok(Some(Json(Value::Object(body))))
}
