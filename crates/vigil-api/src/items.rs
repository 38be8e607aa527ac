//! Handlers for `/items` endpoints.
//!
//! Responses never include content, only the title and the assigned
//! recipient ids.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/items` | Creation order |
//! | `POST`   | `/items` | Body: `{"title","content","recipient_ids":[..]}` |
//! | `GET`    | `/items/{id}` | 404 if not found |
//! | `PUT`    | `/items/{id}` | Omit `recipient_ids` to keep assignments |
//! | `DELETE` | `/items/{id}` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;
use vigil_core::{
  Engine, Error,
  mail::Mailer,
  store::{LegacyStore, ObligationStore},
  vault::{ItemDraft, ItemPatch, LegacyItem},
};

use crate::{error::ApiError, user::CurrentUser};

/// `GET /items`
pub async fn list<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<LegacyItem>>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.list_items(&who.user_id).await?))
}

/// `POST /items`
pub async fn create<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Json(draft): Json<ItemDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  let item = engine.create_item(&who.user_id, draft).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /items/{id}`
pub async fn get_one<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<LegacyItem>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.get_item(&who.user_id, id).await?))
}

/// `PUT /items/{id}`
pub async fn update<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<ItemPatch>,
) -> Result<Json<LegacyItem>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.update_item(&who.user_id, id, patch).await?))
}

/// `DELETE /items/{id}`
pub async fn delete<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  engine.delete_item(&who.user_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
