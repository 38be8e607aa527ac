//! Handlers for `/recipients` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/recipients` | Creation order |
//! | `POST`   | `/recipients` | Body: `{"name","email","relationship_description"?}` |
//! | `GET`    | `/recipients/{id}` | 404 if not found |
//! | `PUT`    | `/recipients/{id}` | Partial update |
//! | `DELETE` | `/recipients/{id}` | Unassigns; items are kept |

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
  vault::{NewRecipient, Recipient, RecipientPatch},
};

use crate::{error::ApiError, user::CurrentUser};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /recipients`
pub async fn list<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<Recipient>>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.list_recipients(&who.user_id).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /recipients`
pub async fn create<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Json(body): Json<NewRecipient>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  let recipient = engine.create_recipient(&who.user_id, body).await?;
  Ok((StatusCode::CREATED, Json(recipient)))
}

// ─── Single recipient ────────────────────────────────────────────────────────

/// `GET /recipients/{id}`
pub async fn get_one<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Recipient>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.get_recipient(&who.user_id, id).await?))
}

/// `PUT /recipients/{id}`
pub async fn update<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<RecipientPatch>,
) -> Result<Json<Recipient>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.update_recipient(&who.user_id, id, patch).await?))
}

/// `DELETE /recipients/{id}`
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
  engine.delete_recipient(&who.user_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
