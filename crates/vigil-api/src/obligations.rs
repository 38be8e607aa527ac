//! Handlers for `/obligations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/obligations` | All, creation order |
//! | `POST` | `/obligations` | Body: `{"creditor_name","amount_cents","currency"?,"description"?,"due_date"?}` |
//! | `POST` | `/obligations/{id}/settle` | Idempotent |

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
  obligation::{NewObligation, Obligation},
  store::{LegacyStore, ObligationStore},
};

use crate::{error::ApiError, user::CurrentUser};

/// `GET /obligations`
pub async fn list<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<Obligation>>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.list_obligations(&who.user_id).await?))
}

/// `POST /obligations`
pub async fn create<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Json(body): Json<NewObligation>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  let obligation = engine.add_obligation(&who.user_id, body).await?;
  Ok((StatusCode::CREATED, Json(obligation)))
}

/// `POST /obligations/{id}/settle`
pub async fn settle<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Obligation>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.settle_obligation(&who.user_id, id).await?))
}
