//! Handlers for `/checkin` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/checkin/status`  | Creates the record on first access |
//! | `POST` | `/checkin/confirm` | |
//! | `PUT`  | `/checkin/config`  | Body: `{"interval_days": 14}`, 1–730 |

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use vigil_core::{
  Engine, Error,
  checkin::CheckinStatus,
  mail::Mailer,
  store::{LegacyStore, ObligationStore},
};

use crate::{error::ApiError, user::CurrentUser};

/// `GET /checkin/status`
pub async fn status<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<CheckinStatus>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.get_checkin_status(&who.user_id).await?))
}

/// `POST /checkin/confirm`
pub async fn confirm<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<CheckinStatus>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.confirm_checkin(&who.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ConfigBody {
  pub interval_days: i64,
}

/// `PUT /checkin/config`
pub async fn configure<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Json(body): Json<ConfigBody>,
) -> Result<Json<CheckinStatus>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  let status = engine
    .set_checkin_interval(&who.user_id, body.interval_days)
    .await?;
  Ok(Json(status))
}
