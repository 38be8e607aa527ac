//! Handlers for release runs and the audit ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/release/plan` | Preview: decrypted plan, nothing sent or recorded |
//! | `POST` | `/release` | Body (optional): `{"is_demo": false}`; demo by default |
//! | `GET`  | `/release/events` | Newest first |
//! | `GET`  | `/release/events/{id}/notifications` | Write order |
//! | `GET`  | `/notifications` | Newest first |

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
};
use serde::Deserialize;
use uuid::Uuid;
use vigil_core::{
  Engine, Error,
  ledger::{NotificationLog, ReleaseEvent},
  mail::Mailer,
  plan::ReleasePlan,
  release::ReleaseSummary,
  store::{LegacyStore, ObligationStore},
};

use crate::{error::ApiError, user::CurrentUser};

// ─── Runs ────────────────────────────────────────────────────────────────────

/// `POST /release/plan`
pub async fn plan<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<ReleasePlan>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.compute_release_plan(&who.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct TriggerBody {
  #[serde(default = "demo_by_default")]
  pub is_demo: bool,
}

fn demo_by_default() -> bool { true }

impl Default for TriggerBody {
  fn default() -> Self { Self { is_demo: demo_by_default() } }
}

/// Empty bodies are accepted and mean a demo run.
fn parse_trigger(body: &[u8]) -> Result<TriggerBody, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(TriggerBody::default());
  }
  serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// `POST /release`
pub async fn trigger<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  body: Bytes,
) -> Result<Json<ReleaseSummary>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  let TriggerBody { is_demo } = parse_trigger(&body)?;
  Ok(Json(engine.release(&who, is_demo).await?))
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// `GET /release/events`
pub async fn events<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<ReleaseEvent>>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.release_history(&who.user_id).await?))
}

/// `GET /release/events/{id}/notifications`
pub async fn event_notifications<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<NotificationLog>>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.event_notifications(&who.user_id, id).await?))
}

/// `GET /notifications`
pub async fn notifications<S, M>(
  State(engine): State<Arc<Engine<S, M>>>,
  CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<NotificationLog>>, ApiError>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Ok(Json(engine.notifications(&who.user_id).await?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trigger_body_defaults_to_demo() {
    assert!(parse_trigger(b"").unwrap().is_demo);
    assert!(parse_trigger(b"  \n").unwrap().is_demo);
    assert!(parse_trigger(b"{}").unwrap().is_demo);
    assert!(!parse_trigger(br#"{"is_demo": false}"#).unwrap().is_demo);
    assert!(matches!(parse_trigger(b"{nope"), Err(ApiError::BadRequest(_))));
  }
}
