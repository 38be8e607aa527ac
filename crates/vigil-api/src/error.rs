//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vigil_core::Error as CoreError;

/// An error returned by an API handler.
///
/// Responses carry `{"error": <message>, "code": <machine code>}`. Internal
/// faults are logged and answered with a fixed message.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] CoreError),
}

impl ApiError {
  fn parts(&self) -> (StatusCode, &'static str, String) {
    match self {
      ApiError::Unauthenticated => {
        (StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Engine(e) if e.is_validation() => {
        (StatusCode::BAD_REQUEST, "validation", e.to_string())
      }
      ApiError::Engine(e) if e.is_not_found() => {
        (StatusCode::NOT_FOUND, "not_found", e.to_string())
      }
      ApiError::Engine(e @ CoreError::NotOverdue { .. }) => {
        (StatusCode::FORBIDDEN, "not_overdue", e.to_string())
      }
      ApiError::Engine(e @ CoreError::NothingToRelease) => {
        (StatusCode::CONFLICT, "nothing_to_release", e.to_string())
      }
      ApiError::Engine(e) => {
        tracing::error!(error = %e, "unhandled engine error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "internal",
          "internal server error".to_owned(),
        )
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code, message) = self.parts();
    (status, Json(json!({ "error": message, "code": code }))).into_response()
  }
}
