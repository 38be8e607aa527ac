//! The [`CurrentUser`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use vigil_core::user::UserIdentity;

use crate::error::ApiError;

/// The authenticated caller, placed in request extensions by whatever
/// authentication layer wraps the API router.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<UserIdentity>()
      .cloned()
      .map(CurrentUser)
      .ok_or(ApiError::Unauthenticated)
  }
}
