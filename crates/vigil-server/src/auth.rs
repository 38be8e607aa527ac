//! HTTP Basic authentication against the configured accounts.
//!
//! The Basic username is the account's `user_id`. A verified request carries
//! the account's [`UserIdentity`] in its extensions, where
//! [`vigil_api::CurrentUser`] picks it up.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use vigil_core::user::UserIdentity;

use crate::error::Error;

/// One login, as written in the `accounts` list of the configuration.
#[derive(Clone, Deserialize)]
pub struct AccountConfig {
  pub user_id:       String,
  pub email:         String,
  #[serde(default)]
  pub display_name:  Option<String>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl AccountConfig {
  fn identity(&self) -> UserIdentity {
    UserIdentity {
      display_name: self.display_name.clone(),
      ..UserIdentity::new(self.user_id.as_str(), self.email.as_str())
    }
  }
}

/// Credentials accepted as valid for this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  accounts: Vec<AccountConfig>,
}

impl AuthConfig {
  pub fn new(accounts: Vec<AccountConfig>) -> Self { Self { accounts } }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }
}

/// Verify credentials directly from headers and resolve the caller.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<UserIdentity, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = config
    .accounts
    .iter()
    .find(|a| a.user_id == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(account.identity())
}

/// Middleware: reject unauthenticated requests, attach the identity otherwise.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let identity = verify_auth(req.headers(), &auth)?;
  req.extensions_mut().insert(identity);
  Ok(next.run(req).await)
}
