//! HTTP front end for vigil.
//!
//! Owns everything the engine deliberately leaves outside: configuration,
//! Basic authentication against configured accounts, the outbound mail
//! transports and the axum [`Router`] that mounts [`vigil_api`] under `/api`.

pub mod auth;
pub mod error;
pub mod mail;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use vigil_core::{
  Engine, EngineConfig,
  mail::Mailer,
  store::{LegacyStore, ObligationStore},
};

use auth::{AccountConfig, AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VIGIL_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Base64 encoding of the 32-byte vault key.
  pub encryption_key: String,
  #[serde(default)]
  pub accounts:       Vec<AccountConfig>,
  #[serde(default)]
  pub mail:           MailConfig,
  #[serde(default)]
  pub release:        ReleaseConfig,
}

impl ServerConfig {
  pub fn engine_config(&self) -> EngineConfig {
    EngineConfig {
      delivery_timeout: Duration::from_secs(self.release.delivery_timeout_secs),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailMode {
  /// Deliveries are written to the log and reported as sent.
  #[default]
  Log,
  /// Deliveries are POSTed to an HTTP mail relay.
  Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
  #[serde(default)]
  pub mode:         MailMode,
  #[serde(default)]
  pub webhook_url:  Option<String>,
  #[serde(default = "default_from_name")]
  pub from_name:    String,
  #[serde(default = "default_mail_timeout")]
  pub timeout_secs: u64,
}

impl Default for MailConfig {
  fn default() -> Self {
    Self {
      mode:         MailMode::default(),
      webhook_url:  None,
      from_name:    default_from_name(),
      timeout_secs: default_mail_timeout(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseConfig {
  /// Hard bound on one delivery, applied on top of the transport's own timeout.
  #[serde(default = "default_delivery_timeout")]
  pub delivery_timeout_secs: u64,
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self { delivery_timeout_secs: default_delivery_timeout() }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8420 }
fn default_from_name() -> String { "Vigil".to_owned() }
fn default_mail_timeout() -> u64 { 30 }
fn default_delivery_timeout() -> u64 { 45 }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server router: `GET /health` in the clear, the JSON API
/// under `/api` behind Basic authentication.
pub fn router<S, M>(engine: Arc<Engine<S, M>>, auth: Arc<AuthConfig>) -> Router
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  vigil_core::Error:
    From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  let api = vigil_api::api_router(engine)
    .layer(middleware::from_fn_with_state(auth, require_auth));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
