//! JSON REST API for vigil.
//!
//! Exposes an axum [`Router`] over a [`vigil_core::Engine`]. Every route acts
//! on behalf of the [`UserIdentity`](vigil_core::user::UserIdentity) found in
//! request extensions; authentication, TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vigil_api::api_router(engine.clone()))
//! ```

pub mod checkin;
pub mod error;
pub mod items;
pub mod obligations;
pub mod recipients;
pub mod release;
pub mod user;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use vigil_core::{
  Engine, Error,
  mail::Mailer,
  store::{LegacyStore, ObligationStore},
};

pub use error::ApiError;
pub use user::CurrentUser;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(engine: Arc<Engine<S, M>>) -> Router<()>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer + 'static,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  Router::new()
    // Check-ins
    .route("/checkin/status", get(checkin::status::<S, M>))
    .route("/checkin/confirm", post(checkin::confirm::<S, M>))
    .route("/checkin/config", put(checkin::configure::<S, M>))
    // Recipients
    .route(
      "/recipients",
      get(recipients::list::<S, M>).post(recipients::create::<S, M>),
    )
    .route(
      "/recipients/{id}",
      get(recipients::get_one::<S, M>)
        .put(recipients::update::<S, M>)
        .delete(recipients::delete::<S, M>),
    )
    // Items
    .route("/items", get(items::list::<S, M>).post(items::create::<S, M>))
    .route(
      "/items/{id}",
      get(items::get_one::<S, M>)
        .put(items::update::<S, M>)
        .delete(items::delete::<S, M>),
    )
    // Release
    .route("/release", post(release::trigger::<S, M>))
    .route("/release/plan", post(release::plan::<S, M>))
    .route("/release/events", get(release::events::<S, M>))
    .route(
      "/release/events/{id}/notifications",
      get(release::event_notifications::<S, M>),
    )
    .route("/notifications", get(release::notifications::<S, M>))
    // Obligations
    .route(
      "/obligations",
      get(obligations::list::<S, M>).post(obligations::create::<S, M>),
    )
    .route("/obligations/{id}/settle", post(obligations::settle::<S, M>))
    .with_state(engine)
}
