//! Core types and trait definitions for the vigil legacy release engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends, the cipher and the mail transport plug in through the traits in
//! [`store`], [`cipher`] and [`mail`]; the release logic in [`plan`] and
//! [`release`] only ever talks to those traits.

// Backends implement the store traits with native `async fn`.
#![allow(async_fn_in_trait)]

pub mod checkin;
pub mod cipher;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod mail;
pub mod obligation;
pub mod plan;
pub mod release;
pub mod store;
pub mod user;
pub mod vault;

pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};
