//! The outbound delivery collaborator and the message it is handed.

use std::future::Future;

use serde::Serialize;

use crate::{obligation::Obligation, vault::DecryptedItem};

/// Everything a transport needs to deliver one recipient's share of a release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseMessage {
  pub recipient_email:     String,
  pub recipient_name:      String,
  pub sender_display_name: String,
  pub days_overdue:        i64,
  pub items:               Vec<DecryptedItem>,
  /// `None` when the sender has nothing outstanding.
  pub obligations:         Option<Vec<Obligation>>,
}

impl ReleaseMessage {
  pub fn subject(&self) -> String {
    format!("A message from {}", self.sender_display_name)
  }
}

/// Delivers release messages.
///
/// `Ok(false)` reports an ordinary delivery failure (relay down, rejected
/// address). `Err` is reserved for faults in the mailer itself. Either way the
/// executor records a failed notification and moves on.
pub trait Mailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    message: &'a ReleaseMessage,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
