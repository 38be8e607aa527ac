//! The audit ledger: one release event per run, one notification row per
//! delivery attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserId;

/// `email_type` written on every notification produced by a release.
pub const LEGACY_RELEASE_EMAIL: &str = "legacy_release";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
  /// Open. Deliveries are still being attempted.
  InProgress,
  Success,
  /// Accepted by storage but never produced by the executor.
  Partial,
  Failed,
}

impl ReleaseStatus {
  /// Terminal status for a finished run: any delivery at all counts as success.
  pub fn rollup(recipients_notified: u32) -> Self {
    if recipients_notified > 0 { Self::Success } else { Self::Failed }
  }

  pub fn is_terminal(self) -> bool { self != Self::InProgress }
}

/// One audited release run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEvent {
  pub release_event_id:    Uuid,
  pub user_id:             UserId,
  pub triggered_at:        DateTime<Utc>,
  pub days_overdue:        i64,
  pub recipients_notified: u32,
  pub is_demo:             bool,
  pub status:              ReleaseStatus,
}

#[derive(Debug, Clone)]
pub struct NewReleaseEvent {
  pub user_id:      UserId,
  pub days_overdue: i64,
  pub is_demo:      bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
  Sent,
  Failed,
}

/// An append-only record of one delivery attempt.
///
/// `recipient_email` is captured at send time; the row does not follow later
/// edits to (or deletion of) the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLog {
  pub notification_id:  Uuid,
  pub release_event_id: Option<Uuid>,
  pub user_id:          UserId,
  pub recipient_id:     Uuid,
  pub email_type:       String,
  pub status:           NotificationStatus,
  pub recipient_email:  String,
  pub subject:          String,
  pub error_message:    Option<String>,
  pub is_demo:          bool,
  pub sent_at:          DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
  pub release_event_id: Option<Uuid>,
  pub user_id:          UserId,
  pub recipient_id:     Uuid,
  pub email_type:       String,
  pub status:           NotificationStatus,
  pub recipient_email:  String,
  pub subject:          String,
  pub error_message:    Option<String>,
  pub is_demo:          bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rollup_is_binary() {
    assert_eq!(ReleaseStatus::rollup(0), ReleaseStatus::Failed);
    assert_eq!(ReleaseStatus::rollup(1), ReleaseStatus::Success);
    assert_eq!(ReleaseStatus::rollup(40), ReleaseStatus::Success);
  }

  #[test]
  fn only_in_progress_is_open() {
    assert!(!ReleaseStatus::InProgress.is_terminal());
    assert!(ReleaseStatus::Partial.is_terminal());
    assert!(ReleaseStatus::Failed.is_terminal());
  }
}
