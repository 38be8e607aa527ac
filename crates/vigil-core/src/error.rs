//! Error types for `vigil-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("recipient not found: {0}")]
  RecipientNotFound(Uuid),

  #[error("legacy item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("obligation not found: {0}")]
  ObligationNotFound(Uuid),

  #[error("release event not found: {0}")]
  ReleaseNotFound(Uuid),

  /// An assignment set named recipients that do not exist for this user.
  #[error("unknown recipient ids: {}", join_ids(.0))]
  UnknownRecipients(Vec<Uuid>),

  #[error(
    "check-in is not overdue ({} of {interval_days} days elapsed)",
    fmt_days(.days_since)
  )]
  NotOverdue {
    days_since:    Option<i64>,
    interval_days: u32,
  },

  #[error("no recipient has any assigned legacy item")]
  NothingToRelease,

  #[error("encryption failed: {0}")]
  Encryption(String),

  #[error("decryption failed: {0}")]
  Decryption(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Whether this is one of the "no such resource for this user" errors.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::RecipientNotFound(_)
        | Self::ItemNotFound(_)
        | Self::ObligationNotFound(_)
        | Self::ReleaseNotFound(_)
    )
  }

  /// Whether the caller supplied something the engine refuses to accept.
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation(_) | Self::UnknownRecipients(_))
  }
}

fn join_ids(ids: &[Uuid]) -> String {
  ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

fn fmt_days(days: &Option<i64>) -> String {
  days.map_or_else(|| "none".to_owned(), |d| d.to_string())
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
