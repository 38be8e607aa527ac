//! The `LegacyStore` and `ObligationStore` traits.
//!
//! Implemented by storage backends (e.g. `vigil-store-sqlite`). The engine and
//! the HTTP layer depend on these abstractions, not on any concrete backend.
//!
//! Every method is scoped by the owning [`UserId`]. A row that belongs to a
//! different user is indistinguishable from a row that does not exist.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  checkin::Checkin,
  ledger::{
    NewNotification, NewReleaseEvent, NotificationLog, ReleaseEvent,
    ReleaseStatus,
  },
  obligation::{NewObligation, Obligation},
  user::UserId,
  vault::{ItemRecordPatch, LegacyItem, NewItemRecord, NewRecipient, Recipient},
};

/// A recipient together with the items assigned to them.
pub type Assignment = (Recipient, Vec<LegacyItem>);

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the vault, check-in and ledger storage.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LegacyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Check-ins ─────────────────────────────────────────────────────────

  /// Return the user's check-in row, creating it with no check-in and the
  /// default interval on first access.
  fn get_or_create_checkin(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Checkin, Self::Error>> + Send + '_;

  /// Set `last_checkin_at` to the later of its current value and `at`.
  fn record_checkin(
    &self,
    user: UserId,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Checkin, Self::Error>> + Send + '_;

  /// Store an already-validated interval.
  fn set_checkin_interval(
    &self,
    user: UserId,
    interval_days: u32,
  ) -> impl Future<Output = Result<Checkin, Self::Error>> + Send + '_;

  // ── Recipients ────────────────────────────────────────────────────────

  fn add_recipient(
    &self,
    user: UserId,
    input: NewRecipient,
  ) -> impl Future<Output = Result<Recipient, Self::Error>> + Send + '_;

  fn get_recipient(
    &self,
    user: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Recipient>, Self::Error>> + Send + '_;

  /// All of the user's recipients in creation order, ties broken by id.
  fn list_recipients(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<Recipient>, Self::Error>> + Send + '_;

  /// Replace every mutable field. Returns `None` if the recipient is unknown.
  fn update_recipient(
    &self,
    user: UserId,
    id: Uuid,
    input: NewRecipient,
  ) -> impl Future<Output = Result<Option<Recipient>, Self::Error>> + Send + '_;

  /// Delete the recipient and its assignment links. Items are untouched.
  fn delete_recipient(
    &self,
    user: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Persist an item and its assignments atomically.
  ///
  /// Fails with `UnknownRecipients` and writes nothing if any recipient id is
  /// not owned by `user`.
  fn add_item(
    &self,
    user: UserId,
    input: NewItemRecord,
  ) -> impl Future<Output = Result<LegacyItem, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    user: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<LegacyItem>, Self::Error>> + Send + '_;

  /// All of the user's items in creation order.
  fn list_items(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<LegacyItem>, Self::Error>> + Send + '_;

  /// Apply a patch atomically. `recipient_ids: Some(..)` replaces the whole
  /// assignment set under the same ownership rule as [`Self::add_item`].
  fn update_item(
    &self,
    user: UserId,
    id: Uuid,
    patch: ItemRecordPatch,
  ) -> impl Future<Output = Result<Option<LegacyItem>, Self::Error>> + Send + '_;

  /// Delete the item and its assignment links. Recipients are untouched.
  fn delete_item(
    &self,
    user: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every recipient (creation order, then id) with their assigned items
  /// (creation order), read in one consistent snapshot. Recipients with no
  /// items are included with an empty list.
  fn assignment_graph(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Insert a release event in the `in_progress` state with nobody notified.
  fn open_release_event(
    &self,
    input: NewReleaseEvent,
  ) -> impl Future<Output = Result<ReleaseEvent, Self::Error>> + Send + '_;

  /// Append one notification row. Rows are never updated or deleted.
  fn append_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<NotificationLog, Self::Error>> + Send + '_;

  /// Write the rollup of an open event. Returns `None` if the event is unknown
  /// or already closed, so the rollup is written at most once.
  fn close_release_event(
    &self,
    id: Uuid,
    recipients_notified: u32,
    status: ReleaseStatus,
  ) -> impl Future<Output = Result<Option<ReleaseEvent>, Self::Error>> + Send + '_;

  fn get_release_event(
    &self,
    user: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ReleaseEvent>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_release_events(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<ReleaseEvent>, Self::Error>> + Send + '_;

  /// Rows of one run in write order.
  fn list_event_notifications(
    &self,
    user: UserId,
    release_event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<NotificationLog>, Self::Error>> + Send + '_;

  /// Every notification row for the user, newest first.
  fn list_notifications(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<NotificationLog>, Self::Error>> + Send + '_;
}

/// The obligation collaborator.
pub trait ObligationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Outstanding obligations, earliest due date first (undated last).
  fn list_outstanding(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<Obligation>, Self::Error>> + Send + '_;

  fn add_obligation(
    &self,
    user: UserId,
    input: NewObligation,
  ) -> impl Future<Output = Result<Obligation, Self::Error>> + Send + '_;

  /// Every obligation regardless of status, in creation order.
  fn list_obligations(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Vec<Obligation>, Self::Error>> + Send + '_;

  /// Mark an obligation settled. Returns `None` if it is unknown.
  fn settle_obligation(
    &self,
    user: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Obligation>, Self::Error>> + Send + '_;
}
