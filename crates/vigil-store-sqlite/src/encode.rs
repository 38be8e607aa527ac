//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that textual order is chronological order. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use uuid::Uuid;
use vigil_core::{
  checkin::Checkin,
  ledger::{NotificationLog, NotificationStatus, ReleaseEvent, ReleaseStatus},
  obligation::{Obligation, ObligationStatus},
  user::UserId,
  vault::{Ciphertext, LegacyItem, Recipient},
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Status enums ────────────────────────────────────────────────────────────

pub fn encode_release_status(s: ReleaseStatus) -> &'static str {
  match s {
    ReleaseStatus::InProgress => "in_progress",
    ReleaseStatus::Success => "success",
    ReleaseStatus::Partial => "partial",
    ReleaseStatus::Failed => "failed",
  }
}

pub fn decode_release_status(s: &str) -> Result<ReleaseStatus> {
  match s {
    "in_progress" => Ok(ReleaseStatus::InProgress),
    "success" => Ok(ReleaseStatus::Success),
    "partial" => Ok(ReleaseStatus::Partial),
    "failed" => Ok(ReleaseStatus::Failed),
    other => Err(unknown("release_events.status", other)),
  }
}

pub fn encode_notification_status(s: NotificationStatus) -> &'static str {
  match s {
    NotificationStatus::Sent => "sent",
    NotificationStatus::Failed => "failed",
  }
}

pub fn decode_notification_status(s: &str) -> Result<NotificationStatus> {
  match s {
    "sent" => Ok(NotificationStatus::Sent),
    "failed" => Ok(NotificationStatus::Failed),
    other => Err(unknown("notification_logs.status", other)),
  }
}

pub fn decode_obligation_status(s: &str) -> Result<ObligationStatus> {
  match s {
    "outstanding" => Ok(ObligationStatus::Outstanding),
    "settled" => Ok(ObligationStatus::Settled),
    other => Err(unknown("obligations.status", other)),
  }
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownVariant { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `checkins` row.
pub struct RawCheckin {
  pub user_id:         String,
  pub last_checkin_at: Option<String>,
  pub interval_days:   u32,
  pub created_at:      String,
}

impl RawCheckin {
  pub const COLUMNS: &'static str = "user_id, last_checkin_at, interval_days, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(0)?,
      last_checkin_at: row.get(1)?,
      interval_days:   row.get(2)?,
      created_at:      row.get(3)?,
    })
  }

  pub fn into_checkin(self) -> Result<Checkin> {
    Ok(Checkin {
      user_id:         UserId::new(self.user_id),
      last_checkin_at: self.last_checkin_at.as_deref().map(decode_dt).transpose()?,
      interval_days:   self.interval_days,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `recipients` row.
pub struct RawRecipient {
  pub recipient_id:             String,
  pub user_id:                  String,
  pub name:                     String,
  pub email:                    String,
  pub relationship_description: Option<String>,
  pub created_at:               String,
  pub updated_at:               String,
}

impl RawRecipient {
  pub const COLUMNS: &'static str = "recipient_id, user_id, name, email, \
                                     relationship_description, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      recipient_id:             row.get(0)?,
      user_id:                  row.get(1)?,
      name:                     row.get(2)?,
      email:                    row.get(3)?,
      relationship_description: row.get(4)?,
      created_at:               row.get(5)?,
      updated_at:               row.get(6)?,
    })
  }

  pub fn into_recipient(self) -> Result<Recipient> {
    Ok(Recipient {
      recipient_id:             decode_uuid(&self.recipient_id)?,
      user_id:                  UserId::new(self.user_id),
      name:                     self.name,
      email:                    self.email,
      relationship_description: self.relationship_description,
      created_at:               decode_dt(&self.created_at)?,
      updated_at:               decode_dt(&self.updated_at)?,
    })
  }
}

/// A `legacy_items` row plus the ids of its assigned recipients.
pub struct RawItem {
  pub item_id:       String,
  pub user_id:       String,
  pub title:         String,
  pub ciphertext:    String,
  pub created_at:    String,
  pub updated_at:    String,
  pub recipient_ids: Vec<String>,
}

impl RawItem {
  pub const COLUMNS: &'static str = "item_id, user_id, title, ciphertext, created_at, updated_at";

  /// Reads the item columns; `recipient_ids` is filled in separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:       row.get(0)?,
      user_id:       row.get(1)?,
      title:         row.get(2)?,
      ciphertext:    row.get(3)?,
      created_at:    row.get(4)?,
      updated_at:    row.get(5)?,
      recipient_ids: Vec::new(),
    })
  }

  pub fn into_item(self) -> Result<LegacyItem> {
    Ok(LegacyItem {
      item_id:       decode_uuid(&self.item_id)?,
      user_id:       UserId::new(self.user_id),
      title:         self.title,
      ciphertext:    Ciphertext::new(self.ciphertext),
      recipient_ids: self
        .recipient_ids
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `release_events` row.
pub struct RawReleaseEvent {
  pub release_event_id:    String,
  pub user_id:             String,
  pub triggered_at:        String,
  pub days_overdue:        i64,
  pub recipients_notified: u32,
  pub is_demo:             bool,
  pub status:              String,
}

impl RawReleaseEvent {
  pub const COLUMNS: &'static str = "release_event_id, user_id, triggered_at, days_overdue, \
                                     recipients_notified, is_demo, status";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      release_event_id:    row.get(0)?,
      user_id:             row.get(1)?,
      triggered_at:        row.get(2)?,
      days_overdue:        row.get(3)?,
      recipients_notified: row.get(4)?,
      is_demo:             row.get(5)?,
      status:              row.get(6)?,
    })
  }

  pub fn into_event(self) -> Result<ReleaseEvent> {
    Ok(ReleaseEvent {
      release_event_id:    decode_uuid(&self.release_event_id)?,
      user_id:             UserId::new(self.user_id),
      triggered_at:        decode_dt(&self.triggered_at)?,
      days_overdue:        self.days_overdue,
      recipients_notified: self.recipients_notified,
      is_demo:             self.is_demo,
      status:              decode_release_status(&self.status)?,
    })
  }
}

/// Raw strings read directly from a `notification_logs` row.
pub struct RawNotification {
  pub notification_id:  String,
  pub release_event_id: Option<String>,
  pub user_id:          String,
  pub recipient_id:     String,
  pub email_type:       String,
  pub status:           String,
  pub recipient_email:  String,
  pub subject:          String,
  pub error_message:    Option<String>,
  pub is_demo:          bool,
  pub sent_at:          String,
}

impl RawNotification {
  pub const COLUMNS: &'static str = "notification_id, release_event_id, user_id, recipient_id, \
                                     email_type, status, recipient_email, subject, \
                                     error_message, is_demo, sent_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id:  row.get(0)?,
      release_event_id: row.get(1)?,
      user_id:          row.get(2)?,
      recipient_id:     row.get(3)?,
      email_type:       row.get(4)?,
      status:           row.get(5)?,
      recipient_email:  row.get(6)?,
      subject:          row.get(7)?,
      error_message:    row.get(8)?,
      is_demo:          row.get(9)?,
      sent_at:          row.get(10)?,
    })
  }

  pub fn into_notification(self) -> Result<NotificationLog> {
    Ok(NotificationLog {
      notification_id:  decode_uuid(&self.notification_id)?,
      release_event_id: self.release_event_id.as_deref().map(decode_uuid).transpose()?,
      user_id:          UserId::new(self.user_id),
      recipient_id:     decode_uuid(&self.recipient_id)?,
      email_type:       self.email_type,
      status:           decode_notification_status(&self.status)?,
      recipient_email:  self.recipient_email,
      subject:          self.subject,
      error_message:    self.error_message,
      is_demo:          self.is_demo,
      sent_at:          decode_dt(&self.sent_at)?,
    })
  }
}

/// Raw strings read directly from an `obligations` row.
pub struct RawObligation {
  pub obligation_id: String,
  pub user_id:       String,
  pub creditor_name: String,
  pub amount_cents:  i64,
  pub currency:      String,
  pub description:   Option<String>,
  pub due_date:      Option<String>,
  pub status:        String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawObligation {
  pub const COLUMNS: &'static str = "obligation_id, user_id, creditor_name, amount_cents, \
                                     currency, description, due_date, status, created_at, \
                                     updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      obligation_id: row.get(0)?,
      user_id:       row.get(1)?,
      creditor_name: row.get(2)?,
      amount_cents:  row.get(3)?,
      currency:      row.get(4)?,
      description:   row.get(5)?,
      due_date:      row.get(6)?,
      status:        row.get(7)?,
      created_at:    row.get(8)?,
      updated_at:    row.get(9)?,
    })
  }

  pub fn into_obligation(self) -> Result<Obligation> {
    Ok(Obligation {
      obligation_id: decode_uuid(&self.obligation_id)?,
      user_id:       UserId::new(self.user_id),
      creditor_name: self.creditor_name,
      amount_cents:  self.amount_cents,
      currency:      self.currency,
      description:   self.description,
      due_date:      self.due_date.as_deref().map(decode_date).transpose()?,
      status:        decode_obligation_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}
