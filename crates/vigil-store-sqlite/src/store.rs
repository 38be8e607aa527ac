//! [`SqliteStore`]: the SQLite implementation of [`LegacyStore`] and
//! [`ObligationStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::debug;
use uuid::Uuid;

use vigil_core::{
  checkin::{Checkin, DEFAULT_INTERVAL_DAYS},
  ledger::{
    NewNotification, NewReleaseEvent, NotificationLog, ReleaseEvent,
    ReleaseStatus,
  },
  obligation::{NewObligation, Obligation, ObligationStatus},
  store::{Assignment, LegacyStore, ObligationStore},
  user::UserId,
  vault::{ItemRecordPatch, LegacyItem, NewItemRecord, NewRecipient, Recipient},
};

use crate::{
  Error, Result,
  encode::{
    RawCheckin, RawItem, RawNotification, RawObligation, RawRecipient,
    RawReleaseEvent, encode_date, encode_dt, encode_notification_status,
    encode_release_status, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A vigil store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str) -> i64 {
    self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await
      .expect("count rows")
  }

  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

// ─── Synchronous helpers (run inside `Connection::call`) ─────────────────────

fn select_checkin(conn: &Connection, user: &str) -> rusqlite::Result<RawCheckin> {
  conn.query_row(
    &format!("SELECT {} FROM checkins WHERE user_id = ?1", RawCheckin::COLUMNS),
    params![user],
    RawCheckin::from_row,
  )
}

/// Insert the default check-in row if missing. Returns whether it was created.
fn ensure_checkin(conn: &Connection, user: &str, at: &str) -> rusqlite::Result<bool> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO checkins (user_id, last_checkin_at, interval_days, created_at)
     VALUES (?1, NULL, ?2, ?3)",
    params![user, DEFAULT_INTERVAL_DAYS, at],
  )?;
  Ok(inserted > 0)
}

fn select_recipients(
  conn: &Connection,
  user: &str,
  only: Option<&str>,
) -> rusqlite::Result<Vec<RawRecipient>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM recipients
     WHERE user_id = ?1 AND (?2 IS NULL OR recipient_id = ?2)
     ORDER BY created_at, recipient_id",
    RawRecipient::COLUMNS
  ))?;
  let rows = stmt
    .query_map(params![user, only], RawRecipient::from_row)?
    .collect();
  rows
}

/// Items in creation order, each with its assigned recipient ids in
/// recipient creation order.
fn select_items(
  conn: &Connection,
  user: &str,
  only: Option<&str>,
) -> rusqlite::Result<Vec<RawItem>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM legacy_items
     WHERE user_id = ?1 AND (?2 IS NULL OR item_id = ?2)
     ORDER BY created_at, item_id",
    RawItem::COLUMNS
  ))?;
  let mut items: Vec<RawItem> = stmt
    .query_map(params![user, only], RawItem::from_row)?
    .collect::<rusqlite::Result<_>>()?;

  let mut links = conn.prepare(
    "SELECT ir.item_id, ir.recipient_id
     FROM item_recipients ir
     JOIN recipients r ON r.recipient_id = ir.recipient_id
     WHERE ir.user_id = ?1 AND (?2 IS NULL OR ir.item_id = ?2)
     ORDER BY r.created_at, r.recipient_id",
  )?;
  let mut by_item: HashMap<String, Vec<String>> = HashMap::new();
  for link in links.query_map(params![user, only], |r| {
    Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
  })? {
    let (item_id, recipient_id) = link?;
    by_item.entry(item_id).or_default().push(recipient_id);
  }

  for item in &mut items {
    item.recipient_ids = by_item.remove(&item.item_id).unwrap_or_default();
  }
  Ok(items)
}

/// Recipient ids from `ids` that `user` does not own.
fn unknown_recipients(conn: &Connection, user: &str, ids: &[Uuid]) -> rusqlite::Result<Vec<Uuid>> {
  let mut stmt = conn
    .prepare_cached("SELECT 1 FROM recipients WHERE recipient_id = ?1 AND user_id = ?2")?;
  let mut unknown = Vec::new();
  for id in ids {
    if !stmt.exists(params![encode_uuid(*id), user])? {
      unknown.push(*id);
    }
  }
  Ok(unknown)
}

fn link_recipients(conn: &Connection, item: &str, user: &str, ids: &[Uuid]) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO item_recipients (item_id, recipient_id, user_id) VALUES (?1, ?2, ?3)",
  )?;
  for id in ids {
    stmt.execute(params![item, encode_uuid(*id), user])?;
  }
  Ok(())
}

fn select_event(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawReleaseEvent>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM release_events WHERE release_event_id = ?1",
        RawReleaseEvent::COLUMNS
      ),
      params![id],
      RawReleaseEvent::from_row,
    )
    .optional()
}

fn select_obligations(
  conn: &Connection,
  sql_tail: &str,
  args: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawObligation>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM obligations {sql_tail}",
    RawObligation::COLUMNS
  ))?;
  let rows = stmt.query_map(args, RawObligation::from_row)?.collect();
  rows
}

// ─── LegacyStore impl ────────────────────────────────────────────────────────

impl LegacyStore for SqliteStore {
  type Error = Error;

  // ── Check-ins ─────────────────────────────────────────────────────────────

  async fn get_or_create_checkin(&self, user: UserId) -> Result<Checkin> {
    let user_str = user.as_str().to_owned();
    let at_str = encode_dt(now());

    let (created, raw) = self
      .conn
      .call(move |conn| {
        let created = ensure_checkin(conn, &user_str, &at_str)?;
        Ok((created, select_checkin(conn, &user_str)?))
      })
      .await?;

    if created {
      debug!(user_id = %user, "created check-in record");
    }
    raw.into_checkin()
  }

  async fn record_checkin(&self, user: UserId, at: DateTime<Utc>) -> Result<Checkin> {
    let user_str = user.as_str().to_owned();
    let at_str = encode_dt(at);
    let created_str = encode_dt(now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        ensure_checkin(&tx, &user_str, &created_str)?;
        tx.execute(
          "UPDATE checkins
           SET last_checkin_at = ?2
           WHERE user_id = ?1 AND (last_checkin_at IS NULL OR last_checkin_at < ?2)",
          params![user_str, at_str],
        )?;
        let raw = select_checkin(&tx, &user_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_checkin()
  }

  async fn set_checkin_interval(&self, user: UserId, interval_days: u32) -> Result<Checkin> {
    let user_str = user.as_str().to_owned();
    let created_str = encode_dt(now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        ensure_checkin(&tx, &user_str, &created_str)?;
        tx.execute(
          "UPDATE checkins SET interval_days = ?2 WHERE user_id = ?1",
          params![user_str, interval_days],
        )?;
        let raw = select_checkin(&tx, &user_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_checkin()
  }

  // ── Recipients ────────────────────────────────────────────────────────────

  async fn add_recipient(&self, user: UserId, input: NewRecipient) -> Result<Recipient> {
    let at = now();
    let recipient = Recipient {
      recipient_id:             Uuid::new_v4(),
      user_id:                  user,
      name:                     input.name,
      email:                    input.email,
      relationship_description: input.relationship_description,
      created_at:               at,
      updated_at:               at,
    };

    let id_str = encode_uuid(recipient.recipient_id);
    let user_str = recipient.user_id.as_str().to_owned();
    let name = recipient.name.clone();
    let email = recipient.email.clone();
    let desc = recipient.relationship_description.clone();
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO recipients (
             recipient_id, user_id, name, email, relationship_description,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          params![id_str, user_str, name, email, desc, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(recipient)
  }

  async fn get_recipient(&self, user: UserId, id: Uuid) -> Result<Option<Recipient>> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);

    let raws = self
      .conn
      .call(move |conn| Ok(select_recipients(conn, &user_str, Some(&id_str))?))
      .await?;

    raws.into_iter().next().map(RawRecipient::into_recipient).transpose()
  }

  async fn list_recipients(&self, user: UserId) -> Result<Vec<Recipient>> {
    let user_str = user.as_str().to_owned();

    let raws = self
      .conn
      .call(move |conn| Ok(select_recipients(conn, &user_str, None)?))
      .await?;

    raws.into_iter().map(RawRecipient::into_recipient).collect()
  }

  async fn update_recipient(
    &self,
    user: UserId,
    id: Uuid,
    input: NewRecipient,
  ) -> Result<Option<Recipient>> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let raws = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE recipients
           SET name = ?3, email = ?4, relationship_description = ?5, updated_at = ?6
           WHERE recipient_id = ?1 AND user_id = ?2",
          params![
            id_str,
            user_str,
            input.name,
            input.email,
            input.relationship_description,
            at_str
          ],
        )?;
        if changed == 0 {
          return Ok(Vec::new());
        }
        Ok(select_recipients(conn, &user_str, Some(&id_str))?)
      })
      .await?;

    raws.into_iter().next().map(RawRecipient::into_recipient).transpose()
  }

  async fn delete_recipient(&self, user: UserId, id: Uuid) -> Result<bool> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM recipients WHERE recipient_id = ?1 AND user_id = ?2",
          params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn add_item(&self, user: UserId, input: NewItemRecord) -> Result<LegacyItem> {
    let id_str = encode_uuid(Uuid::new_v4());
    let user_str = user.as_str().to_owned();
    let ciphertext = input.ciphertext.into_inner();
    let at_str = encode_dt(now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let unknown = unknown_recipients(&tx, &user_str, &input.recipient_ids)?;
        if !unknown.is_empty() {
          return Ok(Err(unknown));
        }
        tx.execute(
          "INSERT INTO legacy_items (item_id, user_id, title, ciphertext, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![id_str, user_str, input.title, ciphertext, at_str],
        )?;
        link_recipients(&tx, &id_str, &user_str, &input.recipient_ids)?;
        let item = select_items(&tx, &user_str, Some(&id_str))?
          .into_iter()
          .next()
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(item))
      })
      .await?;

    outcome
      .map_err(vigil_core::Error::UnknownRecipients)?
      .into_item()
  }

  async fn get_item(&self, user: UserId, id: Uuid) -> Result<Option<LegacyItem>> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);

    let raws = self
      .conn
      .call(move |conn| Ok(select_items(conn, &user_str, Some(&id_str))?))
      .await?;

    raws.into_iter().next().map(RawItem::into_item).transpose()
  }

  async fn list_items(&self, user: UserId) -> Result<Vec<LegacyItem>> {
    let user_str = user.as_str().to_owned();

    let raws = self
      .conn
      .call(move |conn| Ok(select_items(conn, &user_str, None)?))
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn update_item(
    &self,
    user: UserId,
    id: Uuid,
    patch: ItemRecordPatch,
  ) -> Result<Option<LegacyItem>> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());
    let ciphertext = patch.ciphertext.map(|c| c.into_inner());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .prepare_cached("SELECT 1 FROM legacy_items WHERE item_id = ?1 AND user_id = ?2")?
          .exists(params![id_str, user_str])?;
        if !exists {
          return Ok(Ok(None));
        }

        if let Some(ids) = &patch.recipient_ids {
          let unknown = unknown_recipients(&tx, &user_str, ids)?;
          if !unknown.is_empty() {
            return Ok(Err(unknown));
          }
          tx.execute("DELETE FROM item_recipients WHERE item_id = ?1", params![id_str])?;
          link_recipients(&tx, &id_str, &user_str, ids)?;
        }

        tx.execute(
          "UPDATE legacy_items
           SET title = COALESCE(?3, title),
               ciphertext = COALESCE(?4, ciphertext),
               updated_at = ?5
           WHERE item_id = ?1 AND user_id = ?2",
          params![id_str, user_str, patch.title, ciphertext, at_str],
        )?;

        let item = select_items(&tx, &user_str, Some(&id_str))?.into_iter().next();
        tx.commit()?;
        Ok(Ok(item))
      })
      .await?;

    outcome
      .map_err(vigil_core::Error::UnknownRecipients)?
      .map(RawItem::into_item)
      .transpose()
  }

  async fn delete_item(&self, user: UserId, id: Uuid) -> Result<bool> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM legacy_items WHERE item_id = ?1 AND user_id = ?2",
          params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn assignment_graph(&self, user: UserId) -> Result<Vec<Assignment>> {
    let user_str = user.as_str().to_owned();

    let (raw_recipients, raw_items) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let recipients = select_recipients(&tx, &user_str, None)?;
        let items = select_items(&tx, &user_str, None)?;
        tx.commit()?;
        Ok((recipients, items))
      })
      .await?;

    let items = raw_items
      .into_iter()
      .map(RawItem::into_item)
      .collect::<Result<Vec<_>>>()?;

    raw_recipients
      .into_iter()
      .map(|raw| {
        let recipient = raw.into_recipient()?;
        let assigned = items
          .iter()
          .filter(|item| item.recipient_ids.contains(&recipient.recipient_id))
          .cloned()
          .collect();
        Ok((recipient, assigned))
      })
      .collect()
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn open_release_event(&self, input: NewReleaseEvent) -> Result<ReleaseEvent> {
    let event = ReleaseEvent {
      release_event_id:    Uuid::new_v4(),
      user_id:             input.user_id,
      triggered_at:        now(),
      days_overdue:        input.days_overdue,
      recipients_notified: 0,
      is_demo:             input.is_demo,
      status:              ReleaseStatus::InProgress,
    };

    let id_str = encode_uuid(event.release_event_id);
    let user_str = event.user_id.as_str().to_owned();
    let at_str = encode_dt(event.triggered_at);
    let (days, is_demo) = (event.days_overdue, event.is_demo);
    let status = encode_release_status(event.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO release_events (
             release_event_id, user_id, triggered_at, days_overdue,
             recipients_notified, is_demo, status
           ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
          params![id_str, user_str, at_str, days, is_demo, status],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn append_notification(&self, input: NewNotification) -> Result<NotificationLog> {
    let log = NotificationLog {
      notification_id:  Uuid::new_v4(),
      release_event_id: input.release_event_id,
      user_id:          input.user_id,
      recipient_id:     input.recipient_id,
      email_type:       input.email_type,
      status:           input.status,
      recipient_email:  input.recipient_email,
      subject:          input.subject,
      error_message:    input.error_message,
      is_demo:          input.is_demo,
      sent_at:          now(),
    };

    let id_str = encode_uuid(log.notification_id);
    let event_str = log.release_event_id.map(encode_uuid);
    let user_str = log.user_id.as_str().to_owned();
    let recipient_str = encode_uuid(log.recipient_id);
    let email_type = log.email_type.clone();
    let status = encode_notification_status(log.status);
    let email = log.recipient_email.clone();
    let subject = log.subject.clone();
    let error_message = log.error_message.clone();
    let is_demo = log.is_demo;
    let at_str = encode_dt(log.sent_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notification_logs (
             notification_id, release_event_id, user_id, recipient_id, email_type,
             status, recipient_email, subject, error_message, is_demo, sent_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          params![
            id_str,
            event_str,
            user_str,
            recipient_str,
            email_type,
            status,
            email,
            subject,
            error_message,
            is_demo,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(log)
  }

  async fn close_release_event(
    &self,
    id: Uuid,
    recipients_notified: u32,
    status: ReleaseStatus,
  ) -> Result<Option<ReleaseEvent>> {
    if !status.is_terminal() {
      return Err(
        vigil_core::Error::Validation("a release event can only be closed with a terminal status".into())
          .into(),
      );
    }
    let id_str = encode_uuid(id);
    let status_str = encode_release_status(status);

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE release_events
           SET recipients_notified = ?2, status = ?3
           WHERE release_event_id = ?1 AND status = 'in_progress'",
          params![id_str, recipients_notified, status_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_event(conn, &id_str)?)
      })
      .await?;

    raw.map(RawReleaseEvent::into_event).transpose()
  }

  async fn get_release_event(&self, user: UserId, id: Uuid) -> Result<Option<ReleaseEvent>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_event(conn, &id_str)?))
      .await?;

    raw
      .filter(|r| r.user_id == user.as_str())
      .map(RawReleaseEvent::into_event)
      .transpose()
  }

  async fn list_release_events(&self, user: UserId) -> Result<Vec<ReleaseEvent>> {
    let user_str = user.as_str().to_owned();

    let raws: Vec<RawReleaseEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM release_events WHERE user_id = ?1
           ORDER BY triggered_at DESC, rowid DESC",
          RawReleaseEvent::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![user_str], RawReleaseEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReleaseEvent::into_event).collect()
  }

  async fn list_event_notifications(
    &self,
    user: UserId,
    release_event_id: Uuid,
  ) -> Result<Vec<NotificationLog>> {
    let user_str = user.as_str().to_owned();
    let event_str = encode_uuid(release_event_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM notification_logs
           WHERE user_id = ?1 AND release_event_id = ?2
           ORDER BY seq",
          RawNotification::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![user_str, event_str], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn list_notifications(&self, user: UserId) -> Result<Vec<NotificationLog>> {
    let user_str = user.as_str().to_owned();

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM notification_logs WHERE user_id = ?1 ORDER BY seq DESC",
          RawNotification::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![user_str], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }
}

// ─── ObligationStore impl ────────────────────────────────────────────────────

impl ObligationStore for SqliteStore {
  type Error = Error;

  async fn list_outstanding(&self, user: UserId) -> Result<Vec<Obligation>> {
    let user_str = user.as_str().to_owned();

    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_obligations(
          conn,
          "WHERE user_id = ?1 AND status = 'outstanding'
           ORDER BY due_date IS NULL, due_date, created_at",
          params![user_str],
        )?)
      })
      .await?;

    raws.into_iter().map(RawObligation::into_obligation).collect()
  }

  async fn add_obligation(&self, user: UserId, input: NewObligation) -> Result<Obligation> {
    let at = now();
    let obligation = Obligation {
      obligation_id: Uuid::new_v4(),
      user_id:       user,
      creditor_name: input.creditor_name,
      amount_cents:  input.amount_cents,
      currency:      input.currency,
      description:   input.description,
      due_date:      input.due_date,
      status:        ObligationStatus::Outstanding,
      created_at:    at,
      updated_at:    at,
    };

    let id_str = encode_uuid(obligation.obligation_id);
    let user_str = obligation.user_id.as_str().to_owned();
    let creditor = obligation.creditor_name.clone();
    let amount = obligation.amount_cents;
    let currency = obligation.currency.clone();
    let description = obligation.description.clone();
    let due = obligation.due_date.map(encode_date);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO obligations (
             obligation_id, user_id, creditor_name, amount_cents, currency,
             description, due_date, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'outstanding', ?8, ?8)",
          params![id_str, user_str, creditor, amount, currency, description, due, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(obligation)
  }

  async fn list_obligations(&self, user: UserId) -> Result<Vec<Obligation>> {
    let user_str = user.as_str().to_owned();

    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_obligations(
          conn,
          "WHERE user_id = ?1 ORDER BY created_at, obligation_id",
          params![user_str],
        )?)
      })
      .await?;

    raws.into_iter().map(RawObligation::into_obligation).collect()
  }

  async fn settle_obligation(&self, user: UserId, id: Uuid) -> Result<Option<Obligation>> {
    let user_str = user.as_str().to_owned();
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let raws = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE obligations
           SET status = 'settled',
               updated_at = CASE WHEN status = 'settled' THEN updated_at ELSE ?3 END
           WHERE obligation_id = ?1 AND user_id = ?2",
          params![id_str, user_str, at_str],
        )?;
        if changed == 0 {
          return Ok(Vec::new());
        }
        Ok(select_obligations(
          conn,
          "WHERE obligation_id = ?1 AND user_id = ?2",
          params![id_str, user_str],
        )?)
      })
      .await?;

    raws.into_iter().next().map(RawObligation::into_obligation).transpose()
  }
}
