//! `Engine` is the outbound surface of the release engine: every operation a
//! transport layer may call, scoped by the calling user.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  checkin::{CheckinStatus, validate_interval},
  cipher::Cipher,
  ledger::{NewReleaseEvent, NotificationLog, ReleaseEvent, ReleaseStatus},
  mail::Mailer,
  obligation::{NewObligation, Obligation},
  plan::{ReleasePlan, build_plan},
  release::{self, ReleaseContext, ReleaseSummary},
  store::{LegacyStore, ObligationStore},
  user::{UserId, UserIdentity},
  vault::{
    ItemDraft, ItemPatch, ItemRecordPatch, LegacyItem, NewItemRecord,
    NewRecipient, Recipient, RecipientPatch, dedup_ids, required_text,
  },
};

/// Immutable runtime settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Upper bound on a single delivery attempt.
  pub delivery_timeout: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { delivery_timeout: Duration::from_secs(30) }
  }
}

pub struct Engine<S, M> {
  store:  Arc<S>,
  cipher: Arc<dyn Cipher>,
  mailer: M,
  config: EngineConfig,
}

impl<S, M> Engine<S, M>
where
  S: LegacyStore + ObligationStore + 'static,
  M: Mailer,
  Error: From<<S as LegacyStore>::Error> + From<<S as ObligationStore>::Error>,
{
  pub fn new(store: Arc<S>, cipher: Arc<dyn Cipher>, mailer: M, config: EngineConfig) -> Self {
    Self { store, cipher, mailer, config }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn mailer(&self) -> &M { &self.mailer }

  // ── Check-ins ─────────────────────────────────────────────────────────

  pub async fn get_checkin_status(&self, user: &UserId) -> Result<CheckinStatus> {
    let checkin = self.store.get_or_create_checkin(user.clone()).await?;
    Ok(checkin.status(Utc::now()))
  }

  /// Record that the user is alive. Never moves `last_checkin_at` backwards.
  pub async fn confirm_checkin(&self, user: &UserId) -> Result<CheckinStatus> {
    let now = Utc::now();
    let checkin = self.store.record_checkin(user.clone(), now).await?;
    debug!(user_id = %user, "check-in confirmed");
    Ok(checkin.status(now))
  }

  pub async fn set_checkin_interval(&self, user: &UserId, days: i64) -> Result<CheckinStatus> {
    let days = validate_interval(days)?;
    let checkin = self.store.set_checkin_interval(user.clone(), days).await?;
    Ok(checkin.status(Utc::now()))
  }

  // ── Recipients ────────────────────────────────────────────────────────

  pub async fn create_recipient(&self, user: &UserId, input: NewRecipient) -> Result<Recipient> {
    let input = input.validated()?;
    Ok(self.store.add_recipient(user.clone(), input).await?)
  }

  pub async fn list_recipients(&self, user: &UserId) -> Result<Vec<Recipient>> {
    Ok(self.store.list_recipients(user.clone()).await?)
  }

  pub async fn get_recipient(&self, user: &UserId, id: Uuid) -> Result<Recipient> {
    self
      .store
      .get_recipient(user.clone(), id)
      .await?
      .ok_or(Error::RecipientNotFound(id))
  }

  pub async fn update_recipient(
    &self,
    user: &UserId,
    id: Uuid,
    patch: RecipientPatch,
  ) -> Result<Recipient> {
    let current = self.get_recipient(user, id).await?;
    let input = patch.apply_to(&current).validated()?;
    self
      .store
      .update_recipient(user.clone(), id, input)
      .await?
      .ok_or(Error::RecipientNotFound(id))
  }

  pub async fn delete_recipient(&self, user: &UserId, id: Uuid) -> Result<()> {
    if self.store.delete_recipient(user.clone(), id).await? {
      Ok(())
    } else {
      Err(Error::RecipientNotFound(id))
    }
  }

  // ── Items ─────────────────────────────────────────────────────────────

  /// Encrypt `draft.content` once and persist it with its assignments.
  pub async fn create_item(&self, user: &UserId, draft: ItemDraft) -> Result<LegacyItem> {
    let title = required_text("title", &draft.title)?;
    let ciphertext = self.cipher.encrypt(&draft.content)?;
    let record = NewItemRecord {
      title,
      ciphertext,
      recipient_ids: dedup_ids(draft.recipient_ids),
    };
    Ok(self.store.add_item(user.clone(), record).await?)
  }

  pub async fn list_items(&self, user: &UserId) -> Result<Vec<LegacyItem>> {
    Ok(self.store.list_items(user.clone()).await?)
  }

  pub async fn get_item(&self, user: &UserId, id: Uuid) -> Result<LegacyItem> {
    self
      .store
      .get_item(user.clone(), id)
      .await?
      .ok_or(Error::ItemNotFound(id))
  }

  /// Title-only updates leave the ciphertext untouched. New content is
  /// re-encrypted. `recipient_ids`, when present, replaces the assignment set.
  pub async fn update_item(&self, user: &UserId, id: Uuid, patch: ItemPatch) -> Result<LegacyItem> {
    let record = ItemRecordPatch {
      title:         patch.title.as_deref().map(|t| required_text("title", t)).transpose()?,
      ciphertext:    patch.content.as_deref().map(|c| self.cipher.encrypt(c)).transpose()?,
      recipient_ids: patch.recipient_ids.map(dedup_ids),
    };
    self
      .store
      .update_item(user.clone(), id, record)
      .await?
      .ok_or(Error::ItemNotFound(id))
  }

  pub async fn delete_item(&self, user: &UserId, id: Uuid) -> Result<()> {
    if self.store.delete_item(user.clone(), id).await? {
      Ok(())
    } else {
      Err(Error::ItemNotFound(id))
    }
  }

  // ── Release ───────────────────────────────────────────────────────────

  /// Decrypt the user's assignment graph into a delivery plan.
  ///
  /// Fails with `NotOverdue` or `NothingToRelease` without touching anything.
  pub async fn compute_release_plan(&self, user: &UserId) -> Result<ReleasePlan> {
    let status = self.get_checkin_status(user).await?;
    self.plan_for(user, &status).await
  }

  async fn plan_for(&self, user: &UserId, status: &CheckinStatus) -> Result<ReleasePlan> {
    if !status.overdue {
      // skip loading the graph
      return build_plan(user.clone(), status, Vec::new(), self.cipher.as_ref());
    }
    let graph = self.store.assignment_graph(user.clone()).await?;
    build_plan(user.clone(), status, graph, self.cipher.as_ref())
  }

  /// Deliver a computed plan and record the run in the ledger.
  pub async fn execute_release(
    &self,
    who: &UserIdentity,
    plan: ReleasePlan,
    is_demo: bool,
  ) -> Result<ReleaseSummary> {
    if plan.user_id != who.user_id {
      return Err(Error::Validation("release plan belongs to another user".into()));
    }
    let obligations = match self.store.list_outstanding(who.user_id.clone()).await {
      Ok(obligations) => obligations,
      Err(e) => {
        let e = Error::from(e);
        self.record_aborted(&who.user_id, plan.days_overdue, is_demo).await?;
        return Err(e);
      }
    };
    let ctx = ReleaseContext {
      sender_display_name: who.display_name(),
      obligations,
      is_demo,
      delivery_timeout: self.config.delivery_timeout,
    };
    release::execute(&self.store, &self.mailer, plan, ctx).await
  }

  /// Plan and execute in one call.
  ///
  /// A plan that cannot be decrypted still leaves a `failed` release event
  /// behind. `NotOverdue` and `NothingToRelease` are rejections and write
  /// nothing.
  pub async fn release(&self, who: &UserIdentity, is_demo: bool) -> Result<ReleaseSummary> {
    let status = self.get_checkin_status(&who.user_id).await?;
    let plan = match self.plan_for(&who.user_id, &status).await {
      Ok(plan) => plan,
      Err(e @ Error::Decryption(_)) => {
        self
          .record_aborted(&who.user_id, status.days_since.unwrap_or(0), is_demo)
          .await?;
        return Err(e);
      }
      Err(e) => return Err(e),
    };
    self.execute_release(who, plan, is_demo).await
  }

  /// Leave a `failed` event with nobody notified for a run that never
  /// reached delivery.
  async fn record_aborted(&self, user: &UserId, days_overdue: i64, is_demo: bool) -> Result<()> {
    let event = self
      .store
      .open_release_event(NewReleaseEvent { user_id: user.clone(), days_overdue, is_demo })
      .await?;
    self
      .store
      .close_release_event(event.release_event_id, 0, ReleaseStatus::Failed)
      .await?;
    info!(release_event_id = %event.release_event_id, "release aborted before delivery");
    Ok(())
  }

  // ── Ledger ────────────────────────────────────────────────────────────

  pub async fn release_history(&self, user: &UserId) -> Result<Vec<ReleaseEvent>> {
    Ok(self.store.list_release_events(user.clone()).await?)
  }

  pub async fn event_notifications(&self, user: &UserId, id: Uuid) -> Result<Vec<NotificationLog>> {
    if self.store.get_release_event(user.clone(), id).await?.is_none() {
      return Err(Error::ReleaseNotFound(id));
    }
    Ok(self.store.list_event_notifications(user.clone(), id).await?)
  }

  pub async fn notifications(&self, user: &UserId) -> Result<Vec<NotificationLog>> {
    Ok(self.store.list_notifications(user.clone()).await?)
  }

  // ── Obligations ───────────────────────────────────────────────────────

  pub async fn add_obligation(&self, user: &UserId, input: NewObligation) -> Result<Obligation> {
    let input = input.validated()?;
    Ok(self.store.add_obligation(user.clone(), input).await?)
  }

  pub async fn list_obligations(&self, user: &UserId) -> Result<Vec<Obligation>> {
    Ok(self.store.list_obligations(user.clone()).await?)
  }

  pub async fn settle_obligation(&self, user: &UserId, id: Uuid) -> Result<Obligation> {
    self
      .store
      .settle_obligation(user.clone(), id)
      .await?
      .ok_or(Error::ObligationNotFound(id))
  }
}
