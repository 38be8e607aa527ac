//! The release executor: delivers a plan recipient by recipient and writes
//! the ledger.
//!
//! ```text
//! open_release_event ──► in_progress ──► one notification row per delivery
//!                                    └─► close_release_event (success | failed)
//! ```
//!
//! Deliveries run sequentially in plan order. A failed delivery is recorded
//! and the run continues. The event is closed exactly once: on the normal
//! path after the last notification row, or by [`OpenEvent`]'s drop if the
//! run is cancelled or a ledger write fails midway.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  ledger::{
    LEGACY_RELEASE_EMAIL, NewNotification, NewReleaseEvent, NotificationStatus,
    ReleaseStatus,
  },
  mail::{Mailer, ReleaseMessage},
  obligation::Obligation,
  plan::ReleasePlan,
  store::LegacyStore,
};

pub const DELIVERY_FAILED: &str = "delivery failed";
pub const DELIVERY_TIMED_OUT: &str = "delivery timed out";

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Outcome of one delivery attempt, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
  pub recipient_id:   Uuid,
  pub name:           String,
  pub email:          String,
  pub messages_count: usize,
  pub status:         NotificationStatus,
  pub error:          Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
  pub success:                bool,
  pub release_event_id:       Uuid,
  pub days_overdue:           i64,
  pub recipients_notified:    u32,
  pub per_recipient_outcomes: Vec<RecipientOutcome>,
  pub message:                String,
}

/// Inputs to a run that do not come from the plan.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
  pub sender_display_name: String,
  pub obligations:         Vec<Obligation>,
  pub is_demo:             bool,
  pub delivery_timeout:    Duration,
}

// ─── Executor ────────────────────────────────────────────────────────────────

pub async fn execute<S, M>(
  store: &Arc<S>,
  mailer: &M,
  plan: ReleasePlan,
  ctx: ReleaseContext,
) -> Result<ReleaseSummary>
where
  S: LegacyStore + 'static,
  M: Mailer,
  Error: From<S::Error>,
{
  let event = store
    .open_release_event(NewReleaseEvent {
      user_id:      plan.user_id.clone(),
      days_overdue: plan.days_overdue,
      is_demo:      ctx.is_demo,
    })
    .await?;

  let span = info_span!(
    "release",
    user_id = %plan.user_id,
    release_event_id = %event.release_event_id,
    is_demo = ctx.is_demo,
  );
  deliver_all(store, mailer, plan, ctx, event.release_event_id)
    .instrument(span)
    .await
}

async fn deliver_all<S, M>(
  store: &Arc<S>,
  mailer: &M,
  plan: ReleasePlan,
  ctx: ReleaseContext,
  release_event_id: Uuid,
) -> Result<ReleaseSummary>
where
  S: LegacyStore + 'static,
  M: Mailer,
  Error: From<S::Error>,
{
  info!(
    recipients = plan.deliveries.len(),
    items = plan.item_count(),
    "release started",
  );

  let mut open = OpenEvent::new(Arc::clone(store), release_event_id);
  let obligations = (!ctx.obligations.is_empty()).then_some(ctx.obligations);
  let mut outcomes = Vec::with_capacity(plan.deliveries.len());

  for delivery in plan.deliveries {
    let recipient = delivery.recipient;
    let messages_count = delivery.items.len();
    let message = ReleaseMessage {
      recipient_email:     recipient.email.clone(),
      recipient_name:      recipient.name.clone(),
      sender_display_name: ctx.sender_display_name.clone(),
      days_overdue:        plan.days_overdue,
      items:               delivery.items,
      obligations:         obligations.clone(),
    };

    let error = match tokio::time::timeout(ctx.delivery_timeout, mailer.send(&message)).await {
      Ok(Ok(true)) => None,
      Ok(Ok(false)) => Some(DELIVERY_FAILED.to_owned()),
      Ok(Err(e)) => Some(e.to_string()),
      Err(_) => Some(DELIVERY_TIMED_OUT.to_owned()),
    };
    let status = match &error {
      None => {
        // counts deliveries, ahead of the ledger write
        open.notified += 1;
        NotificationStatus::Sent
      }
      Some(reason) => {
        warn!(recipient_id = %recipient.recipient_id, %reason, "delivery failed");
        NotificationStatus::Failed
      }
    };

    store
      .append_notification(NewNotification {
        release_event_id: Some(release_event_id),
        user_id:          plan.user_id.clone(),
        recipient_id:     recipient.recipient_id,
        email_type:       LEGACY_RELEASE_EMAIL.to_owned(),
        status,
        recipient_email:  recipient.email.clone(),
        subject:          message.subject(),
        error_message:    error.clone(),
        is_demo:          ctx.is_demo,
      })
      .await?;

    outcomes.push(RecipientOutcome {
      recipient_id: recipient.recipient_id,
      name: recipient.name,
      email: recipient.email,
      messages_count,
      status,
      error,
    });
  }

  let notified = open.notified;
  let status = ReleaseStatus::rollup(notified);
  let closed = store.close_release_event(release_event_id, notified, status).await;
  open.disarm();
  if closed?.is_none() {
    warn!("release event was closed before the run finished");
  }

  info!(recipients_notified = notified, ?status, "release finished");

  let prefix = if ctx.is_demo { "Demo release" } else { "Release" };
  Ok(ReleaseSummary {
    success: status == ReleaseStatus::Success,
    release_event_id,
    days_overdue: plan.days_overdue,
    recipients_notified: notified,
    per_recipient_outcomes: outcomes,
    message: format!("{prefix} completed. {notified} recipient(s) notified."),
  })
}

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Closes the release event with the count reached so far if dropped while
/// still armed.
struct OpenEvent<S: LegacyStore + 'static> {
  store:    Arc<S>,
  id:       Uuid,
  notified: u32,
  armed:    bool,
}

impl<S: LegacyStore + 'static> OpenEvent<S> {
  fn new(store: Arc<S>, id: Uuid) -> Self {
    Self { store, id, notified: 0, armed: true }
  }

  fn disarm(&mut self) { self.armed = false; }
}

impl<S: LegacyStore + 'static> Drop for OpenEvent<S> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let (id, notified) = (self.id, self.notified);
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
      warn!(release_event_id = %id, "no runtime to close interrupted release event");
      return;
    };
    warn!(release_event_id = %id, notified, "release interrupted, closing event");
    let store = Arc::clone(&self.store);
    handle.spawn(async move {
      let status = ReleaseStatus::rollup(notified);
      if let Err(e) = store.close_release_event(id, notified, status).await {
        tracing::error!(release_event_id = %id, error = %e, "cannot close release event");
      }
    });
  }
}
