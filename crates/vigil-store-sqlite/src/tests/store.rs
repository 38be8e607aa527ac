use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;
use vigil_core::{
  checkin::DEFAULT_INTERVAL_DAYS,
  ledger::{NewNotification, NewReleaseEvent, NotificationStatus, ReleaseStatus},
  obligation::{NewObligation, ObligationStatus},
  store::{LegacyStore, ObligationStore},
  vault::{Ciphertext, ItemRecordPatch, NewItemRecord, NewRecipient},
};

use super::{alice, bob, recipient, store, tick};
use crate::{Error, SqliteStore};

fn record(title: &str, recipient_ids: Vec<Uuid>) -> NewItemRecord {
  NewItemRecord {
    title: title.to_owned(),
    ciphertext: Ciphertext::new(format!("sealed:{title}")),
    recipient_ids,
  }
}

async fn notification(s: &SqliteStore, event: Option<Uuid>, recipient_id: Uuid) {
  s.append_notification(NewNotification {
    release_event_id: event,
    user_id: alice(),
    recipient_id,
    email_type: "legacy_release".into(),
    status: NotificationStatus::Sent,
    recipient_email: "ada@example.org".into(),
    subject: "A message from Alice".into(),
    error_message: None,
    is_demo: true,
  })
  .await
  .unwrap();
}

// ─── Check-ins ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkin_is_created_lazily_once() {
  let s = store().await;

  let first = s.get_or_create_checkin(alice()).await.unwrap();
  assert_eq!(first.last_checkin_at, None);
  assert_eq!(first.interval_days, DEFAULT_INTERVAL_DAYS);

  let again = s.get_or_create_checkin(alice()).await.unwrap();
  assert_eq!(again, first);
  assert_eq!(s.count_rows("checkins").await, 1);
}

#[tokio::test]
async fn record_checkin_never_moves_backwards() {
  let s = store().await;
  let now = Utc::now();

  let c = s.record_checkin(alice(), now - Duration::days(3)).await.unwrap();
  let first = c.last_checkin_at.unwrap();

  let c = s.record_checkin(alice(), now - Duration::days(5)).await.unwrap();
  assert_eq!(c.last_checkin_at, Some(first));

  let c = s.record_checkin(alice(), now).await.unwrap();
  assert!(c.last_checkin_at.unwrap() > first);
}

#[tokio::test]
async fn interval_update_persists() {
  let s = store().await;
  s.set_checkin_interval(alice(), 30).await.unwrap();
  assert_eq!(s.get_or_create_checkin(alice()).await.unwrap().interval_days, 30);
  assert_eq!(s.get_or_create_checkin(bob()).await.unwrap().interval_days, DEFAULT_INTERVAL_DAYS);
}

// ─── Recipients ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn recipients_list_in_creation_order() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  tick().await;
  let bea = s.add_recipient(alice(), recipient("Bea")).await.unwrap();
  s.add_recipient(bob(), recipient("Cy")).await.unwrap();

  let listed = s.list_recipients(alice()).await.unwrap();
  let ids: Vec<_> = listed.iter().map(|r| r.recipient_id).collect();
  assert_eq!(ids, vec![ada.recipient_id, bea.recipient_id]);
  assert_eq!(listed[0], ada);
}

#[tokio::test]
async fn recipients_are_invisible_across_users() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();

  assert!(s.get_recipient(bob(), ada.recipient_id).await.unwrap().is_none());
  assert!(
    s.update_recipient(bob(), ada.recipient_id, recipient("Mallory"))
      .await
      .unwrap()
      .is_none()
  );
  assert!(!s.delete_recipient(bob(), ada.recipient_id).await.unwrap());

  let still = s.get_recipient(alice(), ada.recipient_id).await.unwrap().unwrap();
  assert_eq!(still.name, "Ada");
}

#[tokio::test]
async fn update_recipient_replaces_fields() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();

  let updated = s
    .update_recipient(alice(), ada.recipient_id, NewRecipient {
      name:                     "Ada L.".into(),
      email:                    "ada@new.example.org".into(),
      relationship_description: Some("sister".into()),
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Ada L.");
  assert_eq!(updated.relationship_description.as_deref(), Some("sister"));
  assert_eq!(updated.created_at, ada.created_at);
  assert!(updated.updated_at >= ada.updated_at);
}

// ─── Items & assignments ─────────────────────────────────────────────────────

#[tokio::test]
async fn item_with_foreign_recipient_writes_nothing() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  let cy = s.add_recipient(bob(), recipient("Cy")).await.unwrap();
  let ghost = Uuid::new_v4();

  let err = s
    .add_item(alice(), record("letter", vec![ada.recipient_id, cy.recipient_id, ghost]))
    .await
    .unwrap_err();
  match err {
    Error::Core(vigil_core::Error::UnknownRecipients(ids)) => {
      assert_eq!(ids, vec![cy.recipient_id, ghost]);
    }
    other => panic!("unexpected error: {other}"),
  }

  assert_eq!(s.count_rows("legacy_items").await, 0);
  assert_eq!(s.count_rows("item_recipients").await, 0);
}

#[tokio::test]
async fn item_round_trips_with_assignments() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  tick().await;
  let bea = s.add_recipient(alice(), recipient("Bea")).await.unwrap();

  let item = s
    .add_item(alice(), record("letter", vec![bea.recipient_id, ada.recipient_id]))
    .await
    .unwrap();
  let fetched = s.get_item(alice(), item.item_id).await.unwrap().unwrap();

  assert_eq!(fetched.title, "letter");
  assert_eq!(fetched.ciphertext, Ciphertext::new("sealed:letter"));
  // stored order follows recipient creation order
  assert_eq!(fetched.recipient_ids, vec![ada.recipient_id, bea.recipient_id]);
  assert!(s.get_item(bob(), item.item_id).await.unwrap().is_none());
}

#[tokio::test]
async fn created_item_matches_later_reads() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  tick().await;
  let bea = s.add_recipient(alice(), recipient("Bea")).await.unwrap();

  let created = s
    .add_item(alice(), record("letter", vec![bea.recipient_id, ada.recipient_id]))
    .await
    .unwrap();
  assert_eq!(created.recipient_ids, vec![ada.recipient_id, bea.recipient_id]);

  let fetched = s.get_item(alice(), created.item_id).await.unwrap().unwrap();
  let listed = s.list_items(alice()).await.unwrap().remove(0);
  assert_eq!(fetched.recipient_ids, created.recipient_ids);
  assert_eq!(listed.recipient_ids, created.recipient_ids);
  assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn update_item_assignment_semantics() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  let bea = s.add_recipient(alice(), recipient("Bea")).await.unwrap();
  let item = s
    .add_item(alice(), record("letter", vec![ada.recipient_id]))
    .await
    .unwrap();

  // omitted ⇒ untouched, title-only ⇒ ciphertext untouched
  let renamed = s
    .update_item(alice(), item.item_id, ItemRecordPatch {
      title: Some("renamed".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.title, "renamed");
  assert_eq!(renamed.ciphertext, item.ciphertext);
  assert_eq!(renamed.recipient_ids, vec![ada.recipient_id]);

  let moved = s
    .update_item(alice(), item.item_id, ItemRecordPatch {
      recipient_ids: Some(vec![bea.recipient_id]),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(moved.recipient_ids, vec![bea.recipient_id]);

  let cleared = s
    .update_item(alice(), item.item_id, ItemRecordPatch {
      recipient_ids: Some(vec![]),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert!(cleared.recipient_ids.is_empty());
  assert_eq!(s.count_rows("item_recipients").await, 0);
}

#[tokio::test]
async fn failed_reassignment_keeps_previous_links() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  let cy = s.add_recipient(bob(), recipient("Cy")).await.unwrap();
  let item = s
    .add_item(alice(), record("letter", vec![ada.recipient_id]))
    .await
    .unwrap();

  let err = s
    .update_item(alice(), item.item_id, ItemRecordPatch {
      title:         Some("hijacked".into()),
      recipient_ids: Some(vec![cy.recipient_id]),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(vigil_core::Error::UnknownRecipients(_))));

  let unchanged = s.get_item(alice(), item.item_id).await.unwrap().unwrap();
  assert_eq!(unchanged.title, "letter");
  assert_eq!(unchanged.recipient_ids, vec![ada.recipient_id]);
}

#[tokio::test]
async fn update_item_of_other_user_is_none() {
  let s = store().await;
  let item = s.add_item(alice(), record("letter", vec![])).await.unwrap();
  let result = s
    .update_item(bob(), item.item_id, ItemRecordPatch {
      title: Some("mine now".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn deletes_cascade_to_links_only() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  let bea = s.add_recipient(alice(), recipient("Bea")).await.unwrap();
  let one = s
    .add_item(alice(), record("one", vec![ada.recipient_id, bea.recipient_id]))
    .await
    .unwrap();
  let two = s
    .add_item(alice(), record("two", vec![ada.recipient_id]))
    .await
    .unwrap();

  assert!(s.delete_recipient(alice(), ada.recipient_id).await.unwrap());
  let one = s.get_item(alice(), one.item_id).await.unwrap().unwrap();
  assert_eq!(one.recipient_ids, vec![bea.recipient_id]);
  let two = s.get_item(alice(), two.item_id).await.unwrap().unwrap();
  assert!(two.recipient_ids.is_empty());

  assert!(s.delete_item(alice(), one.item_id).await.unwrap());
  assert!(s.get_recipient(alice(), bea.recipient_id).await.unwrap().is_some());
  assert_eq!(s.count_rows("item_recipients").await, 0);
  assert!(!s.delete_item(alice(), one.item_id).await.unwrap());
}

#[tokio::test]
async fn assignment_graph_groups_items_by_recipient() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  tick().await;
  s.add_recipient(alice(), recipient("Bea")).await.unwrap();
  tick().await;
  let cy = s.add_recipient(alice(), recipient("Cy")).await.unwrap();
  s.add_item(alice(), record("first", vec![ada.recipient_id, cy.recipient_id]))
    .await
    .unwrap();
  tick().await;
  s.add_item(alice(), record("second", vec![cy.recipient_id]))
    .await
    .unwrap();
  s.add_item(alice(), record("unassigned", vec![])).await.unwrap();

  let graph = s.assignment_graph(alice()).await.unwrap();
  let shape: Vec<(String, Vec<String>)> = graph
    .into_iter()
    .map(|(r, items)| (r.name, items.into_iter().map(|i| i.title).collect()))
    .collect();
  assert_eq!(shape, vec![
    ("Ada".to_owned(), vec!["first".to_owned()]),
    ("Bea".to_owned(), vec![]),
    ("Cy".to_owned(), vec!["first".to_owned(), "second".to_owned()]),
  ]);

  assert!(s.assignment_graph(bob()).await.unwrap().is_empty());
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn release_event_closes_exactly_once() {
  let s = store().await;
  let event = s
    .open_release_event(NewReleaseEvent { user_id: alice(), days_overdue: 9, is_demo: false })
    .await
    .unwrap();
  assert_eq!(event.status, ReleaseStatus::InProgress);
  assert_eq!(event.recipients_notified, 0);

  let closed = s
    .close_release_event(event.release_event_id, 2, ReleaseStatus::Success)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(closed.status, ReleaseStatus::Success);
  assert_eq!(closed.recipients_notified, 2);
  assert_eq!(closed.days_overdue, 9);

  let again = s
    .close_release_event(event.release_event_id, 0, ReleaseStatus::Failed)
    .await
    .unwrap();
  assert!(again.is_none());
  let stored = s.get_release_event(alice(), event.release_event_id).await.unwrap().unwrap();
  assert_eq!(stored.status, ReleaseStatus::Success);

  assert!(
    s.close_release_event(Uuid::new_v4(), 1, ReleaseStatus::Success)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn closing_as_in_progress_is_rejected() {
  let s = store().await;
  let event = s
    .open_release_event(NewReleaseEvent { user_id: alice(), days_overdue: 1, is_demo: true })
    .await
    .unwrap();
  let err = s
    .close_release_event(event.release_event_id, 0, ReleaseStatus::InProgress)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(vigil_core::Error::Validation(_))));
}

#[tokio::test]
async fn ledger_rows_reject_mutation() {
  let s = store().await;
  let event = s
    .open_release_event(NewReleaseEvent { user_id: alice(), days_overdue: 3, is_demo: true })
    .await
    .unwrap();
  notification(&s, Some(event.release_event_id), Uuid::new_v4()).await;
  s.close_release_event(event.release_event_id, 1, ReleaseStatus::Success)
    .await
    .unwrap();

  assert!(s.execute_raw("UPDATE notification_logs SET status = 'failed'").await.is_err());
  assert!(s.execute_raw("DELETE FROM notification_logs").await.is_err());
  assert!(s.execute_raw("UPDATE release_events SET recipients_notified = 5").await.is_err());
  assert!(s.execute_raw("DELETE FROM release_events").await.is_err());
  assert_eq!(s.count_rows("notification_logs").await, 1);
}

#[tokio::test]
async fn notifications_survive_recipient_deletion() {
  let s = store().await;
  let ada = s.add_recipient(alice(), recipient("Ada")).await.unwrap();
  notification(&s, None, ada.recipient_id).await;
  s.delete_recipient(alice(), ada.recipient_id).await.unwrap();

  let logs = s.list_notifications(alice()).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].recipient_id, ada.recipient_id);
  assert_eq!(logs[0].recipient_email, "ada@example.org");
  assert!(s.list_notifications(bob()).await.unwrap().is_empty());
}

#[tokio::test]
async fn event_notifications_keep_write_order() {
  let s = store().await;
  let event = s
    .open_release_event(NewReleaseEvent { user_id: alice(), days_overdue: 3, is_demo: true })
    .await
    .unwrap();
  let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
  for id in &ids {
    notification(&s, Some(event.release_event_id), *id).await;
  }
  notification(&s, None, Uuid::new_v4()).await;

  let rows = s
    .list_event_notifications(alice(), event.release_event_id)
    .await
    .unwrap();
  assert_eq!(rows.iter().map(|r| r.recipient_id).collect::<Vec<_>>(), ids);
  assert!(
    s.list_event_notifications(bob(), event.release_event_id)
      .await
      .unwrap()
      .is_empty()
  );

  let all = s.list_notifications(alice()).await.unwrap();
  assert_eq!(all.len(), 5);
  assert_eq!(all[0].release_event_id, None);
}

#[tokio::test]
async fn release_events_list_newest_first() {
  let s = store().await;
  let mut opened = Vec::new();
  for days in [1, 2, 3] {
    let e = s
      .open_release_event(NewReleaseEvent { user_id: alice(), days_overdue: days, is_demo: true })
      .await
      .unwrap();
    opened.push(e.release_event_id);
  }
  opened.reverse();

  let listed: Vec<_> = s
    .list_release_events(alice())
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.release_event_id)
    .collect();
  assert_eq!(listed, opened);
  assert!(s.get_release_event(bob(), opened[0]).await.unwrap().is_none());
}

// ─── Obligations ─────────────────────────────────────────────────────────────

fn obligation(creditor: &str, due: Option<NaiveDate>) -> NewObligation {
  NewObligation {
    creditor_name: creditor.into(),
    amount_cents:  12_500,
    currency:      "USD".into(),
    description:   None,
    due_date:      due,
  }
}

#[tokio::test]
async fn outstanding_obligations_sorted_by_due_date() {
  let s = store().await;
  let d = |day| NaiveDate::from_ymd_opt(2025, 6, day);
  s.add_obligation(alice(), obligation("undated", None)).await.unwrap();
  s.add_obligation(alice(), obligation("late", d(20))).await.unwrap();
  let early = s.add_obligation(alice(), obligation("early", d(1))).await.unwrap();
  s.add_obligation(bob(), obligation("other user", d(2))).await.unwrap();

  let names: Vec<_> = s
    .list_outstanding(alice())
    .await
    .unwrap()
    .into_iter()
    .map(|o| o.creditor_name)
    .collect();
  assert_eq!(names, ["early", "late", "undated"]);

  let settled = s
    .settle_obligation(alice(), early.obligation_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(settled.status, ObligationStatus::Settled);
  assert_eq!(settled.due_date, d(1));

  assert_eq!(s.list_outstanding(alice()).await.unwrap().len(), 2);
  assert_eq!(s.list_obligations(alice()).await.unwrap().len(), 3);
  assert!(
    s.settle_obligation(bob(), early.obligation_id)
      .await
      .unwrap()
      .is_none()
  );
}
