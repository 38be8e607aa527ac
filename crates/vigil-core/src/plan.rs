//! The release planner: turns an overdue user's assignment graph into the
//! decrypted per-recipient delivery plan.
//!
//! Planning has no side effects beyond decryption. A single undecryptable
//! item aborts the whole plan.

use serde::Serialize;
use tracing::error;

use crate::{
  Error, Result,
  checkin::CheckinStatus,
  cipher::Cipher,
  store::Assignment,
  user::UserId,
  vault::{DecryptedItem, Recipient},
};

/// One recipient's share of a release.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedDelivery {
  pub recipient: Recipient,
  pub items:     Vec<DecryptedItem>,
}

/// The decrypted mapping from recipient to assigned items. Only ever built
/// for an overdue user.
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub user_id:      UserId,
  pub days_overdue: i64,
  pub deliveries:   Vec<PlannedDelivery>,
}

impl ReleasePlan {
  pub fn item_count(&self) -> usize {
    self.deliveries.iter().map(|d| d.items.len()).sum()
  }
}

/// Build a plan from a check-in status and an assignment graph.
///
/// `graph` must already be in delivery order (recipient creation order, then
/// id); it is preserved as-is. Recipients with no items are dropped.
pub fn build_plan(
  user_id: UserId,
  status: &CheckinStatus,
  graph: Vec<Assignment>,
  cipher: &dyn Cipher,
) -> Result<ReleasePlan> {
  if !status.overdue {
    return Err(Error::NotOverdue {
      days_since:    status.days_since,
      interval_days: status.interval_days,
    });
  }

  let mut deliveries = Vec::new();
  for (recipient, items) in graph {
    if items.is_empty() {
      continue;
    }
    let items = items
      .into_iter()
      .map(|item| {
        let content = cipher.decrypt(&item.ciphertext).inspect_err(|e| {
          error!(item_id = %item.item_id, error = %e, "cannot decrypt legacy item");
        })?;
        Ok(DecryptedItem { title: item.title, content })
      })
      .collect::<Result<Vec<_>>>()?;
    deliveries.push(PlannedDelivery { recipient, items });
  }

  if deliveries.is_empty() {
    return Err(Error::NothingToRelease);
  }

  Ok(ReleasePlan {
    user_id,
    days_overdue: status.days_since.unwrap_or(0),
    deliveries,
  })
}
