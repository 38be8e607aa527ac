//! Outstanding financial obligations disclosed alongside a release.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  user::UserId,
  vault::{optional_text, required_text},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
  Outstanding,
  Settled,
}

/// A debt or commitment the user wants their recipients to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
  pub obligation_id: Uuid,
  pub user_id:       UserId,
  pub creditor_name: String,
  /// Minor units of `currency`. Always positive.
  pub amount_cents:  i64,
  pub currency:      String,
  pub description:   Option<String>,
  pub due_date:      Option<NaiveDate>,
  pub status:        ObligationStatus,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Obligation {
  /// `1234` cents → `"12.34"`.
  pub fn amount_display(&self) -> String {
    format!("{}.{:02}", self.amount_cents / 100, self.amount_cents % 100)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewObligation {
  pub creditor_name: String,
  pub amount_cents:  i64,
  #[serde(default = "default_currency")]
  pub currency:      String,
  #[serde(default)]
  pub description:   Option<String>,
  #[serde(default)]
  pub due_date:      Option<NaiveDate>,
}

fn default_currency() -> String { "USD".to_owned() }

impl NewObligation {
  pub fn validated(self) -> Result<Self> {
    if self.amount_cents <= 0 {
      return Err(Error::Validation("amount_cents must be positive".into()));
    }
    let currency = self.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(Error::Validation(format!(
        "currency must be a three-letter code, got {currency:?}"
      )));
    }
    Ok(Self {
      creditor_name: required_text("creditor_name", &self.creditor_name)?,
      amount_cents:  self.amount_cents,
      currency:      currency.to_ascii_uppercase(),
      description:   optional_text("description", self.description.as_deref())?,
      due_date:      self.due_date,
    })
  }
}
