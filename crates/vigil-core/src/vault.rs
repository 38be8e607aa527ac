//! Vault types: trusted recipients, encrypted legacy items, and the
//! many-to-many assignment between them.
//!
//! Plaintext only ever appears in [`ItemDraft`] / [`ItemPatch`] on the way in
//! and in [`DecryptedItem`] inside a release plan. Everything persisted carries
//! a [`Ciphertext`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::UserId};

pub const MAX_TEXT_LEN: usize = 255;

// ─── Recipients ──────────────────────────────────────────────────────────────

/// A trusted contact eligible to receive assigned legacy items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
  pub recipient_id:             Uuid,
  pub user_id:                  UserId,
  pub name:                     String,
  pub email:                    String,
  pub relationship_description: Option<String>,
  pub created_at:               DateTime<Utc>,
  pub updated_at:               DateTime<Utc>,
}

/// Validated recipient fields, used for both create and full replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipient {
  pub name:                     String,
  pub email:                    String,
  #[serde(default)]
  pub relationship_description: Option<String>,
}

impl NewRecipient {
  /// Trim and check every field. Blank descriptions collapse to `None`.
  pub fn validated(self) -> Result<Self> {
    Ok(Self {
      name:                     required_text("name", &self.name)?,
      email:                    email_address(&self.email)?,
      relationship_description: optional_text(
        "relationship_description",
        self.relationship_description.as_deref(),
      )?,
    })
  }
}

/// Partial update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientPatch {
  pub name:                     Option<String>,
  pub email:                    Option<String>,
  /// An empty string clears the description.
  pub relationship_description: Option<String>,
}

impl RecipientPatch {
  /// Merge onto `current`, producing the full replacement to validate.
  pub fn apply_to(self, current: &Recipient) -> NewRecipient {
    NewRecipient {
      name:                     self.name.unwrap_or_else(|| current.name.clone()),
      email:                    self.email.unwrap_or_else(|| current.email.clone()),
      relationship_description: match self.relationship_description {
        Some(desc) => Some(desc),
        None => current.relationship_description.clone(),
      },
    }
  }
}

// ─── Items ───────────────────────────────────────────────────────────────────

/// Encrypted item content as produced by a [`Cipher`](crate::cipher::Cipher).
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphertext(String);

impl Ciphertext {
  pub fn new(encoded: impl Into<String>) -> Self { Self(encoded.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Debug for Ciphertext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Ciphertext(<{} bytes>)", self.0.len())
  }
}

/// A stored legacy item. Serialises without its ciphertext; API responses
/// expose the title and the set of assigned recipient ids only.
#[derive(Debug, Clone, Serialize)]
pub struct LegacyItem {
  pub item_id:       Uuid,
  pub user_id:       UserId,
  pub title:         String,
  #[serde(skip)]
  pub ciphertext:    Ciphertext,
  pub recipient_ids: Vec<Uuid>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Caller input for a new item. `content` is plaintext and is encrypted
/// before anything touches storage.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDraft {
  pub title:         String,
  pub content:       String,
  #[serde(default)]
  pub recipient_ids: Vec<Uuid>,
}

/// Caller input for an item update.
///
/// `recipient_ids: Some(vec![])` clears every assignment; `None` leaves them
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
  pub title:         Option<String>,
  pub content:       Option<String>,
  pub recipient_ids: Option<Vec<Uuid>>,
}

/// What the store persists for a new item.
#[derive(Debug, Clone)]
pub struct NewItemRecord {
  pub title:         String,
  pub ciphertext:    Ciphertext,
  pub recipient_ids: Vec<Uuid>,
}

/// What the store applies for an item update.
#[derive(Debug, Clone, Default)]
pub struct ItemRecordPatch {
  pub title:         Option<String>,
  pub ciphertext:    Option<Ciphertext>,
  pub recipient_ids: Option<Vec<Uuid>>,
}

/// A decrypted `{title, content}` pair. Exists only in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptedItem {
  pub title:   String,
  pub content: String,
}

/// Deduplicate an assignment set while keeping first-seen order.
pub fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
  let mut seen = std::collections::HashSet::with_capacity(ids.len());
  ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Trimmed, non-empty, at most [`MAX_TEXT_LEN`] characters.
pub fn required_text(field: &str, value: &str) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::Validation(format!("{field} must not be empty")));
  }
  if value.chars().count() > MAX_TEXT_LEN {
    return Err(Error::Validation(format!(
      "{field} must be at most {MAX_TEXT_LEN} characters"
    )));
  }
  Ok(value.to_owned())
}

/// Like [`required_text`], but blank means absent.
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>> {
  match value.map(str::trim) {
    None | Some("") => Ok(None),
    Some(v) => required_text(field, v).map(Some),
  }
}

/// Minimal address check: one `@`, a non-empty local part, a dotted domain.
pub fn email_address(value: &str) -> Result<String> {
  let value = required_text("email", value)?;
  let invalid = || Error::Validation(format!("invalid email address: {value}"));

  let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
  if local.is_empty() || domain.contains('@') || value.contains(char::is_whitespace) {
    return Err(invalid());
  }
  let labels: Vec<&str> = domain.split('.').collect();
  if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
    return Err(invalid());
  }
  Ok(value)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recipient_fields_are_trimmed() {
    let r = NewRecipient {
      name:                     "  Ada  ".into(),
      email:                    " ada@example.org ".into(),
      relationship_description: Some("   ".into()),
    }
    .validated()
    .unwrap();
    assert_eq!(r.name, "Ada");
    assert_eq!(r.email, "ada@example.org");
    assert_eq!(r.relationship_description, None);
  }

  #[test]
  fn rejects_bad_addresses() {
    for bad in ["", "ada", "@example.org", "ada@", "ada@example", "a@b@c.d", "ada@.org", "a da@x.org"] {
      assert!(email_address(bad).is_err(), "{bad:?} should be rejected");
    }
    assert!(email_address("ada.lovelace+vault@mail.example.org").is_ok());
  }

  #[test]
  fn rejects_overlong_names() {
    let long = "x".repeat(MAX_TEXT_LEN + 1);
    assert!(matches!(required_text("name", &long), Err(Error::Validation(_))));
    assert!(required_text("name", &"x".repeat(MAX_TEXT_LEN)).is_ok());
  }

  #[test]
  fn patch_keeps_untouched_fields() {
    let now = Utc::now();
    let current = Recipient {
      recipient_id:             Uuid::new_v4(),
      user_id:                  UserId::from("u"),
      name:                     "Ada".into(),
      email:                    "ada@example.org".into(),
      relationship_description: Some("sister".into()),
      created_at:               now,
      updated_at:               now,
    };
    let merged = RecipientPatch {
      email: Some("ada@new.example.org".into()),
      ..Default::default()
    }
    .apply_to(&current);
    assert_eq!(merged.name, "Ada");
    assert_eq!(merged.email, "ada@new.example.org");
    assert_eq!(merged.relationship_description.as_deref(), Some("sister"));
  }

  #[test]
  fn dedup_keeps_order() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(dedup_ids(vec![a, b, a, b]), vec![a, b]);
  }
}
