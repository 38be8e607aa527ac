//! The user as seen by the release engine: an opaque, already-authenticated
//! identity supplied by whatever sits in front of the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of an authenticated user. Never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for UserId {
  fn from(s: String) -> Self { Self(s) }
}

/// Everything the engine needs to know about the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
  pub user_id:      UserId,
  pub email:        String,
  /// Explicit display name; derived from `email` when absent.
  pub display_name: Option<String>,
}

impl UserIdentity {
  pub fn new(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
    Self {
      user_id:      user_id.into(),
      email:        email.into(),
      display_name: None,
    }
  }

  /// The name shown to recipients as the sender of a release.
  pub fn display_name(&self) -> String {
    match self.display_name.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => name.to_owned(),
      _ => name_from_email(&self.email),
    }
  }
}

/// Title-case the local part of an address: every run of letters starts
/// upper-case and continues lower-case (`jane.doe@x` → `Jane.Doe`).
fn name_from_email(email: &str) -> String {
  let local = email.split('@').next().unwrap_or_default();
  let mut out = String::with_capacity(local.len());
  let mut at_word_start = true;
  for c in local.chars() {
    if c.is_alphabetic() {
      if at_word_start {
        out.extend(c.to_uppercase());
      } else {
        out.extend(c.to_lowercase());
      }
      at_word_start = false;
    } else {
      out.push(c);
      at_word_start = true;
    }
  }
  out
}
