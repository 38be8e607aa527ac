use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand_core::{OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{Error, Result};

pub const KEY_LEN: usize = 32;

/// A 256-bit vault key. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; KEY_LEN]);

impl VaultKey {
  pub fn generate() -> Self {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    Self::from_bytes(key)
  }

  pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self { Self(bytes) }

  /// Parse the base64 form used in configuration.
  pub fn from_base64(encoded: &str) -> Result<Self> {
    let bytes = Zeroizing::new(STANDARD.decode(encoded.trim())?);
    let key: [u8; KEY_LEN] =
      bytes.as_slice().try_into().map_err(|_| Error::KeyLength {
        expected: KEY_LEN,
        actual:   bytes.len(),
      })?;
    Ok(Self::from_bytes(key))
  }

  pub fn to_base64(&self) -> String { STANDARD.encode(self.0) }

  pub fn as_bytes(&self) -> &[u8; KEY_LEN] { &self.0 }
}

impl fmt::Debug for VaultKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("VaultKey([REDACTED])")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base64_round_trip() {
    let key = VaultKey::generate();
    let parsed = VaultKey::from_base64(&key.to_base64()).unwrap();
    assert_eq!(parsed.as_bytes(), key.as_bytes());
  }

  #[test]
  fn rejects_wrong_length() {
    let short = STANDARD.encode([7u8; 16]);
    assert!(matches!(
      VaultKey::from_base64(&short),
      Err(Error::KeyLength { expected: 32, actual: 16 })
    ));
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(VaultKey::from_base64("not base64!"), Err(Error::Base64(_))));
  }

  #[test]
  fn debug_hides_key() {
    let key = VaultKey::from_bytes([1u8; KEY_LEN]);
    assert_eq!(format!("{key:?}"), "VaultKey([REDACTED])");
  }
}
