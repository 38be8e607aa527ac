//! The symmetric-cipher collaborator.
//!
//! Implementations bind their own key at construction; the engine never sees
//! key material. See `vigil-crypto` for the AES-256-GCM implementation.

use crate::{Result, vault::Ciphertext};

/// Authenticated encryption of item content.
///
/// `decrypt` must fail with [`Error::Decryption`](crate::Error::Decryption)
/// on tampered input or a wrong key rather than return garbage.
pub trait Cipher: Send + Sync {
  fn encrypt(&self, plaintext: &str) -> Result<Ciphertext>;

  fn decrypt(&self, ciphertext: &Ciphertext) -> Result<String>;
}
