use aes_gcm::{
  Aes256Gcm, Nonce,
  aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use vigil_core::{Error, Result, cipher::Cipher, vault::Ciphertext};

use crate::VaultKey;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypts item content under a single vault key.
pub struct AesGcmCipher {
  aead: Aes256Gcm,
}

impl AesGcmCipher {
  pub fn new(key: &VaultKey) -> Self {
    Self { aead: Aes256Gcm::new(key.as_bytes().into()) }
  }
}

impl Cipher for AesGcmCipher {
  fn encrypt(&self, plaintext: &str) -> Result<Ciphertext> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = self
      .aead
      .encrypt(&nonce, plaintext.as_bytes())
      .map_err(|e| Error::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(Ciphertext::new(STANDARD.encode(out)))
  }

  fn decrypt(&self, ciphertext: &Ciphertext) -> Result<String> {
    let raw = STANDARD
      .decode(ciphertext.as_str())
      .map_err(|e| Error::Decryption(format!("malformed ciphertext: {e}")))?;
    if raw.len() < NONCE_LEN + TAG_LEN {
      return Err(Error::Decryption("ciphertext is truncated".into()));
    }

    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    let plain = self
      .aead
      .decrypt(Nonce::from_slice(nonce), sealed)
      .map_err(|_| Error::Decryption("authentication failed".into()))?;
    String::from_utf8(plain).map_err(|_| Error::Decryption("plaintext is not UTF-8".into()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cipher() -> AesGcmCipher { AesGcmCipher::new(&VaultKey::generate()) }

  #[test]
  fn round_trips_text() {
    let c = cipher();
    let long = "x".repeat(10_000);
    for p in ["", "hello", "multi\nline ✉ message with ünïcödé", long.as_str()] {
      let sealed = c.encrypt(p).unwrap();
      assert_ne!(sealed.as_str(), p);
      assert_eq!(c.decrypt(&sealed).unwrap(), p);
    }
  }

  #[test]
  fn nonces_are_fresh() {
    let c = cipher();
    assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
  }

  #[test]
  fn wrong_key_fails_closed() {
    let sealed = cipher().encrypt("for your eyes only").unwrap();
    assert!(matches!(cipher().decrypt(&sealed), Err(Error::Decryption(_))));
  }

  #[test]
  fn tampering_fails_closed() {
    let c = cipher();
    let sealed = c.encrypt("for your eyes only").unwrap();
    let mut raw = STANDARD.decode(sealed.as_str()).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    let tampered = Ciphertext::new(STANDARD.encode(raw));
    assert!(matches!(c.decrypt(&tampered), Err(Error::Decryption(_))));
  }

  #[test]
  fn garbage_fails_closed() {
    let c = cipher();
    assert!(matches!(c.decrypt(&Ciphertext::new("%%%")), Err(Error::Decryption(_))));
    assert!(matches!(c.decrypt(&Ciphertext::new("AAAA")), Err(Error::Decryption(_))));
  }
}
