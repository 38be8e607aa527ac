//! AES-256-GCM implementation of the [`vigil_core::cipher::Cipher`]
//! collaborator.
//!
//! Ciphertext format: `base64(nonce[12] ‖ ciphertext ‖ tag[16])`, standard
//! alphabet with padding. A fresh random nonce is drawn for every encryption.

mod cipher;
mod error;
mod key;

pub use cipher::AesGcmCipher;
pub use error::{Error, Result};
pub use key::VaultKey;
