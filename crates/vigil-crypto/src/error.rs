use thiserror::Error;

/// Errors from loading key material. Encryption and decryption failures are
/// reported through [`vigil_core::Error`].
#[derive(Debug, Error)]
pub enum Error {
  #[error("vault key is not valid base64: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("vault key must be {expected} bytes, got {actual}")]
  KeyLength { expected: usize, actual: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
