//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the key, MPI and attribute primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected} words, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed MPI: {0}")]
    Mpi(String),

    #[error("RSA key error: {0}")]
    Rsa(String),

    #[error("attribute decryption failed: {0}")]
    Attributes(String),

    #[error("attribute serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
