//! Client error types.

use megafetch_crypto::CryptoError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for client operations.
pub type MegaResult<T> = Result<T, MegaError>;

/// Errors that can occur while talking to the service or writing a file.
#[derive(Debug, Error)]
pub enum MegaError {
    #[error("API asked to retry (code {code})")]
    TransientApi { code: i64 },

    #[error("API request failed with code {code}")]
    FatalApi { code: i64 },

    #[error("login handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("invalid link: {0}")]
    LinkFormatInvalid(String),

    #[error("file not currently accessible: {0}")]
    ContentUnavailable(String),

    #[error("content integrity check failed")]
    IntegrityFailure,

    #[error("cannot write to {}: {source}", path.display())]
    DestinationWriteDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MegaError {
    /// True when resending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MegaError::TransientApi { .. })
    }

    /// True when the session or client itself is unusable, so no further
    /// download can succeed.
    ///
    /// Login maps every failure (API codes, bad keys) to
    /// [`MegaError::HandshakeRejected`]; nothing raised while fetching a file
    /// falls in this class.
    pub fn is_session_level(&self) -> bool {
        matches!(self, MegaError::HandshakeRejected(_) | MegaError::Config(_))
    }

    /// True when the failure concerns a single file and a batch may go on.
    pub fn is_per_file(&self) -> bool {
        !self.is_session_level()
    }

    /// Maps a local write failure, singling out permission problems.
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            MegaError::DestinationWriteDenied {
                path: path.into(),
                source,
            }
        } else {
            MegaError::Io(source)
        }
    }
}
