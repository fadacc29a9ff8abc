//! Error types for adapter operations.

use std::fmt;

/// Errors surfaced by the adapter.
///
/// Every error propagates to the caller unchanged; the adapter never retries.
/// `flush` is the only operation that swallows per-key failures during its sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Transport-level connect to the store failed.
    ConnectionError(String),

    /// The store rejected the configured credential.
    AuthError(String),

    /// The store rejected the logical database selection.
    SelectDbError { index: u32, reason: String },

    /// A parameterless call was made before any call established an active key.
    NoActiveKeyError,

    /// Enumeration or flush requested while the stats key is empty.
    TrackingDisabledError,

    /// A required option is missing from the fully-defaulted configuration.
    ConfigInconsistencyError(String),

    /// The store rejected a write.
    StorageError(String),

    /// A non-write store command failed (connection lost, wrong type, ...).
    BackendError(String),

    /// The codec failed to encode content for storage.
    SerializationError(String),

    /// The codec failed to decode stored content.
    DeserializationError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Error::AuthError(msg) => write!(f, "Authentication failed: {}", msg),
            Error::SelectDbError { index, reason } => {
                write!(f, "Failed to select database {}: {}", index, reason)
            }
            Error::NoActiveKeyError => write!(f, "The cache must be started first"),
            Error::TrackingDisabledError => {
                write!(f, "Cached keys need to be enabled to use this function (statsKey is empty)")
            }
            Error::ConfigInconsistencyError(msg) => {
                write!(f, "Unexpected inconsistency in options: {}", msg)
            }
            Error::StorageError(msg) => write!(f, "Failed storing the data: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::BackendError(err.to_string())
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
