//! Error types for storage, configuration and remote calls.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the storage, serialization, configuration and remote-call layers.
///
/// The request cache and the retry engine never produce this type on their own: they are
/// generic over the producer's error and hand it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Storage backend could not read, write or remove a key.
    BackendError(String),

    /// A value could not be encoded for storage.
    SerializationError(String),

    /// A stored payload could not be decoded.
    DeserializationError(String),

    /// Stored bytes do not carry a valid envelope.
    InvalidCacheEntry(String),

    /// Stored envelope was written by a different schema version.
    VersionMismatch { expected: u32, found: u32 },

    /// Configuration text or values are unusable.
    ConfigError(String),

    /// Remote call could not complete (network, connection reset, ...).
    Transport(String),

    /// Remote call completed but reported a logical failure.
    Remote { function: String, message: String },

    /// Remote call exceeded its deadline.
    Timeout(String),
}

impl Error {
    /// True for failures worth retrying: transport errors and timeouts.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "storage backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => write!(
                f,
                "cache schema version mismatch: expected {}, found {}",
                expected, found
            ),
            Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            Error::Transport(msg) => write!(f, "transport error: {}", msg),
            Error::Remote { function, message } => {
                write!(f, "remote function '{}' failed: {}", function, message)
            }
            Error::Timeout(msg) => write!(f, "timed out: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}
