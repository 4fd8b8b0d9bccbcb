use std::fmt;

use thiserror::Error;

/// Storage error kind, not type — mirrors the taxonomy in spec.md §7
/// ("Configuration/precondition", "Storage", …) at the narrow scope of this
/// crate's own failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backing store is locked by another writer; retryable with backoff.
    Locked,
    /// Backing store returned unreadable data; fatal.
    Corrupt,
    /// Serialization/deserialization failure.
    Serialization,
    /// I/O failure underneath the store.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Locked => "locked",
            ErrorKind::Corrupt => "corrupt",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
        }
    }

    /// Whether spec.md §7's error taxonomy marks this kind as retryable.
    pub fn retryable(&self) -> bool {
        matches!(self, ErrorKind::Locked)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn locked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Locked, message)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corrupt, message)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
