use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error kinds surfaced upward, not types (spec.md §6, "Error codes"; §7,
/// "Taxonomy"). Grounded on the per-crate `ErrorKind`-flavored enums this
/// workspace's storage/analysis/recovery crates already use, unified here
/// at the outer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibrarianErrorCode {
    /// No index/graph available to analyze. Not retryable.
    ENoIndex,
    /// The index is present but known stale relative to the workspace. Not retryable.
    EStaleIndex,
    /// Storage is locked by another writer. Retryable with backoff.
    EStorageLocked,
    /// Storage is corrupt. Fatal; surfaced with a recovery hint.
    EStorageCorrupt,
    /// A query exceeded its deadline. Retryable with jitter.
    EQueryTimeout,
    /// An external provider is unavailable. Retryable.
    EProviderUnavailable,
    /// An external provider rate-limited the request. Retryable with wait.
    EProviderRateLimited,
    /// An external provider rejected the request on quota/auth grounds. Not retryable.
    EProviderQuotaOrAuth,
    /// A caller supplied an invalid argument. Not retryable.
    EInvalidArgument,
    /// An unclassified failure. Treated as retryable-once.
    EUnknown,
}

impl LibrarianErrorCode {
    /// Whether this class of failure is worth retrying (spec.md §7,
    /// "Taxonomy").
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            LibrarianErrorCode::EStorageLocked
                | LibrarianErrorCode::EQueryTimeout
                | LibrarianErrorCode::EProviderUnavailable
                | LibrarianErrorCode::EProviderRateLimited
                | LibrarianErrorCode::EUnknown
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LibrarianErrorCode::ENoIndex => "ENOINDEX",
            LibrarianErrorCode::EStaleIndex => "ESTALE_INDEX",
            LibrarianErrorCode::EStorageLocked => "ESTORAGE_LOCKED",
            LibrarianErrorCode::EStorageCorrupt => "ESTORAGE_CORRUPT",
            LibrarianErrorCode::EQueryTimeout => "EQUERY_TIMEOUT",
            LibrarianErrorCode::EProviderUnavailable => "EPROVIDER_UNAVAILABLE",
            LibrarianErrorCode::EProviderRateLimited => "EPROVIDER_RATE_LIMITED",
            LibrarianErrorCode::EProviderQuotaOrAuth => "EPROVIDER_QUOTA_OR_AUTH",
            LibrarianErrorCode::EInvalidArgument => "EINVALID_ARGUMENT",
            LibrarianErrorCode::EUnknown => "EUNKNOWN",
        }
    }
}

/// The only observable failure shape surfaced by this crate (spec.md §7,
/// "Envelope"). Internal per-crate errors are caught and classified at
/// this boundary; callers never see a raw `StorageError`/`AnalysisError`/
/// `RecoveryError`.
#[derive(Debug, Error)]
#[error("{code}: {message}", code = self.code.as_str())]
pub struct LibrarianError {
    pub code: LibrarianErrorCode,
    pub message: String,
    pub retryable: bool,
    pub recovery_hints: Vec<String>,
    pub context: BTreeMap<String, String>,
}

impl LibrarianError {
    pub fn new(code: LibrarianErrorCode, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut context = BTreeMap::new();
        context.insert("timestamp".to_string(), now.to_rfc3339());
        Self {
            retryable: code.is_retryable(),
            code,
            message: message.into(),
            recovery_hints: Vec::new(),
            context,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hints.push(hint.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

pub type Result<T> = std::result::Result<T, LibrarianError>;

impl LibrarianError {
    /// Classify a storage-layer failure into the outer envelope (spec.md
    /// §7, "Policy": "All storage failures surface").
    pub fn from_storage(err: librarian_storage::StorageError, now: DateTime<Utc>) -> Self {
        use librarian_storage::ErrorKind;
        let code = match err.kind {
            ErrorKind::Locked => LibrarianErrorCode::EStorageLocked,
            ErrorKind::Corrupt | ErrorKind::Serialization => LibrarianErrorCode::EStorageCorrupt,
            ErrorKind::Io => LibrarianErrorCode::EUnknown,
        };
        let mut built = LibrarianError::new(code, err.to_string(), now);
        if code == LibrarianErrorCode::EStorageCorrupt {
            built = built.with_hint("Rebuild the index from a clean snapshot");
        }
        built
    }

    pub fn from_analysis(err: librarian_analysis::AnalysisError, now: DateTime<Utc>) -> Self {
        match err {
            librarian_analysis::AnalysisError::InvalidArgument(msg) => {
                LibrarianError::new(LibrarianErrorCode::EInvalidArgument, msg, now)
            }
            librarian_analysis::AnalysisError::Storage(storage_err) => {
                LibrarianError::from_storage(storage_err, now)
            }
        }
    }

    pub fn from_recovery(err: librarian_recovery::RecoveryError, now: DateTime<Utc>) -> Self {
        let code = match &err {
            librarian_recovery::RecoveryError::NoStrategy => LibrarianErrorCode::EInvalidArgument,
            librarian_recovery::RecoveryError::InvalidArgument(_) => LibrarianErrorCode::EInvalidArgument,
            librarian_recovery::RecoveryError::UnsupportedVersion(_) => LibrarianErrorCode::EStorageCorrupt,
            librarian_recovery::RecoveryError::Read { .. } => LibrarianErrorCode::EStorageLocked,
            librarian_recovery::RecoveryError::Write { .. } => LibrarianErrorCode::EStorageLocked,
            librarian_recovery::RecoveryError::Parse(_) => LibrarianErrorCode::EStorageCorrupt,
        };
        LibrarianError::new(code, err.to_string(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_locked_is_retryable() {
        assert!(LibrarianErrorCode::EStorageLocked.is_retryable());
        assert!(!LibrarianErrorCode::EInvalidArgument.is_retryable());
    }

    #[test]
    fn envelope_carries_code_message_and_timestamp() {
        let err = LibrarianError::new(LibrarianErrorCode::ENoIndex, "no index built yet", Utc::now());
        assert_eq!(err.code.as_str(), "ENOINDEX");
        assert!(err.context.contains_key("timestamp"));
        assert!(!err.retryable);
    }
}
