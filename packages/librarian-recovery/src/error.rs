use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    /// `selectStrategy` called with an empty candidate list (spec.md §4.F).
    #[error("ENOSTRATEGY: no candidate strategies supplied")]
    NoStrategy,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("persisted learner state has unsupported version {0}, expected 1")]
    UnsupportedVersion(u32),

    #[error("failed to read learner state from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write learner state to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse learner state: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
