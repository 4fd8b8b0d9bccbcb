use thiserror::Error;

/// Errors raised while constructing or querying a [`crate::GraphModel`].
#[derive(Debug, Error)]
pub enum GraphError {
    /// The forward and reverse adjacency maps disagreed after construction.
    ///
    /// This can only happen via [`crate::GraphModel::try_build`] when a caller
    /// hands in pre-built maps instead of letting the constructor derive the
    /// reverse mapping itself.
    #[error("adjacency invariant violated: {0} -> {1} has no matching reverse edge")]
    InvariantViolation(String, String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
