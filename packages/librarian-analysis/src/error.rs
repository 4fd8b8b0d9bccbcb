use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Storage(#[from] librarian_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
