use thiserror::Error;

/// Report storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path escapes the report directory: {0}")]
    PathEscape(String),

    #[error("File type not allowed: {0}")]
    DisallowedType(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for vantage_core::AppError {
    fn from(err: StorageError) -> Self {
        use vantage_core::AppError;

        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            StorageError::PathEscape(_) => {
                AppError::Forbidden("Access denied: path outside report directory".to_string())
            }
            StorageError::DisallowedType(name) => {
                AppError::InvalidInput(format!("File type not allowed: {}", name))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}
