//! Error types for the converter.

use crate::ports::FetchError;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid amount entered")]
    InvalidAmount,

    #[error("Exchange rates are being refreshed")]
    RefreshInProgress,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (persistence failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found")]
    NotFound,
}

/// Application-level errors, as surfaced to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Storage(e) => AppError::Internal(e),
            RepoError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_maps_to_invalid_input() {
        let err: AppError = RepoError::Domain(DomainError::InvalidAmount).into();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "Invalid amount entered"));
    }

    #[test]
    fn test_storage_error_maps_to_internal() {
        let err: AppError = RepoError::Storage("disk full".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_fetch_error_maps_to_unavailable() {
        let err: AppError = FetchError::Status(503).into();
        assert!(matches!(err, AppError::Unavailable(_)));
    }
}
