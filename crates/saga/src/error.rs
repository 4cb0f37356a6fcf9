//! Saga error types.

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Domain error, including downstream timeouts.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Notification service error.
    #[error("Notification service error: {0}")]
    Notification(String),
}

impl SagaError {
    /// Returns the underlying domain error, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            SagaError::Domain(e) => Some(e),
            SagaError::Notification(_) => None,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
