//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use record_store::StoreError;
use saga::SagaError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Saga execution error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(&err),
            ApiError::Saga(err) => saga_error_to_response(&err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: &DomainError) -> (StatusCode, String) {
    let status = match err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::SeatUnavailable { .. } => StatusCode::CONFLICT,
        DomainError::Validation(_) | DomainError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        DomainError::DownstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        DomainError::Store(StoreError::AlreadyExists { .. }) => StatusCode::CONFLICT,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn saga_error_to_response(err: &SagaError) -> (StatusCode, String) {
    match err {
        SagaError::Domain(inner) => domain_error_to_response(inner),
        SagaError::Notification(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open record store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to initialise domain services: {0}")]
    Domain(#[from] DomainError),

    #[error("failed to initialise saga services: {0}")]
    Saga(#[from] SagaError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ScreeningId, SeatPosition};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_error_statuses() {
        assert_eq!(
            status_of(DomainError::not_found("ticket", 9).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                DomainError::SeatUnavailable {
                    screening_id: ScreeningId::new(1),
                    seat: SeatPosition::new("A", 1),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::Validation("bad slot".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                DomainError::DownstreamUnavailable {
                    peer: "seat_inventory",
                    reason: "timed out".into(),
                }
                .into()
            ),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_saga_error_unwraps_domain_status() {
        let err = SagaError::from(DomainError::not_found("ticket", 1));
        assert_eq!(status_of(err.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(SagaError::Notification("down".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_plain_errors() {
        assert_eq!(
            status_of(ApiError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
