//! Domain error types.

use common::{ScreeningId, SeatPosition};
use record_store::StoreError;
use thiserror::Error;

use crate::money::Money;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Unknown screening, seat or ticket.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Reservation attempted on a held or sold seat.
    #[error("Seat {seat} is not available for screening {screening_id}")]
    SeatUnavailable {
        screening_id: ScreeningId,
        seat: SeatPosition,
    },

    /// Payment amount is zero or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// A peer call timed out or failed.
    #[error("{peer} unavailable: {reason}")]
    DownstreamUnavailable { peer: &'static str, reason: String },

    /// Input rejected by catalog validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An error occurred in the record store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Builds a [`DomainError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Maps a store-level not-found into a domain not-found for `entity`.
    pub(crate) fn from_store(entity: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => DomainError::NotFound { entity, id },
            other => DomainError::Store(other),
        }
    }
}
