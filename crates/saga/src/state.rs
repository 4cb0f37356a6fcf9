//! Saga state machine for one ticket.

use serde::{Deserialize, Serialize};

/// The state of a ticket while the saga drives it.
///
/// State transitions:
/// ```text
/// Reserved ──► Paying ──┬──► Sold
///                       └──► Cancelled
/// ```
/// `Paying` is transient and only exists while a payment call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaState {
    /// Seat held, awaiting payment.
    #[default]
    Reserved,

    /// Payment decision and follow-up steps in progress.
    Paying,

    /// Payment accepted (terminal state).
    Sold,

    /// Payment declined or invalid; seat released (terminal state).
    Cancelled,
}

impl SagaState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Reserved => "RESERVED",
            SagaState::Paying => "PAYING",
            SagaState::Sold => "SOLD",
            SagaState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_reserved() {
        assert_eq!(SagaState::default(), SagaState::Reserved);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&SagaState::Paying).unwrap();
        assert_eq!(json, "\"PAYING\"");
        let back: SagaState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SagaState::Paying);
    }
}
