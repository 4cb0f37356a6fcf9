//! Reports returned by the coordinator.
//!
//! Every downstream step the saga attempts is recorded with its outcome, so a
//! caller can tell a converged result from one where the ledger may disagree
//! with the verdict.

use common::TicketId;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::services::PaymentOutcome;
use crate::state::SagaState;

/// A downstream step attempted by the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    Confirm,
    Cancel,
    Notify,
}

impl SagaStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::Confirm => "confirm",
            SagaStep::Cancel => "cancel",
            SagaStep::Notify => "notify",
        }
    }
}

/// Whether a step is known to have taken effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    /// The step faulted or timed out; its effect is unknown.
    Unconfirmed { reason: String },
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: SagaStep,
    pub ticket_id: TicketId,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn applied(step: SagaStep, ticket_id: TicketId) -> Self {
        Self {
            step,
            ticket_id,
            outcome: StepOutcome::Applied,
        }
    }

    pub fn unconfirmed(step: SagaStep, ticket_id: TicketId, reason: impl Into<String>) -> Self {
        Self {
            step,
            ticket_id,
            outcome: StepOutcome::Unconfirmed {
                reason: reason.into(),
            },
        }
    }
}

/// Result of paying for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReport {
    pub ticket_id: TicketId,
    pub outcome: PaymentOutcome,
    /// Terminal state the saga drove the ticket to.
    pub state: SagaState,
    pub message: String,
    pub steps: Vec<StepReport>,
}

impl PaymentReport {
    /// Returns true if every state-changing step was applied.
    ///
    /// Notification failures do not count.
    pub fn is_converged(&self) -> bool {
        converged(&self.steps)
    }
}

/// Result of paying for a group of tickets with one decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPaymentReport {
    pub ticket_ids: Vec<TicketId>,
    pub outcome: PaymentOutcome,
    pub message: String,
    /// Tickets whose confirmation was applied.
    pub confirmed: Vec<TicketId>,
    /// Tickets whose cancellation was applied.
    pub cancelled: Vec<TicketId>,
    pub steps: Vec<StepReport>,
}

impl BulkPaymentReport {
    pub fn is_converged(&self) -> bool {
        converged(&self.steps)
    }
}

/// Result of a refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReport {
    pub ticket_id: TicketId,
    pub outcome: PaymentOutcome,
    /// Price of the cancelled ticket, when the cancellation was applied.
    #[serde(rename = "refunded_amount_cents")]
    pub refunded_amount: Option<Money>,
    pub message: String,
    pub steps: Vec<StepReport>,
}

fn converged(steps: &[StepReport]) -> bool {
    steps
        .iter()
        .filter(|s| s.step != SagaStep::Notify)
        .all(|s| s.outcome.is_applied())
}
