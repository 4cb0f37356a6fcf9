//! Reservation saga for seat booking.
//!
//! The coordinator drives one ticket (or a group of tickets) from `Reserved`
//! to a terminal state:
//! 1. Validate the amount (a non-positive amount is treated as a declined payment)
//! 2. Ask the payment outcome provider for a decision
//! 3. Confirm the ticket, or cancel it to release the seat
//! 4. Notify the buyer, best-effort
//!
//! There is no shared transaction across the ledger, the seat inventory and
//! the notification sink. A downstream step that faults is logged and
//! reported as [`StepOutcome::Unconfirmed`]; the caller still receives a
//! terminal verdict.

pub mod coordinator;
pub mod error;
pub mod outcome;
pub mod services;
pub mod state;

pub use coordinator::ReservationCoordinator;
pub use error::SagaError;
pub use outcome::{BulkPaymentReport, PaymentReport, RefundReport, SagaStep, StepOutcome, StepReport};
pub use services::{
    AlwaysApprove, AlwaysDecline, DeliveredNotification, DeliveryReceipt, HttpNotificationSink,
    InMemoryNotificationSink, Notification, NotificationKind, NotificationSink, PaymentOutcome,
    PaymentOutcomeProvider, PaymentPolicy, WeightedRandom,
};
pub use state::SagaState;
