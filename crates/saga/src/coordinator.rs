//! Saga coordinator for reservation payments.

use std::time::{Duration, Instant};

use common::TicketId;
use domain::downstream::{self, DEFAULT_CALL_TIMEOUT};
use domain::{ActionLog, DomainError, Money, ReserveTicket, Ticket, TicketLedger};
use serde_json::json;

use crate::error::SagaError;
use crate::outcome::{BulkPaymentReport, PaymentReport, RefundReport, SagaStep, StepReport};
use crate::services::notification::{Notification, NotificationKind, NotificationSink};
use crate::services::payment::{PaymentOutcome, PaymentOutcomeProvider};
use crate::state::SagaState;

const LEDGER: &str = "ticket_ledger";
const NOTIFIER: &str = "notification_sink";

/// Drives tickets from `Reserved` to `Sold` or `Cancelled`.
///
/// The coordinator never aborts half-way: every ledger and notification call
/// is bounded by the call timeout, and a call that faults is recorded as an
/// unconfirmed step instead of failing the whole run. The caller always gets
/// a terminal verdict, which may disagree with the ledger when a step was
/// left unconfirmed.
pub struct ReservationCoordinator<L, P, N>
where
    L: TicketLedger,
    P: PaymentOutcomeProvider,
    N: NotificationSink,
{
    ledger: L,
    payments: P,
    notifier: N,
    actions: ActionLog,
    call_timeout: Duration,
}

impl<L, P, N> ReservationCoordinator<L, P, N>
where
    L: TicketLedger,
    P: PaymentOutcomeProvider,
    N: NotificationSink,
{
    /// Creates a new coordinator.
    pub fn new(ledger: L, payments: P, notifier: N, actions: ActionLog) -> Self {
        Self {
            ledger,
            payments,
            notifier,
            actions,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Sets the timeout applied to each ledger and notification call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Reserves a seat by delegating to the ledger.
    ///
    /// Fails without side effects on `SeatUnavailable` or `NotFound`.
    #[tracing::instrument(
        skip(self, cmd),
        fields(screening_id = %cmd.screening_id, seat = %cmd.seat)
    )]
    pub async fn reserve(&self, cmd: ReserveTicket) -> Result<Ticket, SagaError> {
        let ticket = downstream::call(LEDGER, self.call_timeout, self.ledger.reserve(cmd)).await?;
        tracing::info!(ticket_id = %ticket.id, state = %SagaState::Reserved, "ticket reserved");
        Ok(ticket)
    }

    /// Loads a ticket through the ledger.
    pub async fn ticket(&self, ticket_id: TicketId) -> Result<Ticket, SagaError> {
        downstream::call(LEDGER, self.call_timeout, self.ledger.get(ticket_id))
            .await?
            .ok_or_else(|| DomainError::not_found("ticket", ticket_id).into())
    }

    /// Pays for one ticket.
    ///
    /// A non-positive amount is treated as a declined payment: the ticket is
    /// cancelled without consulting the payment provider.
    #[tracing::instrument(skip(self, email), fields(saga_type = "TicketPayment"))]
    pub async fn pay(
        &self,
        ticket_id: TicketId,
        amount: Money,
        email: Option<String>,
    ) -> PaymentReport {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();
        let mut steps = Vec::new();
        transition(SagaState::Reserved, SagaState::Paying);

        let (outcome, state, message) = if !amount.is_positive() {
            tracing::warn!(%amount, "invalid payment amount, cancelling ticket");
            let (step, _) = self.cancel_step(ticket_id).await;
            steps.push(step);
            (
                PaymentOutcome::Failed,
                SagaState::Cancelled,
                format!("Invalid payment amount {amount}, ticket cancelled"),
            )
        } else {
            match self.payments.decide(amount) {
                PaymentOutcome::Success => {
                    steps.push(self.confirm_step(ticket_id).await);
                    steps.push(
                        self.notify_step(ticket_id, NotificationKind::Purchase, email.clone())
                            .await,
                    );
                    (
                        PaymentOutcome::Success,
                        SagaState::Sold,
                        "Payment successful, ticket confirmed".to_string(),
                    )
                }
                PaymentOutcome::Failed => {
                    let (step, _) = self.cancel_step(ticket_id).await;
                    steps.push(step);
                    steps.push(
                        self.notify_step(ticket_id, NotificationKind::Cancellation, email.clone())
                            .await,
                    );
                    (
                        PaymentOutcome::Failed,
                        SagaState::Cancelled,
                        "Payment declined, ticket cancelled".to_string(),
                    )
                }
            }
        };
        transition(SagaState::Paying, state);

        let action = if outcome.is_success() {
            "PAYMENT_SUCCESS"
        } else {
            "PAYMENT_FAILED"
        };
        self.actions
            .record(
                action,
                email.as_deref(),
                json!({
                    "ticket_id": ticket_id,
                    "amount": amount,
                    "status": outcome,
                    "provider": self.payments.name(),
                }),
            )
            .await;

        let report = PaymentReport {
            ticket_id,
            outcome,
            state,
            message,
            steps,
        };
        finish("single", outcome, report.is_converged(), saga_start);
        report
    }

    /// Pays for a group of tickets with one decision.
    ///
    /// Tickets are processed in order. A ticket whose step faults is reported
    /// and skipped; the rest of the group still proceeds.
    #[tracing::instrument(skip(self, email), fields(saga_type = "BulkTicketPayment"))]
    pub async fn bulk_pay(
        &self,
        ticket_ids: Vec<TicketId>,
        total_amount: Money,
        email: Option<String>,
    ) -> BulkPaymentReport {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();

        if ticket_ids.is_empty() {
            return BulkPaymentReport {
                ticket_ids,
                outcome: PaymentOutcome::Failed,
                message: "No tickets to pay for".to_string(),
                confirmed: Vec::new(),
                cancelled: Vec::new(),
                steps: Vec::new(),
            };
        }

        let outcome = if total_amount.is_positive() {
            self.payments.decide(total_amount)
        } else {
            tracing::warn!(%total_amount, "invalid bulk payment amount, cancelling tickets");
            PaymentOutcome::Failed
        };

        let mut steps = Vec::with_capacity(ticket_ids.len() * 2);
        let mut confirmed = Vec::new();
        let mut cancelled = Vec::new();

        let message = match outcome {
            PaymentOutcome::Success => {
                for &id in &ticket_ids {
                    let step = self.confirm_step(id).await;
                    if step.outcome.is_applied() {
                        confirmed.push(id);
                    }
                    steps.push(step);
                }
                for &id in &ticket_ids {
                    steps.push(
                        self.notify_step(id, NotificationKind::Purchase, email.clone())
                            .await,
                    );
                }
                format!(
                    "All tickets paid, {} of {} confirmed",
                    confirmed.len(),
                    ticket_ids.len()
                )
            }
            PaymentOutcome::Failed => {
                for &id in &ticket_ids {
                    let (step, _) = self.cancel_step(id).await;
                    if step.outcome.is_applied() {
                        cancelled.push(id);
                    }
                    steps.push(step);
                }
                format!("Payment failed, {} tickets cancelled", cancelled.len())
            }
        };

        let action = if outcome.is_success() {
            "BULK_PAYMENT_SUCCESS"
        } else {
            "BULK_PAYMENT_FAILED"
        };
        self.actions
            .record(
                action,
                email.as_deref(),
                json!({
                    "ticket_ids": ticket_ids,
                    "total_amount": total_amount,
                    "confirmed": confirmed,
                    "cancelled": cancelled,
                }),
            )
            .await;

        let report = BulkPaymentReport {
            ticket_ids,
            outcome,
            message,
            confirmed,
            cancelled,
            steps,
        };
        finish("bulk", outcome, report.is_converged(), saga_start);
        report
    }

    /// Cancels a ticket directly, bypassing the payment decision, and
    /// notifies the buyer of the refund.
    #[tracing::instrument(skip(self), fields(saga_type = "TicketRefund"))]
    pub async fn refund(&self, ticket_id: TicketId, reason: Option<String>) -> RefundReport {
        let (step, ticket) = self.cancel_step(ticket_id).await;
        let mut steps = vec![step];

        match ticket {
            Some(ticket) => {
                steps.push(
                    self.notify_step(ticket_id, NotificationKind::Refund, ticket.buyer_email.clone())
                        .await,
                );
                self.actions
                    .record(
                        "PAYMENT_REFUND",
                        ticket.buyer_email.as_deref(),
                        json!({
                            "ticket_id": ticket_id,
                            "amount": ticket.price,
                            "reason": reason,
                        }),
                    )
                    .await;
                metrics::counter!("refunds_total").increment(1);
                RefundReport {
                    ticket_id,
                    outcome: PaymentOutcome::Success,
                    refunded_amount: Some(ticket.price),
                    message: format!("Refund of {} issued", ticket.price),
                    steps,
                }
            }
            None => RefundReport {
                ticket_id,
                outcome: PaymentOutcome::Failed,
                refunded_amount: None,
                message: "Refund could not be confirmed".to_string(),
                steps,
            },
        }
    }

    async fn confirm_step(&self, ticket_id: TicketId) -> StepReport {
        match downstream::call(LEDGER, self.call_timeout, self.ledger.confirm(ticket_id)).await {
            Ok(_) => StepReport::applied(SagaStep::Confirm, ticket_id),
            Err(e) => unconfirmed(SagaStep::Confirm, ticket_id, &e),
        }
    }

    async fn cancel_step(&self, ticket_id: TicketId) -> (StepReport, Option<Ticket>) {
        match downstream::call(LEDGER, self.call_timeout, self.ledger.cancel(ticket_id)).await {
            Ok(ticket) => (StepReport::applied(SagaStep::Cancel, ticket_id), Some(ticket)),
            Err(e) => (unconfirmed(SagaStep::Cancel, ticket_id, &e), None),
        }
    }

    async fn notify_step(
        &self,
        ticket_id: TicketId,
        kind: NotificationKind,
        email: Option<String>,
    ) -> StepReport {
        let notification = Notification::new(ticket_id, kind, email);
        match downstream::call(
            NOTIFIER,
            self.call_timeout,
            self.notifier.notify(notification),
        )
        .await
        {
            Ok(_) => {
                metrics::counter!("notifications_sent_total", "kind" => kind.as_str())
                    .increment(1);
                StepReport::applied(SagaStep::Notify, ticket_id)
            }
            Err(e) => {
                metrics::counter!("notifications_failed_total", "kind" => kind.as_str())
                    .increment(1);
                tracing::warn!(%ticket_id, %kind, error = %e, "notification not delivered");
                StepReport::unconfirmed(SagaStep::Notify, ticket_id, e.to_string())
            }
        }
    }
}

fn transition(from: SagaState, to: SagaState) {
    tracing::debug!(%from, %to, "saga state transition");
}

/// Records a ledger step whose effect is unknown.
fn unconfirmed(step: SagaStep, ticket_id: TicketId, err: &DomainError) -> StepReport {
    metrics::counter!("saga_unconfirmed_steps_total", "step" => step.as_str()).increment(1);
    tracing::error!(
        %ticket_id,
        step = step.as_str(),
        error = %err,
        "saga step unconfirmed, ledger may diverge from reported outcome"
    );
    StepReport::unconfirmed(step, ticket_id, err.to_string())
}

fn finish(kind: &'static str, outcome: PaymentOutcome, converged: bool, started: Instant) {
    let duration = started.elapsed().as_secs_f64();
    metrics::histogram!("saga_duration_seconds").record(duration);
    metrics::counter!("payments_total", "kind" => kind, "outcome" => outcome.as_str())
        .increment(1);
    if converged {
        tracing::info!(%outcome, duration, "saga completed");
    } else {
        tracing::warn!(%outcome, duration, "saga completed with unconfirmed steps");
    }
}
