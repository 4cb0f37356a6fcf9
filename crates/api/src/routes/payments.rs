//! Payment saga endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::TicketId;
use domain::Money;
use saga::{BulkPaymentReport, PaymentReport, RefundReport};
use serde::Deserialize;

use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub ticket_id: u64,
    pub amount_cents: i64,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct BulkPaymentRequest {
    pub ticket_ids: Vec<u64>,
    pub total_amount_cents: i64,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub ticket_id: u64,
    pub reason: Option<String>,
}

// -- Handlers --
//
// The saga always reaches a verdict, so these handlers never fail once the
// body is parsed; the report tells the caller which steps were confirmed.

/// POST /payments: pay for one ticket.
#[tracing::instrument(skip(state, req), fields(ticket_id = req.ticket_id))]
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaymentRequest>,
) -> Json<PaymentReport> {
    let report = state
        .coordinator
        .pay(
            TicketId::new(req.ticket_id),
            Money::from_cents(req.amount_cents),
            req.email,
        )
        .await;
    Json(report)
}

/// POST /payments/bulk: pay for several tickets with one decision.
#[tracing::instrument(skip(state, req), fields(tickets = req.ticket_ids.len()))]
pub async fn pay_bulk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkPaymentRequest>,
) -> Json<BulkPaymentReport> {
    let ticket_ids = req.ticket_ids.into_iter().map(TicketId::new).collect();
    let report = state
        .coordinator
        .bulk_pay(
            ticket_ids,
            Money::from_cents(req.total_amount_cents),
            req.email,
        )
        .await;
    Json(report)
}

/// POST /payments/refund: cancel a ticket and return the money.
#[tracing::instrument(skip(state, req), fields(ticket_id = req.ticket_id))]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefundRequest>,
) -> Json<RefundReport> {
    let report = state
        .coordinator
        .refund(TicketId::new(req.ticket_id), req.reason)
        .await;
    Json(report)
}
