//! Ticket reservation and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ScreeningId, SeatPosition, TicketId};
use domain::{ReserveTicket, Ticket, TicketLedger, TicketStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct ReserveRequest {
    #[serde(alias = "session_id")]
    pub screening_id: u64,
    pub row: String,
    pub seat_number: u32,
    pub price_cents: i64,
    pub email: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct TicketResponse {
    pub id: TicketId,
    pub screening_id: ScreeningId,
    pub row: String,
    pub seat_number: u32,
    pub status: TicketStatus,
    pub price_cents: i64,
    pub buyer_email: Option<String>,
}

impl From<Ticket> for TicketResponse {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            screening_id: t.screening_id,
            row: t.row,
            seat_number: t.seat_number,
            status: t.status,
            price_cents: t.price.cents(),
            buyer_email: t.buyer_email,
        }
    }
}

// -- Handlers --

/// GET /tickets: list every ticket.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state.ledger().list_all().await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

/// GET /tickets/{id}: load one ticket.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.coordinator.ticket(TicketId::new(id)).await?;
    Ok(Json(ticket.into()))
}

/// POST /tickets/reserve: hold a seat and issue a `RESERVED` ticket.
#[tracing::instrument(skip(state, req), fields(screening_id = req.screening_id))]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid price: {}",
            req.price_cents
        )));
    }

    let mut cmd = ReserveTicket::new(
        ScreeningId::new(req.screening_id),
        SeatPosition::new(req.row, req.seat_number),
        domain::Money::from_cents(req.price_cents),
    );
    if let Some(email) = req.email.filter(|e| !e.trim().is_empty()) {
        cmd = cmd.with_email(email);
    }

    let ticket = state.coordinator.reserve(cmd).await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

/// POST /tickets/{id}/confirm: mark a ticket sold.
#[tracing::instrument(skip(state))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.ledger().confirm(TicketId::new(id)).await?;
    Ok(Json(ticket.into()))
}

/// POST /tickets/{id}/cancel: cancel a ticket and release its seat.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.ledger().cancel(TicketId::new(id)).await?;
    Ok(Json(ticket.into()))
}
