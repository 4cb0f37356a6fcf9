//! Screening scheduling and seat map endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::{CinemaId, HallId, ScreeningId, SeatPosition};
use domain::downstream;
use domain::{CreateScreening, CreateScreenings, Money, Screening, Seat, SeatInventory, TicketLedger};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::tickets::TicketResponse;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateScreeningRequest {
    pub movie_title: String,
    pub cinema_id: u32,
    pub hall_id: u32,
    pub start_time: String,
    pub session_date: Option<NaiveDate>,
    pub price_cents: i64,
}

#[derive(Deserialize)]
pub struct CreateScreeningsRequest {
    pub movie_title: String,
    pub cinema_id: u32,
    pub hall_id: u32,
    pub start_times: Vec<String>,
    pub session_date: Option<NaiveDate>,
    pub price_cents: i64,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct ScreeningResponse {
    pub id: ScreeningId,
    pub movie_title: String,
    pub cinema_id: CinemaId,
    pub hall_id: HallId,
    pub start_time: String,
    pub session_date: NaiveDate,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Screening> for ScreeningResponse {
    fn from(s: Screening) -> Self {
        Self {
            id: s.id,
            movie_title: s.movie_title,
            cinema_id: s.cinema_id,
            hall_id: s.hall_id,
            start_time: s.start_time,
            session_date: s.session_date,
            price_cents: s.price.cents(),
            created_at: s.created_at,
        }
    }
}

// -- Handlers --

/// GET /screenings: list every screening.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScreeningResponse>>, ApiError> {
    let screenings = state.catalog.list_screenings().await?;
    Ok(Json(screenings.into_iter().map(Into::into).collect()))
}

/// POST /screenings: schedule one screening and create its seat map.
#[tracing::instrument(skip(state, req), fields(hall_id = req.hall_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateScreeningRequest>,
) -> Result<(StatusCode, Json<ScreeningResponse>), ApiError> {
    let screening = state
        .catalog
        .create_screening(CreateScreening {
            movie_title: req.movie_title,
            cinema_id: CinemaId::new(req.cinema_id),
            hall_id: HallId::new(req.hall_id),
            start_time: req.start_time,
            session_date: req.session_date,
            price: Money::from_cents(req.price_cents),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(screening.into())))
}

/// POST /screenings/batch: schedule several slots of one movie at once.
#[tracing::instrument(skip(state, req), fields(hall_id = req.hall_id))]
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateScreeningsRequest>,
) -> Result<(StatusCode, Json<Vec<ScreeningResponse>>), ApiError> {
    let screenings = state
        .catalog
        .create_screenings(CreateScreenings {
            movie_title: req.movie_title,
            cinema_id: CinemaId::new(req.cinema_id),
            hall_id: HallId::new(req.hall_id),
            start_times: req.start_times,
            session_date: req.session_date,
            price: Money::from_cents(req.price_cents),
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(screenings.into_iter().map(Into::into).collect()),
    ))
}

/// GET /screenings/{id}: load one screening.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ScreeningResponse>, ApiError> {
    let screening = state.catalog.get_screening(ScreeningId::new(id)).await?;
    Ok(Json(screening.into()))
}

/// DELETE /screenings/{id}: remove a screening and its seat map.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ScreeningResponse>, ApiError> {
    let removed = state.catalog.delete_screening(ScreeningId::new(id)).await?;
    Ok(Json(removed.into()))
}

/// GET /screenings/{id}/seats: the seat map of a screening.
pub async fn seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Seat>>, ApiError> {
    Ok(Json(state.catalog.seats(ScreeningId::new(id)).await?))
}

/// PUT /screenings/{id}/seats/{row}/{number}: set one availability bit.
#[tracing::instrument(skip(state, req))]
pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    Path((id, row, number)): Path<(u64, String, u32)>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<Seat>, ApiError> {
    let seat = SeatPosition::new(row, number);
    let updated = downstream::call(
        "seat_inventory",
        state.call_timeout,
        state
            .inventory()
            .set_availability(ScreeningId::new(id), &seat, req.available),
    )
    .await?;
    Ok(Json(updated))
}

/// GET /screenings/{id}/tickets: tickets issued for a screening.
pub async fn tickets(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let screening_id = ScreeningId::new(id);
    state.catalog.get_screening(screening_id).await?;
    let tickets = state.ledger().list_by_screening(screening_id).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}
