//! Cinema and hall catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::CinemaId;
use domain::{Cinema, HallTemplate};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /cinemas: list cinemas.
pub async fn cinemas(State(state): State<Arc<AppState>>) -> Json<Vec<Cinema>> {
    Json(state.catalog.cinemas().to_vec())
}

/// GET /halls: list every hall template.
pub async fn halls(State(state): State<Arc<AppState>>) -> Json<Vec<HallTemplate>> {
    Json(state.catalog.halls().to_vec())
}

/// GET /halls/cinema/{id}: list the halls of one cinema.
pub async fn halls_for_cinema(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Vec<HallTemplate>>, ApiError> {
    let cinema_id = CinemaId::new(id);
    if !state.catalog.cinemas().iter().any(|c| c.id == cinema_id) {
        return Err(ApiError::NotFound(format!("Cinema not found: {id}")));
    }
    Ok(Json(state.catalog.halls_for_cinema(cinema_id)))
}
