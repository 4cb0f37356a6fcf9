//! Delivered notification listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use saga::DeliveredNotification;

use crate::state::AppState;

/// GET /notifications: notifications rendered by the in-process sink.
///
/// Empty when notifications go to an external service.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<DeliveredNotification>> {
    match &state.notifications {
        Some(sink) => Json(sink.delivered().await),
        None => Json(Vec::new()),
    }
}
