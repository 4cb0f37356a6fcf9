//! User action journal endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use domain::UserAction;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct UserActionsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct UserActionsResponse {
    pub total: usize,
    pub actions: Vec<UserAction>,
}

/// GET /monitoring/user-actions?limit=: newest journal entries, oldest first.
pub async fn user_actions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserActionsQuery>,
) -> Json<UserActionsResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Json(UserActionsResponse {
        total: state.actions.len().await,
        actions: state.actions.recent(limit).await,
    })
}

/// DELETE /monitoring/user-actions: clear the journal.
pub async fn clear_user_actions(State(state): State<Arc<AppState>>) -> StatusCode {
    state.actions.clear().await;
    tracing::info!("user action journal cleared");
    StatusCode::NO_CONTENT
}
