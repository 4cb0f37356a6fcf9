//! HTTP API server with observability for the seat reservation system.
//!
//! Provides REST endpoints for the screening catalog, seat maps, ticket
//! reservation and the payment saga, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Catalog
        .route("/cinemas", get(routes::catalog::cinemas))
        .route("/halls", get(routes::catalog::halls))
        .route("/halls/cinema/{id}", get(routes::catalog::halls_for_cinema))
        // Screenings and seats
        .route(
            "/screenings",
            get(routes::screenings::list).post(routes::screenings::create),
        )
        .route("/screenings/batch", post(routes::screenings::create_batch))
        .route(
            "/screenings/{id}",
            get(routes::screenings::get).delete(routes::screenings::delete),
        )
        .route("/screenings/{id}/seats", get(routes::screenings::seats))
        .route(
            "/screenings/{id}/seats/{row}/{number}",
            put(routes::screenings::set_availability),
        )
        .route("/screenings/{id}/tickets", get(routes::screenings::tickets))
        // Tickets
        .route("/tickets", get(routes::tickets::list))
        .route("/tickets/reserve", post(routes::tickets::reserve))
        .route("/tickets/{id}", get(routes::tickets::get))
        .route("/tickets/{id}/confirm", post(routes::tickets::confirm))
        .route("/tickets/{id}/cancel", post(routes::tickets::cancel))
        // Payment saga
        .route("/payments", post(routes::payments::pay))
        .route("/payments/bulk", post(routes::payments::pay_bulk))
        .route("/payments/refund", post(routes::payments::refund))
        .route("/notifications", get(routes::notifications::list))
        // Monitoring
        .route(
            "/monitoring/user-actions",
            get(routes::monitoring::user_actions).delete(routes::monitoring::clear_user_actions),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
