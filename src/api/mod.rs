//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stopwatches", get(list_handler))
        .route("/stopwatches/:id", get(get_handler))
        .route("/stopwatches/:id/events", get(events_handler))
        .route("/stopwatches/:id/start", post(start_handler))
        .route("/stopwatches/:id/stop", post(stop_handler))
        .route("/stopwatches/:id/lap", post(lap_handler))
        .route("/stopwatches/:id/reset", post(reset_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
