//! Mesa server library.
//!
//! This crate provides the server functionality as a library, allowing
//! it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod broadcast;
pub mod config;
pub mod error;
pub mod menu_file;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router around a prepared state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
