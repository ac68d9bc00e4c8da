//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//!
//! # Menu catalog
//! GET  /api/menu                      - Current catalog snapshot
//! POST /api/menu                      - Replace catalog (persists, rebuilds prompt)
//!
//! # Cart
//! GET  /api/cart/state                - Cart + total + order status for a client
//! POST /api/cart                      - Apply an ordered op batch
//!
//! # Order flow
//! GET  /api/order_status              - Current status for a client
//! POST /api/order_status/transition   - Request a status transition
//!
//! # Agent surface
//! POST /api/recommend                 - Push highlighted items (or a reset) to UIs
//! POST /api/realtime/session          - Negotiate a realtime voice session
//!
//! # Push channel
//! GET  /ws                            - WebSocket registration per client id
//! ```

pub mod cart;
pub mod menu;
pub mod order_status;
pub mod realtime;
pub mod recommend;
pub mod ws;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/menu", get(menu::show).post(menu::replace))
        .route("/api/recommend", post(recommend::recommend))
        .route("/api/cart/state", get(cart::state))
        .route("/api/cart", post(cart::apply))
        .route("/api/order_status", get(order_status::show))
        .route("/api/order_status/transition", post(order_status::transition))
        .route("/api/realtime/session", post(realtime::negotiate))
        .route("/ws", get(ws::upgrade))
}
