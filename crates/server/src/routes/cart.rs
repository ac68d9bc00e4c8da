//! Cart route handlers.
//!
//! `POST /api/cart` is the single write path into a client's cart: it
//! applies the op batch, broadcasts the new cart, then runs the explicit
//! status reconciliation step so statuses 0/1/2 always reflect the cart
//! they were computed against.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use mesa_core::cart::{self, CartLine, CartOp};
use mesa_core::flow;
use mesa_core::status::OrderStatus;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StateParams {
    #[serde(default)]
    pub client_id: String,
}

#[derive(Debug, Serialize)]
pub struct CartStateResponse {
    pub ok: bool,
    pub cart: Vec<CartLine>,
    pub client_id: String,
    pub total: f64,
    pub order_status: OrderStatus,
}

/// Ground-truth cart read; never served from a broadcast cache.
#[instrument(skip(state))]
pub async fn state(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> Json<CartStateResponse> {
    let client_id = params.client_id.trim().to_owned();
    let stores = state.stores().lock().await;
    let cart = stores.carts.get(&client_id).to_vec();
    let total = cart::total(&cart);
    let order_status = stores.status(&client_id);

    Json(CartStateResponse {
        ok: true,
        cart,
        client_id,
        total,
        order_status,
    })
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub ops: Vec<CartOp>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub ok: bool,
    pub applied: usize,
    pub cart: Vec<CartLine>,
    pub client_id: String,
}

/// Apply an ordered op batch to the client's cart.
#[instrument(skip(state, request), fields(client_id = %request.client_id, ops = request.ops.len()))]
pub async fn apply(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> Json<ApplyResponse> {
    let client_id = request.client_id.trim().to_owned();

    let mut stores = state.stores().lock().await;
    let new_cart = {
        let catalog = state.catalog().read().await;
        cart::apply(stores.carts.get(&client_id), &request.ops, &catalog)
    };
    stores.carts.put(&client_id, new_cart.clone());

    // An anonymous mutation (blank client id) fans out to every socket.
    state.hub().emit_to(
        &client_id,
        "cart_update",
        json!({"client_id": client_id, "ops": request.ops, "cart": new_cart}),
    );

    if let Some(change) = flow::reconcile_cart_status(&mut stores, &client_id) {
        if change.changed {
            state.hub().emit_to(
                &client_id,
                "order_status",
                json!({"client_id": client_id, "status": change.next}),
            );
            tracing::info!(
                client_id = %client_id,
                prev = %change.prev,
                next = %change.next,
                "order status reconciled after cart mutation"
            );
        }
    }

    Json(ApplyResponse {
        ok: true,
        applied: request.ops.len(),
        cart: new_cart,
        client_id,
    })
}
