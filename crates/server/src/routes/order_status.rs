//! Order status route handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use mesa_core::flow;
use mesa_core::status::OrderStatus;

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShowParams {
    #[serde(default)]
    pub client_id: String,
}

#[derive(Debug, Serialize)]
pub struct ShowResponse {
    pub ok: bool,
    pub status: OrderStatus,
}

/// Current status for one client (derived 0/1 if never touched).
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Query(params): Query<ShowParams>,
) -> Result<Json<ShowResponse>> {
    let client_id = params.client_id.trim().to_owned();
    if client_id.is_empty() {
        return Err(ApiError::MissingParam("client_id"));
    }

    let stores = state.stores().lock().await;
    Ok(Json(ShowResponse {
        ok: true,
        status: stores.status(&client_id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub client_id: String,
    /// Requested target status; validated by the state machine, not serde.
    pub to: Option<i64>,
    /// Optimistic guard: the status the caller believes is current.
    pub from: Option<i64>,
    /// Partial checkout form data to merge before deciding 3 vs 4.
    pub prefill: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub ok: bool,
    pub status: OrderStatus,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_prefill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<BTreeMap<String, String>>,
}

/// Request a status transition, optionally guarded by `from` and carrying
/// a prefill patch for the checkout branch.
#[instrument(skip(state, request), fields(client_id = %request.client_id, to = ?request.to))]
pub async fn transition(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>> {
    let client_id = request.client_id.trim().to_owned();
    if client_id.is_empty() {
        return Err(ApiError::MissingParam("client_id"));
    }
    let to = request.to.ok_or(ApiError::MissingParam("'to' state"))?;

    let outcome = {
        let mut stores = state.stores().lock().await;
        flow::transition(
            &mut stores,
            &client_id,
            to,
            request.from,
            request.prefill.as_ref(),
        )?
    };

    if outcome.changed {
        let mut data = json!({"client_id": client_id, "status": outcome.status});
        if let Some(prefill) = &outcome.prefill {
            data["prefill"] = json!(prefill);
        }
        if let Some(missing) = outcome.missing.as_ref().filter(|m| !m.is_empty()) {
            data["missing"] = json!(missing);
        }
        state.hub().emit_to(&client_id, "order_status", data);
        tracing::info!(
            client_id = %client_id,
            status = %outcome.status,
            "order status transitioned"
        );
    }

    Ok(Json(TransitionResponse {
        ok: true,
        status: outcome.status,
        changed: outcome.changed,
        applied_prefill: outcome.applied_prefill,
        missing: outcome.missing,
        prefill: outcome.prefill,
    }))
}
