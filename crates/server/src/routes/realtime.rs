//! Realtime session negotiation route.
//!
//! Composes the agent instructions from the catalog prompt plus the
//! requesting client's cart and status, then forwards the negotiation to
//! the third-party API. All locks are released before the outbound call
//! starts; the call itself never writes client state.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::Result;
use crate::services::realtime::{compose_instructions, session_tools};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SessionParams {
    pub client_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    pub model: Option<String>,
    pub voice: Option<String>,
    pub client_id: Option<String>,
}

/// Negotiate a realtime voice session for one client.
#[instrument(skip(state, headers, params, body))]
pub async fn negotiate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SessionParams>,
    body: Option<Json<SessionRequest>>,
) -> Result<Json<Value>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    // Resolution order: header, query parameter, body field.
    let client_id = headers
        .get("x-client-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or(params.client_id)
        .or(body.client_id)
        .unwrap_or_default()
        .trim()
        .to_owned();

    let model = body
        .model
        .unwrap_or_else(|| state.config().realtime_model.clone());
    let voice = body
        .voice
        .unwrap_or_else(|| state.config().realtime_voice.clone());

    // The catalog guard is released before the store lock is taken, so
    // this handler never holds both at once.
    let prompt = state.catalog().read().await.prompt().to_owned();
    let instructions = if client_id.is_empty() {
        prompt
    } else {
        let stores = state.stores().lock().await;
        compose_instructions(
            &prompt,
            stores.carts.get(&client_id),
            stores.status(&client_id),
        )
    };

    let session = state
        .realtime()
        .negotiate(&model, &voice, &instructions, session_tools())
        .await?;

    Ok(Json(session))
}
