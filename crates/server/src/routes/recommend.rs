//! Recommendation push route.
//!
//! Lets the agent layer highlight items on every connected UI, or reset
//! them. Pure fan-out: no client-keyed state is touched.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub reset: bool,
    #[serde(default)]
    pub names: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
}

/// Broadcast highlighted item names (or a reset) to all UIs.
#[instrument(skip(state, request))]
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Json<RecommendResponse> {
    if request.reset {
        state.hub().emit_all("reset", json!({"ok": true}));
        return Json(RecommendResponse {
            ok: true,
            reset: Some(true),
            names: None,
        });
    }

    let names: Vec<String> = request
        .names
        .iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect();

    state.hub().emit_all("recommend", json!({"names": names}));
    Json(RecommendResponse {
        ok: true,
        reset: None,
        names: Some(names),
    })
}
