//! Menu catalog route handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use mesa_core::catalog::MenuItem;

use crate::error::Result;
use crate::menu_file;
use crate::state::AppState;

/// Current catalog snapshot.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<Vec<MenuItem>> {
    Json(state.catalog().read().await.items().to_vec())
}

#[derive(Debug, Serialize)]
pub struct ReplaceResponse {
    pub ok: bool,
    pub count: usize,
}

/// Replace the catalog wholesale: normalize, persist to disk, rebuild
/// the agent prompt.
#[instrument(skip(state, raw), fields(items = raw.len()))]
pub async fn replace(
    State(state): State<AppState>,
    Json(raw): Json<Vec<Value>>,
) -> Result<Json<ReplaceResponse>> {
    // The write guard is held across the save so concurrent replaces
    // cannot leave the file holding a snapshot the served catalog has
    // already moved past.
    let mut catalog = state.catalog().write().await;
    catalog.replace(&raw);
    let snapshot = catalog.items().to_vec();
    menu_file::save(&state.config().menu_path, &snapshot).await?;
    drop(catalog);

    tracing::info!(count = snapshot.len(), "menu catalog replaced");

    Ok(Json(ReplaceResponse {
        ok: true,
        count: snapshot.len(),
    }))
}
