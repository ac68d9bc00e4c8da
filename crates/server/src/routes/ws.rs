//! WebSocket push channel.
//!
//! Each UI opens `/ws?client_id=...` and receives the push events that
//! target it (or everyone). Registration materializes the client's
//! derived order status so the first broadcast comparison has a baseline.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::instrument;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub client_id: String,
}

/// Upgrade to a WebSocket subscription.
#[instrument(skip(state, ws))]
pub async fn upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let client_id = params.client_id.trim().to_owned();
    ws.on_upgrade(move |socket| handle(state, client_id, socket))
}

async fn handle(state: AppState, client_id: String, mut socket: WebSocket) {
    if !client_id.is_empty() {
        let mut stores = state.stores().lock().await;
        if stores.statuses.get(&client_id).is_none() {
            let derived = stores.status(&client_id);
            stores.statuses.put(&client_id, derived);
        }
        tracing::info!(
            client_id = %client_id,
            status = %stores.status(&client_id),
            "socket registered"
        );
    }

    let mut rx = state.hub().subscribe();
    loop {
        tokio::select! {
            envelope = rx.recv() => {
                match envelope {
                    Ok(env) => {
                        let mine = env.target.as_deref().is_none_or(|t| t == client_id);
                        if mine
                            && socket
                                .send(Message::Text(env.frame().into()))
                                .await
                                .is_err()
                        {
                            break;
                        }
                    }
                    // Dropped frames only stale the mirror; the next
                    // /api read returns ground truth.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(client_id = %client_id, skipped, "socket lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            message = socket.recv() => {
                // Inbound frames are ignored; the socket is push-only.
                match message {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    tracing::debug!(client_id = %client_id, "socket closed");
}
