//! Unified error handling with Sentry integration.
//!
//! Every mutation endpoint answers with a structured body: `ok=false`
//! plus an `error` discriminator and, where it helps the caller
//! resynchronize, the current authoritative state. Server-side failures
//! are captured to Sentry before responding.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use mesa_core::flow::TransitionError;

use crate::services::realtime::RealtimeError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request parameter was absent or blank.
    #[error("missing {0}")]
    MissingParam(&'static str),

    /// The order status state machine refused the transition.
    #[error("transition rejected: {0}")]
    Transition(#[from] TransitionError),

    /// Realtime session negotiation failed.
    #[error("realtime negotiation failed: {0}")]
    Realtime(#[from] RealtimeError),

    /// Persisting the menu catalog failed.
    #[error("menu persistence failed: {0}")]
    MenuStore(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if matches!(
            self,
            Self::MenuStore(_) | Self::Realtime(RealtimeError::Request(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = match &self {
            Self::MissingParam(param) => (
                StatusCode::BAD_REQUEST,
                json!({"ok": false, "error": format!("missing {param}")}),
            ),
            Self::Transition(err) => transition_response(err),
            Self::Realtime(err) => realtime_response(err),
            Self::MenuStore(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"ok": false, "error": "menu_store"}),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn transition_response(err: &TransitionError) -> (StatusCode, serde_json::Value) {
    match err {
        TransitionError::Conflict {
            current,
            requested_from,
        } => (
            StatusCode::CONFLICT,
            json!({
                "ok": false,
                "error": "state_conflict",
                "current": current,
                "requested_from": requested_from,
            }),
        ),
        TransitionError::CartNotEmpty { current } => (
            StatusCode::BAD_REQUEST,
            json!({"ok": false, "error": "cart_not_empty", "current": current}),
        ),
        TransitionError::CartEmpty { current } => (
            StatusCode::BAD_REQUEST,
            json!({"ok": false, "error": "cart_empty", "current": current}),
        ),
        TransitionError::InvalidTransition { current } => (
            StatusCode::CONFLICT,
            json!({"ok": false, "error": "invalid_transition", "current": current}),
        ),
        TransitionError::UnknownTarget { to } => (
            StatusCode::BAD_REQUEST,
            json!({"ok": false, "error": "unknown_target", "to": to}),
        ),
    }
}

fn realtime_response(err: &RealtimeError) -> (StatusCode, serde_json::Value) {
    match err {
        // Forward the upstream status so the caller sees what the
        // third-party answered.
        RealtimeError::Upstream { status, body } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            json!({"error": format!("{status}: {body}")}),
        ),
        RealtimeError::Request(e) => (
            StatusCode::BAD_GATEWAY,
            json!({"error": format!("Realtime request failed: {e}")}),
        ),
        RealtimeError::MissingApiKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "OPENAI_API_KEY is not configured"}),
        ),
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesa_core::OrderStatus;

    fn get_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(ApiError::MissingParam("client_id")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::Transition(TransitionError::Conflict {
                current: OrderStatus::CartFilled,
                requested_from: 2,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ApiError::Transition(TransitionError::CartEmpty {
                current: OrderStatus::CartEmpty,
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::Transition(TransitionError::InvalidTransition {
                current: OrderStatus::CheckoutOpen,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ApiError::Transition(TransitionError::UnknownTarget { to: 9 })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::Realtime(RealtimeError::MissingApiKey)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ApiError::Realtime(RealtimeError::Upstream {
                status: 401,
                body: "unauthorized".to_string(),
            })),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::MissingParam("client_id");
        assert_eq!(err.to_string(), "missing client_id");
    }
}
