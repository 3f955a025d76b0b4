use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::proxy::ProxyError;

/// Fixed body returned by the API guard.
pub const FORBIDDEN_MESSAGE: &str = "Forbidden - insufficient permissions";

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `403 { success: false, error: "Forbidden - insufficient permissions" }`.
pub fn forbidden() -> Response {
    envelope_error(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE)
}

/// Error in the `{ success, error }` envelope the `/api` surface uses.
pub fn envelope_error(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": error.into(),
        })),
    )
        .into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "backend proxy failure");
        envelope_error(StatusCode::BAD_GATEWAY, "Backend request failed")
    }
}
