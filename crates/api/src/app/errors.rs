use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockmaster_infra::ReconcileError;

pub fn reconcile_error_to_response(err: ReconcileError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        ReconcileError::DocumentNotFound { .. } | ReconcileError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", message)
        }
        ReconcileError::InvalidTransition { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transition", message)
        }
        ReconcileError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        ReconcileError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", message)
        }
        ReconcileError::CapacityExceeded { .. } => {
            json_error(StatusCode::CONFLICT, "capacity_exceeded", message)
        }
        ReconcileError::ConcurrentModification(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        ReconcileError::Duplicate { .. } => json_error(StatusCode::CONFLICT, "duplicate", message),
        ReconcileError::Cancelled => json_error(StatusCode::SERVICE_UNAVAILABLE, "cancelled", message),
        ReconcileError::Store(_) => {
            tracing::error!(error = %message, "entity store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path id, answering 400 `invalid_id` on failure.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
