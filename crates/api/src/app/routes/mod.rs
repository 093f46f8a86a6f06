use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use stockmaster_infra::ReconcileError;
use stockmaster_inventory::MovementKind;

use crate::app::errors;

pub mod adjustments;
pub mod ledger;
pub mod movements;
pub mod products;
pub mod reports;
pub mod system;
pub mod warehouses;

/// Router for all endpoints that act on behalf of a principal.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/warehouses", warehouses::router())
        .nest(
            "/receipts",
            movements::router(MovementKind::Receipt, post(movements::create_receipt)),
        )
        .nest(
            "/deliveries",
            movements::router(MovementKind::Delivery, post(movements::create_delivery)),
        )
        .nest(
            "/transfers",
            movements::router(MovementKind::Transfer, post(movements::create_transfer)),
        )
        .nest("/adjustments", adjustments::router())
        .nest("/ledger", ledger::router())
        .route("/dashboard", get(reports::dashboard))
        .route("/audit", get(reports::audit))
}

/// Serialize `result` with `status`, or map the engine error.
pub(crate) fn respond<T: Serialize>(status: StatusCode, result: Result<T, ReconcileError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub(crate) fn no_content(result: Result<(), ReconcileError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
