//! HTTP API application wiring (Axum router + engine wiring).
//!
//! - `services.rs`: the reconciliation engine and per-request cancellation
//! - `routes/`: HTTP routes + handlers (one file per resource family)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;

use stockmaster_infra::config::ReconciliationConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `shutdown` is the process-wide token; every mutating request runs under a
/// child of it.
pub fn build_app(settings: &ReconciliationConfig, shutdown: CancellationToken) -> Router {
    let services = Arc::new(services::AppServices::in_memory(settings, shutdown));

    // Everything but /health needs an acting principal.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::principal_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_logging)))
}
