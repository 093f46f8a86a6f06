use std::time::Instant;

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use stockmaster_core::ActingPrincipal;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Header naming the acting principal recorded on every ledger entry.
pub const PRINCIPAL_HEADER: &str = "x-principal";

pub async fn principal_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let principal = extract_principal(req.headers()).ok_or_else(|| {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            format!("missing or blank {PRINCIPAL_HEADER} header"),
        )
    })?;

    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

/// One structured line per request.
pub async fn request_logging(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    res
}

fn extract_principal(headers: &HeaderMap) -> Option<ActingPrincipal> {
    let header = headers.get(PRINCIPAL_HEADER)?;
    let header = header.to_str().ok()?;
    ActingPrincipal::new(header).ok()
}
