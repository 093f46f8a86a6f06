use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use super::respond;
use crate::app::services::AppServices;

pub async fn dashboard(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond(StatusCode::OK, services.engine().summary())
}

/// Full consistency check; 200 with the report even when violations exist.
pub async fn audit(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond(StatusCode::OK, services.engine().audit())
}
