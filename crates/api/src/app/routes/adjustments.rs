use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockmaster_core::DocumentId;
use stockmaster_inventory::{MovementKind, NewAdjustment};

use super::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_adjustments).post(create_adjustment))
        .route("/:id", get(get_adjustment))
}

/// Records the count and reconciles it in the same request.
pub async fn create_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewAdjustment>,
) -> axum::response::Response {
    let cancel = services.request_token();
    respond(
        StatusCode::CREATED,
        services
            .engine()
            .create_adjustment(body, principal.principal(), &cancel),
    )
}

pub async fn list_adjustments(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.engine().documents(MovementKind::Adjustment) {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id, "adjustment") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.engine().document(MovementKind::Adjustment, id))
}
