use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockmaster_core::WarehouseId;
use stockmaster_inventory::WarehouseDetails;

use super::{no_content, respond};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route("/:id", get(get_warehouse).put(update_warehouse).delete(delete_warehouse))
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<WarehouseDetails>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services.engine().register_warehouse(body, principal.principal()),
    )
}

pub async fn list_warehouses(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.engine().warehouses() {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.engine().warehouse(id))
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateWarehouseRequest>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(
        StatusCode::OK,
        services.engine().update_warehouse(
            id,
            body.details,
            dto::expected_version(body.expected_version),
            principal.principal(),
        ),
    )
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.engine().delete_warehouse(id, principal.principal()))
}
