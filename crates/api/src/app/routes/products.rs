use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockmaster_core::ProductId;
use stockmaster_inventory::ProductDetails;

use super::{no_content, respond};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/ledger", get(product_ledger))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProductDetails>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services.engine().register_product(body, principal.principal()),
    )
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.engine().products() {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.engine().product(id))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(
        StatusCode::OK,
        services.engine().update_product(
            id,
            body.details,
            dto::expected_version(body.expected_version),
            principal.principal(),
        ),
    )
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.engine().delete_product(id, principal.principal()))
}

pub async fn product_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(res) => return res,
    };
    // 404 for unknown products rather than an empty history.
    if let Err(e) = services.engine().product(id) {
        return errors::reconcile_error_to_response(e);
    }
    match services.engine().ledger_for_product(id) {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
