//! Receipts, deliveries and transfers share one handler set; the movement
//! kind travels as a router extension.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, MethodRouter},
    Json, Router,
};

use stockmaster_core::DocumentId;
use stockmaster_inventory::{
    DocumentStatus, MovementKind, NewDelivery, NewReceipt, NewTransfer, TransitionRequest,
};

use super::{no_content, respond};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router(kind: MovementKind, create: MethodRouter) -> Router {
    Router::new()
        .route("/", create.get(list_documents))
        .route("/:id", get(get_document).put(update_document).delete(delete_document))
        .route("/:id/transition", post(transition_document))
        .layer(Extension(kind))
}

pub async fn create_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewReceipt>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services.engine().create_receipt(body, principal.principal()),
    )
}

pub async fn create_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewDelivery>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services.engine().create_delivery(body, principal.principal()),
    )
}

pub async fn create_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewTransfer>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services.engine().create_transfer(body, principal.principal()),
    )
}

pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<MovementKind>,
) -> axum::response::Response {
    match services.engine().documents(kind) {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<MovementKind>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id, "document") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.engine().document(kind, id))
}

pub async fn update_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<MovementKind>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateDocumentRequest>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id, "document") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(
        StatusCode::OK,
        services.engine().update_document(
            kind,
            id,
            body.edit,
            dto::expected_version(body.expected_version),
            principal.principal(),
        ),
    )
}

pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<MovementKind>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id, "document") {
        Ok(v) => v,
        Err(res) => return res,
    };
    no_content(services.engine().delete_document(kind, id, principal.principal()))
}

pub async fn transition_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<MovementKind>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequestBody>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id, "document") {
        Ok(v) => v,
        Err(res) => return res,
    };
    let status = match DocumentStatus::parse(kind, &body.status) {
        Ok(s) => s,
        Err(e) => return errors::reconcile_error_to_response(e.into()),
    };
    let request = TransitionRequest::to(status).with_received(body.received);

    let cancel = services.request_token();
    respond(
        StatusCode::OK,
        services.engine().transition_with_retry(
            id,
            request,
            principal.principal(),
            &cancel,
            services.max_retries(),
        ),
    )
}
