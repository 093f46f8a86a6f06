use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockmaster_core::{LedgerEntryId, ProductId};
use stockmaster_infra::entity_store::LedgerFilter;
use stockmaster_inventory::{DocumentNumber, MovementKind};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

use super::respond;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_ledger))
        .route("/:id", get(get_ledger_entry))
}

pub async fn list_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LedgerQuery>,
) -> axum::response::Response {
    let filter = match (query.reference, query.product_id) {
        (Some(_), Some(_)) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "filter by reference or product_id, not both",
            );
        }
        (Some(reference), None) => match parse_reference(&reference) {
            Some(number) => LedgerFilter::Reference(number),
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("'{reference}' is not a document number"),
                );
            }
        },
        (None, Some(product_id)) => match errors::parse_id::<ProductId>(&product_id, "product") {
            Ok(id) => LedgerFilter::Product(id),
            Err(res) => return res,
        },
        (None, None) => LedgerFilter::All,
    };

    match services.engine().ledger(&filter) {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_ledger_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LedgerEntryId = match errors::parse_id(&id, "ledger entry") {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(StatusCode::OK, services.engine().ledger_entry(id))
}

/// The number's prefix tells which movement type it belongs to.
fn parse_reference(raw: &str) -> Option<DocumentNumber> {
    MovementKind::ALL
        .into_iter()
        .find_map(|kind| DocumentNumber::parse(kind, raw).ok())
}
