use serde::{Deserialize, Serialize};

use stockmaster_core::ExpectedVersion;
use stockmaster_inventory::{DocumentEdit, ProductDetails, ReceivedQuantity, WarehouseDetails};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `PUT /products/:id`; `expected_version` enables optimistic locking.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(flatten)]
    pub details: ProductDetails,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseRequest {
    #[serde(flatten)]
    pub details: WarehouseDetails,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(flatten)]
    pub edit: DocumentEdit,
    pub expected_version: Option<u64>,
}

/// Body of `POST /{receipts,deliveries,transfers}/:id/transition`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequestBody {
    pub status: String,
    #[serde(default)]
    pub received: Vec<ReceivedQuantity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub reference: Option<String>,
    pub product_id: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn expected_version(version: Option<u64>) -> ExpectedVersion {
    version.map_or(ExpectedVersion::Any, ExpectedVersion::Exact)
}

pub fn items_to_json<T: Serialize>(items: Vec<T>) -> serde_json::Value {
    serde_json::json!({ "items": items })
}
