//! Stock ledger.
//!
//! The ledger is append-only: entries are drafted by [`LedgerWriter`] in
//! line-item order, stamped with a store-wide sequence number when the batch
//! commits, and never changed afterwards. Summing an entry stream reproduces
//! product and location quantities.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmaster_core::{ActingPrincipal, DocumentId, Entity, LedgerEntryId, ProductId, WarehouseId};

use crate::document::{DocumentNumber, MovementDocument, MovementKind};
use crate::lifecycle::PlannedMove;
use crate::stock::StagedInventory;

/// Where goods came from or went to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Warehouse(WarehouseId),
    Supplier(String),
    Customer(String),
    Transit,
    Adjustment,
}

impl Endpoint {
    /// Human-readable label; warehouses resolve to their name when staged.
    pub fn label(&self, staged: &StagedInventory) -> String {
        match self {
            Endpoint::Warehouse(id) => staged
                .warehouse(id)
                .map(|w| w.name().to_string())
                .unwrap_or_else(|| id.to_string()),
            Endpoint::Supplier(name) | Endpoint::Customer(name) => name.clone(),
            Endpoint::Transit => "In Transit".to_string(),
            Endpoint::Adjustment => "Inventory Adjustment".to_string(),
        }
    }
}

/// A ledger entry that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDraft {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    /// Signed: positive is inbound to `warehouse_id`, negative is outbound.
    pub quantity: i64,
    pub movement: MovementKind,
    pub from: String,
    pub to: String,
    pub document_id: DocumentId,
    pub reference: DocumentNumber,
    pub performed_by: ActingPrincipal,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    /// Store-wide, strictly increasing append order.
    pub sequence: u64,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub movement: MovementKind,
    pub from: String,
    pub to: String,
    pub document_id: DocumentId,
    pub reference: DocumentNumber,
    pub performed_by: ActingPrincipal,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn commit(draft: LedgerDraft, id: LedgerEntryId, sequence: u64) -> Self {
        Self {
            id,
            sequence,
            product_id: draft.product_id,
            warehouse_id: draft.warehouse_id,
            quantity: draft.quantity,
            movement: draft.movement,
            from: draft.from,
            to: draft.to,
            document_id: draft.document_id,
            reference: draft.reference,
            performed_by: draft.performed_by,
            recorded_at: draft.recorded_at,
        }
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Drafts one ledger entry per applied move of a single document.
#[derive(Debug)]
pub struct LedgerWriter {
    document_id: DocumentId,
    reference: DocumentNumber,
    movement: MovementKind,
    performed_by: ActingPrincipal,
    recorded_at: DateTime<Utc>,
    drafts: Vec<LedgerDraft>,
}

impl LedgerWriter {
    pub fn new(document: &MovementDocument, performed_by: ActingPrincipal, now: DateTime<Utc>) -> Self {
        Self {
            document_id: document.id_typed(),
            reference: document.number().clone(),
            movement: document.kind(),
            performed_by,
            recorded_at: now,
            drafts: Vec::new(),
        }
    }

    pub fn append(&mut self, staged: &StagedInventory, planned: &PlannedMove) {
        self.drafts.push(LedgerDraft {
            product_id: planned.product_id,
            warehouse_id: planned.warehouse_id,
            quantity: planned.delta,
            movement: self.movement,
            from: planned.from.label(staged),
            to: planned.to.label(staged),
            document_id: self.document_id,
            reference: self.reference.clone(),
            performed_by: self.performed_by.clone(),
            recorded_at: self.recorded_at,
        });
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn finish(self) -> Vec<LedgerDraft> {
        self.drafts
    }
}

/// Net quantity per product.
pub fn replay_stock<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> BTreeMap<ProductId, i64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.product_id).or_insert(0) += entry.quantity;
    }
    totals
}

/// Net quantity per (product, warehouse) location.
pub fn replay_locations<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> BTreeMap<(ProductId, WarehouseId), i64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry((entry.product_id, entry.warehouse_id)).or_insert(0) += entry.quantity;
    }
    totals
}
