//! Movement documents: receipts, deliveries, transfers and adjustments.
//!
//! A document is a record of intended or completed stock movement. Documents
//! are created in a draft-like status and afterwards only change through the
//! transitions in [`crate::lifecycle`]; the descriptive fields may be edited
//! until stock has moved.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockmaster_core::{ActingPrincipal, DocumentId, Entity, ProductId, WarehouseId};

use crate::error::MovementError;
use crate::lifecycle::Lifecycle;

mod number;
mod status;

pub use number::DocumentNumber;
pub use status::{AdjustmentStatus, DeliveryStatus, DocumentStatus, ReceiptStatus, TransferStatus};

/// Movement type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Receipt,
    Delivery,
    Transfer,
    Adjustment,
}

impl MovementKind {
    pub const ALL: [MovementKind; 4] = [
        MovementKind::Receipt,
        MovementKind::Delivery,
        MovementKind::Transfer,
        MovementKind::Adjustment,
    ];

    /// Document number prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            MovementKind::Receipt => "REC",
            MovementKind::Delivery => "DEL",
            MovementKind::Transfer => "TRF",
            MovementKind::Adjustment => "ADJ",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            MovementKind::Receipt => "Receipt",
            MovementKind::Delivery => "Delivery",
            MovementKind::Transfer => "Transfer",
            MovementKind::Adjustment => "Adjustment",
        })
    }
}

/// One product line of a receipt, delivery or transfer.
///
/// `fulfilled` is the processed sub-quantity: received units for a receipt,
/// dispatched units for a delivery, shipped units for a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default, alias = "received")]
    pub fulfilled: i64,
}

/// Requested line when creating or editing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

fn build_lines(lines: Vec<NewLine>) -> Result<Vec<LineItem>, MovementError> {
    if lines.is_empty() {
        return Err(MovementError::validation("document must have at least one line item"));
    }
    let mut seen = BTreeSet::new();
    lines
        .into_iter()
        .map(|line| {
            if line.quantity <= 0 {
                return Err(MovementError::validation(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                )));
            }
            if !seen.insert(line.product_id) {
                return Err(MovementError::validation(format!(
                    "product {} appears on more than one line",
                    line.product_id
                )));
            }
            Ok(LineItem {
                product_id: line.product_id,
                quantity: line.quantity,
                fulfilled: 0,
            })
        })
        .collect()
}

fn required(field: &str, value: String) -> Result<String, MovementError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MovementError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn initial_status<S: Lifecycle>(requested: Option<S>, default: S) -> Result<S, MovementError> {
    let status = requested.unwrap_or(default);
    if !status.can_create_in() {
        return Err(MovementError::validation(format!(
            "a {} cannot be created in status {status}",
            S::KIND
        )));
    }
    Ok(status)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub supplier: String,
    pub warehouse_id: WarehouseId,
    pub status: ReceiptStatus,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub customer: String,
    pub warehouse_id: WarehouseId,
    pub status: DeliveryStatus,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_warehouse: WarehouseId,
    pub to_warehouse: WarehouseId,
    pub reason: String,
    pub status: TransferStatus,
    pub items: Vec<LineItem>,
}

/// Physical count correction. `difference = counted_qty - system_qty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub system_qty: i64,
    pub counted_qty: i64,
    pub difference: i64,
    pub reason: String,
    pub status: AdjustmentStatus,
}

/// Type-specific part of a movement document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentBody {
    Receipt(Receipt),
    Delivery(Delivery),
    Transfer(Transfer),
    Adjustment(Adjustment),
}

/// Input: create a receipt (goods arriving from a supplier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReceipt {
    #[serde(default)]
    pub number: Option<String>,
    pub supplier: String,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ReceiptStatus>,
    pub items: Vec<NewLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input: create a delivery (goods leaving for a customer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDelivery {
    #[serde(default)]
    pub number: Option<String>,
    pub customer: String,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
    pub items: Vec<NewLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input: create an inter-warehouse transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransfer {
    #[serde(default)]
    pub number: Option<String>,
    pub from_warehouse: WarehouseId,
    pub to_warehouse: WarehouseId,
    pub reason: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<TransferStatus>,
    pub items: Vec<NewLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input: record a physical count.
///
/// When `system_qty` is omitted the current quantity at the location is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdjustment {
    #[serde(default)]
    pub number: Option<String>,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub system_qty: Option<i64>,
    pub counted_qty: i64,
    pub reason: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Descriptive edit of a document that has not moved stock yet.
///
/// `counterparty` is the supplier of a receipt, the customer of a delivery or
/// the reason of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEdit {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<NewLine>>,
}

/// A movement document: shared header plus a type-specific body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDocument {
    id: DocumentId,
    number: DocumentNumber,
    date: NaiveDate,
    notes: Option<String>,
    created_by: ActingPrincipal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    body: DocumentBody,
}

impl MovementDocument {
    fn with_body(
        id: DocumentId,
        number: DocumentNumber,
        date: Option<NaiveDate>,
        notes: Option<String>,
        created_by: ActingPrincipal,
        now: DateTime<Utc>,
        body: DocumentBody,
    ) -> Self {
        Self {
            id,
            number,
            date: date.unwrap_or_else(|| now.date_naive()),
            notes,
            created_by,
            created_at: now,
            updated_at: now,
            body,
        }
    }

    pub fn receipt(
        id: DocumentId,
        number: DocumentNumber,
        input: NewReceipt,
        created_by: ActingPrincipal,
        now: DateTime<Utc>,
    ) -> Result<Self, MovementError> {
        let body = DocumentBody::Receipt(Receipt {
            supplier: required("supplier", input.supplier)?,
            warehouse_id: input.warehouse_id,
            status: initial_status(input.status, ReceiptStatus::Draft)?,
            items: build_lines(input.items)?,
        });
        Ok(Self::with_body(id, number, input.date, input.notes, created_by, now, body))
    }

    pub fn delivery(
        id: DocumentId,
        number: DocumentNumber,
        input: NewDelivery,
        created_by: ActingPrincipal,
        now: DateTime<Utc>,
    ) -> Result<Self, MovementError> {
        let body = DocumentBody::Delivery(Delivery {
            customer: required("customer", input.customer)?,
            warehouse_id: input.warehouse_id,
            status: initial_status(input.status, DeliveryStatus::Draft)?,
            items: build_lines(input.items)?,
        });
        Ok(Self::with_body(id, number, input.date, input.notes, created_by, now, body))
    }

    pub fn transfer(
        id: DocumentId,
        number: DocumentNumber,
        input: NewTransfer,
        created_by: ActingPrincipal,
        now: DateTime<Utc>,
    ) -> Result<Self, MovementError> {
        if input.from_warehouse == input.to_warehouse {
            return Err(MovementError::validation(
                "transfer source and destination must differ",
            ));
        }
        let body = DocumentBody::Transfer(Transfer {
            from_warehouse: input.from_warehouse,
            to_warehouse: input.to_warehouse,
            reason: required("reason", input.reason)?,
            status: initial_status(input.status, TransferStatus::Draft)?,
            items: build_lines(input.items)?,
        });
        Ok(Self::with_body(id, number, input.date, input.notes, created_by, now, body))
    }

    /// Adjustments are only built by [`crate::lifecycle::plan_adjustment`],
    /// which pairs the document with its stock move.
    pub(crate) fn adjustment(
        id: DocumentId,
        number: DocumentNumber,
        input: NewAdjustment,
        system_qty: i64,
        performed_by: ActingPrincipal,
        now: DateTime<Utc>,
    ) -> Result<Self, MovementError> {
        if system_qty < 0 {
            return Err(MovementError::validation("system quantity cannot be negative"));
        }
        if input.counted_qty < 0 {
            return Err(MovementError::validation("counted quantity cannot be negative"));
        }
        let body = DocumentBody::Adjustment(Adjustment {
            product_id: input.product_id,
            warehouse_id: input.warehouse_id,
            system_qty,
            counted_qty: input.counted_qty,
            difference: input.counted_qty - system_qty,
            reason: required("reason", input.reason)?,
            status: AdjustmentStatus::Recorded,
        });
        Ok(Self::with_body(id, number, input.date, input.notes, performed_by, now, body))
    }

    pub fn id_typed(&self) -> DocumentId {
        self.id
    }

    pub fn number(&self) -> &DocumentNumber {
        &self.number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_by(&self) -> &ActingPrincipal {
        &self.created_by
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn body(&self) -> &DocumentBody {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut DocumentBody {
        &mut self.body
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn kind(&self) -> MovementKind {
        match &self.body {
            DocumentBody::Receipt(_) => MovementKind::Receipt,
            DocumentBody::Delivery(_) => MovementKind::Delivery,
            DocumentBody::Transfer(_) => MovementKind::Transfer,
            DocumentBody::Adjustment(_) => MovementKind::Adjustment,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        match &self.body {
            DocumentBody::Receipt(r) => DocumentStatus::Receipt(r.status),
            DocumentBody::Delivery(d) => DocumentStatus::Delivery(d.status),
            DocumentBody::Transfer(t) => DocumentStatus::Transfer(t.status),
            DocumentBody::Adjustment(a) => DocumentStatus::Adjustment(a.status),
        }
    }

    /// Line items (empty for adjustments, which carry a single product).
    pub fn items(&self) -> &[LineItem] {
        match &self.body {
            DocumentBody::Receipt(r) => &r.items,
            DocumentBody::Delivery(d) => &d.items,
            DocumentBody::Transfer(t) => &t.items,
            DocumentBody::Adjustment(_) => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        match &self.body {
            DocumentBody::Receipt(r) => r.status.is_terminal(),
            DocumentBody::Delivery(d) => d.status.is_terminal(),
            DocumentBody::Transfer(t) => t.status.is_terminal(),
            DocumentBody::Adjustment(a) => a.status.is_terminal(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status(),
            DocumentStatus::Receipt(ReceiptStatus::Pending)
                | DocumentStatus::Delivery(DeliveryStatus::Pending)
                | DocumentStatus::Transfer(TransferStatus::Pending)
        )
    }

    /// Whether this document has caused a committed stock movement.
    pub fn has_moved_stock(&self) -> bool {
        match &self.body {
            DocumentBody::Receipt(r) => r.items.iter().any(|l| l.fulfilled > 0),
            DocumentBody::Delivery(d) => matches!(
                d.status,
                DeliveryStatus::Dispatched | DeliveryStatus::Delivered
            ),
            DocumentBody::Transfer(t) => matches!(
                t.status,
                TransferStatus::InTransit | TransferStatus::Completed
            ),
            DocumentBody::Adjustment(_) => true,
        }
    }

    /// Descriptive fields may change only while nothing has moved.
    pub fn is_editable(&self) -> bool {
        !self.has_moved_stock()
            && matches!(
                self.status(),
                DocumentStatus::Receipt(ReceiptStatus::Draft | ReceiptStatus::Pending)
                    | DocumentStatus::Delivery(DeliveryStatus::Draft | DeliveryStatus::Pending)
                    | DocumentStatus::Transfer(TransferStatus::Draft | TransferStatus::Pending)
            )
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        match &self.body {
            DocumentBody::Adjustment(a) => vec![a.product_id],
            _ => self.items().iter().map(|l| l.product_id).collect(),
        }
    }

    pub fn warehouse_ids(&self) -> Vec<WarehouseId> {
        match &self.body {
            DocumentBody::Receipt(r) => vec![r.warehouse_id],
            DocumentBody::Delivery(d) => vec![d.warehouse_id],
            DocumentBody::Transfer(t) => vec![t.from_warehouse, t.to_warehouse],
            DocumentBody::Adjustment(a) => vec![a.warehouse_id],
        }
    }

    pub fn references_product(&self, product_id: &ProductId) -> bool {
        self.product_ids().contains(product_id)
    }

    pub fn references_warehouse(&self, warehouse_id: &WarehouseId) -> bool {
        self.warehouse_ids().contains(warehouse_id)
    }

    /// Apply a descriptive edit. Quantities already processed are untouched
    /// because editable documents have none.
    pub fn apply_edit(&mut self, edit: DocumentEdit, now: DateTime<Utc>) -> Result<(), MovementError> {
        if !self.is_editable() {
            return Err(MovementError::validation(format!(
                "{} {} can no longer be edited (status {})",
                self.kind(),
                self.number,
                self.status()
            )));
        }

        let items = edit.items.map(build_lines).transpose()?;
        let counterparty = edit
            .counterparty
            .map(|c| required("counterparty", c))
            .transpose()?;

        match &mut self.body {
            DocumentBody::Receipt(r) => {
                if let Some(c) = counterparty {
                    r.supplier = c;
                }
                if let Some(items) = items {
                    r.items = items;
                }
            }
            DocumentBody::Delivery(d) => {
                if let Some(c) = counterparty {
                    d.customer = c;
                }
                if let Some(items) = items {
                    d.items = items;
                }
            }
            DocumentBody::Transfer(t) => {
                if let Some(c) = counterparty {
                    t.reason = c;
                }
                if let Some(items) = items {
                    t.items = items;
                }
            }
            DocumentBody::Adjustment(_) => {}
        }

        if let Some(date) = edit.date {
            self.date = date;
        }
        if edit.notes.is_some() {
            self.notes = edit.notes;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for MovementDocument {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
