//! Inventory domain module: products, warehouses, movement documents and the
//! stock ledger.
//!
//! This crate contains the business rules of stock reconciliation, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - [`lifecycle`]: per-document status lifecycles and the stock moves each
//!   transition implies.
//! - [`stock`]: the stock adjuster, applying one signed delta to a product,
//!   its location and its warehouse as a single all-or-nothing step.
//! - [`ledger`]: immutable ledger entries, the writer that drafts them and
//!   replay helpers.
//! - [`audit`] and [`summary`]: consistency checks and dashboard figures.

pub mod audit;
pub mod document;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod product;
pub mod stock;
pub mod summary;
pub mod warehouse;

pub use audit::{ConsistencyReport, Violation};
pub use document::{
    Adjustment, AdjustmentStatus, Delivery, DeliveryStatus, DocumentBody, DocumentEdit,
    DocumentNumber, DocumentStatus, LineItem, MovementDocument, MovementKind, NewAdjustment,
    NewDelivery, NewLine, NewReceipt, NewTransfer, Receipt, ReceiptStatus, Transfer,
    TransferStatus,
};
pub use error::MovementError;
pub use ledger::{Endpoint, LedgerDraft, LedgerEntry, LedgerWriter, replay_locations, replay_stock};
pub use lifecycle::{
    Lifecycle, PlannedMove, ReceivedQuantity, TransitionPlan, TransitionRequest, ensure_transition,
    plan_adjustment, plan_transition,
};
pub use product::{Product, ProductDetails};
pub use stock::{AppliedDelta, CapacityPolicy, CapacityWarning, StagedInventory, StockAdjuster};
pub use summary::{InventorySummary, LowStockItem};
pub use warehouse::{Warehouse, WarehouseDetails};
