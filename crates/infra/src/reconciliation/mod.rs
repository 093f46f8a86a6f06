//! Stock-movement reconciliation engine.
//!
//! The engine is the only code path that changes product stock, location
//! quantities, warehouse totals or the ledger. Every mutating operation runs
//! the same pipeline:
//!
//! ```text
//! request
//!   ↓
//! 1. Load the document (and its version) from the entity store
//!   ↓
//! 2. Plan: validate the status edge and compute per-line deltas (pure)
//!   ↓
//! 3. Stage: load touched products/warehouses, apply deltas to copies,
//!    draft one ledger entry per applied delta
//!   ↓
//! 4. Commit: one conditional batch conditioned on every loaded version
//! ```
//!
//! Nothing is written before step 4, so a failure at any earlier step, or a
//! cancellation between line items, leaves the store untouched. A version
//! mismatch at step 4 surfaces as [`ReconcileError::ConcurrentModification`];
//! retrying re-runs the pipeline from step 1 against fresh state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use stockmaster_core::{
    ActingPrincipal, DocumentId, ExpectedVersion, ProductId, WarehouseId,
};
use stockmaster_inventory::{
    CapacityPolicy, CapacityWarning, DocumentNumber, LedgerEntry, LedgerWriter, MovementDocument,
    MovementError, MovementKind, NewAdjustment, PlannedMove, Product, StagedInventory,
    StockAdjuster, TransitionPlan, TransitionRequest, Warehouse, plan_adjustment, plan_transition,
};

use crate::entity_store::{EntityKey, EntityKind, EntityStore, Record, Versioned, WriteOp};

mod documents;
mod error;
mod master_data;
mod reports;

pub use error::ReconcileError;

/// How many times a generated document number is re-allocated after losing
/// a race for the same number.
const NUMBER_ALLOCATION_ATTEMPTS: u32 = 3;

/// Result of a stock-affecting operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub document: Versioned<MovementDocument>,
    /// Ledger entries committed by this operation, in line-item order.
    pub ledger: Vec<LedgerEntry>,
    /// Capacity overruns accepted under [`CapacityPolicy::Warn`].
    pub warnings: Vec<CapacityWarning>,
}

/// Orchestrates the movement state machine, the stock adjuster and the
/// ledger writer against an [`EntityStore`].
///
/// ## Concurrency
///
/// The engine holds no locks and no state besides its configuration; it is
/// shared by reference across request handlers. Each record carries a
/// version, and every batch the engine writes is conditioned on the versions
/// it read. Two transitions of the same document therefore serialize on the
/// document's own version, and two documents touching the same product
/// serialize on the product's version.
///
/// ## Cancellation
///
/// Stock-affecting operations take a [`CancellationToken`], checked before
/// each line item and once more before the commit. A cancelled operation
/// returns [`ReconcileError::Cancelled`] without writing anything.
#[derive(Debug)]
pub struct ReconciliationEngine<S> {
    store: S,
    adjuster: StockAdjuster,
}

impl<S> ReconciliationEngine<S> {
    pub fn new(store: S, policy: CapacityPolicy) -> Self {
        Self {
            store,
            adjuster: StockAdjuster::new(policy),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn capacity_policy(&self) -> CapacityPolicy {
        self.adjuster.policy()
    }
}

/// Versions read while staging, keyed by record.
type ReadVersions = HashMap<EntityKey, u64>;

impl<S> ReconciliationEngine<S>
where
    S: EntityStore,
{
    /// Move a document to the requested status, applying the stock effect of
    /// that edge.
    #[instrument(skip(self, request, principal, cancel), fields(kind = %request.status.kind(), to = %request.status, principal = %principal))]
    pub fn transition(
        &self,
        id: DocumentId,
        request: TransitionRequest,
        principal: &ActingPrincipal,
        cancel: &CancellationToken,
    ) -> Result<TransitionOutcome, ReconcileError> {
        if cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        let current = self.load_document(request.status.kind(), id)?;
        let now = Utc::now();
        let plan = plan_transition(&current.value, &request, now)?;
        let from = current.value.status();

        let outcome = self.commit_plan(plan, ExpectedVersion::Exact(current.version), principal, cancel, now)?;

        info!(
            document = %outcome.document.value.number(),
            from = %from,
            to = %outcome.document.value.status(),
            ledger_entries = outcome.ledger.len(),
            "document transitioned"
        );
        Ok(outcome)
    }

    /// [`transition`](Self::transition), retried up to `max_retries` extra
    /// times on [`ReconcileError::ConcurrentModification`].
    ///
    /// Each attempt re-reads the document, so a retry after another caller
    /// already performed the same edge fails with `InvalidTransition` instead
    /// of applying stock twice.
    pub fn transition_with_retry(
        &self,
        id: DocumentId,
        request: TransitionRequest,
        principal: &ActingPrincipal,
        cancel: &CancellationToken,
        max_retries: u32,
    ) -> Result<TransitionOutcome, ReconcileError> {
        let mut attempt = 0;
        loop {
            match self.transition(id, request.clone(), principal, cancel) {
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    warn!(document_id = %id, attempt, error = %err, "retrying transition");
                }
                other => return other,
            }
        }
    }

    /// Record a physical count and reconcile it immediately.
    #[instrument(skip(self, input, principal, cancel), fields(product_id = %input.product_id, warehouse_id = %input.warehouse_id, principal = %principal))]
    pub fn create_adjustment(
        &self,
        input: NewAdjustment,
        principal: &ActingPrincipal,
        cancel: &CancellationToken,
    ) -> Result<TransitionOutcome, ReconcileError> {
        if cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        let requested = input.number.clone();
        let outcome = self.allocate_number(MovementKind::Adjustment, requested.as_deref(), |number| {
            let product = self
                .find_product(input.product_id)?
                .ok_or(MovementError::UnknownProduct(input.product_id))?;
            if self.find_warehouse(input.warehouse_id)?.is_none() {
                return Err(MovementError::UnknownWarehouse(input.warehouse_id).into());
            }
            let location_qty = product.value.quantity_at(&input.warehouse_id);

            let now = Utc::now();
            let plan = plan_adjustment(
                DocumentId::new(),
                number,
                input.clone(),
                location_qty,
                principal.clone(),
                now,
            )?;
            self.commit_plan(plan, ExpectedVersion::ABSENT, principal, cancel, now)
        })?;

        info!(
            document = %outcome.document.value.number(),
            ledger_entries = outcome.ledger.len(),
            "adjustment recorded"
        );
        Ok(outcome)
    }

    /// Stage and apply every planned move, then write the document, touched
    /// records and ledger entries as one conditional batch.
    fn commit_plan(
        &self,
        plan: TransitionPlan,
        document_expected: ExpectedVersion,
        principal: &ActingPrincipal,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, ReconcileError> {
        let TransitionPlan { document, moves } = plan;

        let mut staged = StagedInventory::new();
        let mut versions = ReadVersions::new();
        let mut writer = LedgerWriter::new(&document, principal.clone(), now);
        let mut warnings = Vec::new();

        for planned in &moves {
            if cancel.is_cancelled() {
                debug!(line = planned.line_no, "cancelled before line item");
                return Err(ReconcileError::Cancelled);
            }
            self.stage(&mut staged, &mut versions, planned)?;

            let applied = self.adjuster.apply(
                &mut staged,
                planned.product_id,
                planned.warehouse_id,
                planned.delta,
                now,
            )?;
            if let Some(warning) = applied.warning {
                warn!(
                    warehouse_id = %warning.warehouse_id,
                    capacity = warning.capacity,
                    resulting = warning.resulting,
                    "warehouse capacity exceeded"
                );
                warnings.push(warning);
            }
            writer.append(&staged, planned);
            debug!(
                line = planned.line_no,
                product_id = %planned.product_id,
                warehouse_id = %planned.warehouse_id,
                delta = planned.delta,
                "staged stock delta"
            );
        }

        if cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        let document_key = EntityKey::document(document.kind(), document.id_typed());
        let mut ops = vec![WriteOp::put(Record::Document(document.clone()), document_expected)];
        for product in staged.touched_products() {
            let key = EntityKey::product(product.id_typed());
            ops.push(WriteOp::put(Record::Product(product.clone()), expected(&versions, &key)));
        }
        for warehouse in staged.touched_warehouses() {
            let key = EntityKey::warehouse(warehouse.id_typed());
            ops.push(WriteOp::put(Record::Warehouse(warehouse.clone()), expected(&versions, &key)));
        }
        ops.extend(writer.finish().into_iter().map(WriteOp::AppendLedger));

        let receipt = self.store.conditional_write_batch(ops)?;
        let version = receipt
            .version_of(&document_key)
            .ok_or_else(|| ReconcileError::Store("commit did not report the document version".to_string()))?;

        Ok(TransitionOutcome {
            document: Versioned::new(document, version),
            ledger: receipt.ledger,
            warnings,
        })
    }

    /// Load the product and warehouse of a move into the staging area once.
    fn stage(
        &self,
        staged: &mut StagedInventory,
        versions: &mut ReadVersions,
        planned: &PlannedMove,
    ) -> Result<(), ReconcileError> {
        if staged.product(&planned.product_id).is_none() {
            let product = self
                .find_product(planned.product_id)?
                .ok_or(MovementError::UnknownProduct(planned.product_id))?;
            versions.insert(EntityKey::product(planned.product_id), product.version);
            staged.insert_product(product.value);
        }
        if staged.warehouse(&planned.warehouse_id).is_none() {
            let warehouse = self
                .find_warehouse(planned.warehouse_id)?
                .ok_or(MovementError::UnknownWarehouse(planned.warehouse_id))?;
            versions.insert(EntityKey::warehouse(planned.warehouse_id), warehouse.version);
            staged.insert_warehouse(warehouse.value);
        }
        Ok(())
    }

    /// Run `insert` with a caller-supplied or freshly generated number.
    ///
    /// Generated numbers are re-allocated when another writer claimed the
    /// same number first.
    fn allocate_number<T>(
        &self,
        kind: MovementKind,
        requested: Option<&str>,
        mut insert: impl FnMut(DocumentNumber) -> Result<T, ReconcileError>,
    ) -> Result<T, ReconcileError> {
        if let Some(raw) = requested {
            return insert(DocumentNumber::parse(kind, raw)?);
        }

        let mut attempt = 1;
        loop {
            let number = self.next_number(kind)?;
            match insert(number) {
                Err(ReconcileError::Duplicate { value, .. }) if attempt < NUMBER_ALLOCATION_ATTEMPTS => {
                    debug!(%kind, number = %value, attempt, "document number taken, reallocating");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn next_number(&self, kind: MovementKind) -> Result<DocumentNumber, ReconcileError> {
        let documents = self.documents(kind)?;
        Ok(DocumentNumber::next_after(
            kind,
            documents.iter().map(|d| d.value.number()),
        )?)
    }

    fn find_product(&self, id: ProductId) -> Result<Option<Versioned<Product>>, ReconcileError> {
        Ok(self
            .store
            .get(&EntityKey::product(id))?
            .and_then(|r| Some(Versioned::new(r.value.into_product()?, r.version))))
    }

    fn find_warehouse(&self, id: WarehouseId) -> Result<Option<Versioned<Warehouse>>, ReconcileError> {
        Ok(self
            .store
            .get(&EntityKey::warehouse(id))?
            .and_then(|r| Some(Versioned::new(r.value.into_warehouse()?, r.version))))
    }

    fn load_product(&self, id: ProductId) -> Result<Versioned<Product>, ReconcileError> {
        self.find_product(id)?.ok_or_else(|| ReconcileError::NotFound {
            entity: EntityKind::Product.as_str(),
            id: id.to_string(),
        })
    }

    fn load_warehouse(&self, id: WarehouseId) -> Result<Versioned<Warehouse>, ReconcileError> {
        self.find_warehouse(id)?.ok_or_else(|| ReconcileError::NotFound {
            entity: EntityKind::Warehouse.as_str(),
            id: id.to_string(),
        })
    }

    fn load_document(
        &self,
        kind: MovementKind,
        id: DocumentId,
    ) -> Result<Versioned<MovementDocument>, ReconcileError> {
        self.store
            .get(&EntityKey::document(kind, id))?
            .and_then(|r| Some(Versioned::new(r.value.into_document()?, r.version)))
            .ok_or(ReconcileError::DocumentNotFound { kind, id })
    }
}

fn expected(versions: &ReadVersions, key: &EntityKey) -> ExpectedVersion {
    ExpectedVersion::Exact(versions.get(key).copied().unwrap_or_default())
}
