//! Read-only views: ledger queries, consistency audit and dashboard summary.

use tracing::warn;

use stockmaster_core::{LedgerEntryId, ProductId};
use stockmaster_inventory::{ConsistencyReport, DocumentNumber, InventorySummary, LedgerEntry};

use super::{ReconcileError, ReconciliationEngine};
use crate::entity_store::{EntityStore, LedgerFilter};

impl<S> ReconciliationEngine<S>
where
    S: EntityStore,
{
    /// Ledger entries in append order.
    pub fn ledger(&self, filter: &LedgerFilter) -> Result<Vec<LedgerEntry>, ReconcileError> {
        Ok(self.store.ledger(filter)?)
    }

    pub fn ledger_for_product(&self, product_id: ProductId) -> Result<Vec<LedgerEntry>, ReconcileError> {
        self.ledger(&LedgerFilter::Product(product_id))
    }

    pub fn ledger_for_reference(&self, number: &DocumentNumber) -> Result<Vec<LedgerEntry>, ReconcileError> {
        self.ledger(&LedgerFilter::Reference(number.clone()))
    }

    pub fn ledger_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, ReconcileError> {
        self.ledger(&LedgerFilter::All)?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| ReconcileError::NotFound {
                entity: "ledger entry",
                id: id.to_string(),
            })
    }

    /// Recompute every quantity invariant over one consistent snapshot.
    pub fn audit(&self) -> Result<ConsistencyReport, ReconcileError> {
        let snapshot = self.store.snapshot()?;
        let report = ConsistencyReport::check(
            &snapshot.products(),
            &snapshot.warehouses(),
            &snapshot.ledger,
        );
        if !report.is_consistent() {
            warn!(violations = report.violations.len(), "inventory audit found violations");
        }
        Ok(report)
    }

    pub fn summary(&self) -> Result<InventorySummary, ReconcileError> {
        let snapshot = self.store.snapshot()?;
        Ok(InventorySummary::compute(
            &snapshot.products(),
            &snapshot.warehouses(),
            &snapshot.documents(),
        ))
    }
}
