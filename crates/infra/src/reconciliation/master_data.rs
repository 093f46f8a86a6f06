//! Product and warehouse registration.
//!
//! These operations only touch descriptive fields; quantities start at zero
//! and are afterwards moved exclusively by reconciliation.

use chrono::Utc;
use tracing::{info, instrument};

use stockmaster_core::{ActingPrincipal, ExpectedVersion, ProductId, WarehouseId};
use stockmaster_inventory::{
    MovementDocument, MovementKind, Product, ProductDetails, Warehouse, WarehouseDetails,
};

use super::{ReconcileError, ReconciliationEngine};
use crate::entity_store::{EntityKey, EntityKind, EntityStore, Record, Versioned, WriteOp};

impl<S> ReconciliationEngine<S>
where
    S: EntityStore,
{
    pub fn product(&self, id: ProductId) -> Result<Versioned<Product>, ReconcileError> {
        self.load_product(id)
    }

    pub fn products(&self) -> Result<Vec<Versioned<Product>>, ReconcileError> {
        Ok(self
            .store
            .list(EntityKind::Product)?
            .into_iter()
            .filter_map(|r| Some(Versioned::new(r.value.into_product()?, r.version)))
            .collect())
    }

    #[instrument(skip(self, details, principal), fields(sku = %details.sku, principal = %principal))]
    pub fn register_product(
        &self,
        details: ProductDetails,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<Product>, ReconcileError> {
        let product = Product::register(ProductId::new(), details, Utc::now())?;
        let key = EntityKey::product(product.id_typed());
        let receipt = self
            .store
            .conditional_write_batch(vec![WriteOp::insert(Record::Product(product.clone()))])?;

        info!(product_id = %product.id_typed(), "product registered");
        Ok(Versioned::new(product, receipt.version_of(&key).unwrap_or(1)))
    }

    #[instrument(skip(self, details, principal), fields(principal = %principal))]
    pub fn update_product(
        &self,
        id: ProductId,
        details: ProductDetails,
        expected: ExpectedVersion,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<Product>, ReconcileError> {
        let current = self.load_product(id)?;
        expected.check(current.version)?;

        let mut product = current.value;
        product.apply_details(details, Utc::now())?;
        let key = EntityKey::product(id);
        let receipt = self.store.conditional_write_batch(vec![WriteOp::put(
            Record::Product(product.clone()),
            ExpectedVersion::Exact(current.version),
        )])?;

        info!(product_id = %id, "product updated");
        Ok(Versioned::new(product, receipt.version_of(&key).unwrap_or(current.version + 1)))
    }

    /// Remove a product that holds no stock and no open document names.
    #[instrument(skip(self, principal), fields(principal = %principal))]
    pub fn delete_product(&self, id: ProductId, principal: &ActingPrincipal) -> Result<(), ReconcileError> {
        let current = self.load_product(id)?;
        if current.value.stock() != 0 {
            return Err(ReconcileError::validation(format!(
                "product {} still holds {} units",
                current.value.sku(),
                current.value.stock()
            )));
        }
        if let Some(number) = self.open_document_referencing(|d| d.references_product(&id))? {
            return Err(ReconcileError::validation(format!(
                "product {} is referenced by open document {number}",
                current.value.sku()
            )));
        }

        self.store.conditional_write_batch(vec![WriteOp::Delete {
            key: EntityKey::product(id),
            expected: ExpectedVersion::Exact(current.version),
        }])?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub fn warehouse(&self, id: WarehouseId) -> Result<Versioned<Warehouse>, ReconcileError> {
        self.load_warehouse(id)
    }

    pub fn warehouses(&self) -> Result<Vec<Versioned<Warehouse>>, ReconcileError> {
        Ok(self
            .store
            .list(EntityKind::Warehouse)?
            .into_iter()
            .filter_map(|r| Some(Versioned::new(r.value.into_warehouse()?, r.version)))
            .collect())
    }

    #[instrument(skip(self, details, principal), fields(name = %details.name, principal = %principal))]
    pub fn register_warehouse(
        &self,
        details: WarehouseDetails,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<Warehouse>, ReconcileError> {
        let warehouse = Warehouse::register(WarehouseId::new(), details, Utc::now())?;
        let key = EntityKey::warehouse(warehouse.id_typed());
        let receipt = self
            .store
            .conditional_write_batch(vec![WriteOp::insert(Record::Warehouse(warehouse.clone()))])?;

        info!(warehouse_id = %warehouse.id_typed(), "warehouse registered");
        Ok(Versioned::new(warehouse, receipt.version_of(&key).unwrap_or(1)))
    }

    #[instrument(skip(self, details, principal), fields(principal = %principal))]
    pub fn update_warehouse(
        &self,
        id: WarehouseId,
        details: WarehouseDetails,
        expected: ExpectedVersion,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<Warehouse>, ReconcileError> {
        let current = self.load_warehouse(id)?;
        expected.check(current.version)?;

        let mut warehouse = current.value;
        warehouse.apply_details(details, self.capacity_policy(), Utc::now())?;
        let key = EntityKey::warehouse(id);
        let receipt = self.store.conditional_write_batch(vec![WriteOp::put(
            Record::Warehouse(warehouse.clone()),
            ExpectedVersion::Exact(current.version),
        )])?;

        info!(warehouse_id = %id, "warehouse updated");
        Ok(Versioned::new(warehouse, receipt.version_of(&key).unwrap_or(current.version + 1)))
    }

    #[instrument(skip(self, principal), fields(principal = %principal))]
    pub fn delete_warehouse(&self, id: WarehouseId, principal: &ActingPrincipal) -> Result<(), ReconcileError> {
        let current = self.load_warehouse(id)?;
        if current.value.current_stock() != 0 {
            return Err(ReconcileError::validation(format!(
                "warehouse {} still holds {} units",
                current.value.name(),
                current.value.current_stock()
            )));
        }
        if let Some(number) = self.open_document_referencing(|d| d.references_warehouse(&id))? {
            return Err(ReconcileError::validation(format!(
                "warehouse {} is referenced by open document {number}",
                current.value.name()
            )));
        }

        self.store.conditional_write_batch(vec![WriteOp::Delete {
            key: EntityKey::warehouse(id),
            expected: ExpectedVersion::Exact(current.version),
        }])?;
        info!(warehouse_id = %id, "warehouse deleted");
        Ok(())
    }

    /// Number of the first non-terminal document matching `predicate`.
    fn open_document_referencing(
        &self,
        predicate: impl Fn(&MovementDocument) -> bool,
    ) -> Result<Option<String>, ReconcileError> {
        for kind in MovementKind::ALL {
            if let Some(doc) = self
                .documents(kind)?
                .into_iter()
                .find(|d| !d.value.is_terminal() && predicate(&d.value))
            {
                return Ok(Some(doc.value.number().to_string()));
            }
        }
        Ok(None)
    }
}
