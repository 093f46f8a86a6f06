//! Movement document authoring: create, edit and delete documents before
//! they move stock.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{info, instrument};

use stockmaster_core::{ActingPrincipal, DocumentId, ExpectedVersion};
use stockmaster_inventory::{
    DocumentEdit, MovementDocument, MovementError, MovementKind, NewDelivery, NewReceipt,
    NewTransfer,
};

use super::{ReconcileError, ReconciliationEngine};
use crate::entity_store::{EntityKey, EntityKind, EntityStore, Versioned, WriteOp, Record};

impl<S> ReconciliationEngine<S>
where
    S: EntityStore,
{
    pub fn document(
        &self,
        kind: MovementKind,
        id: DocumentId,
    ) -> Result<Versioned<MovementDocument>, ReconcileError> {
        self.load_document(kind, id)
    }

    /// Documents of one type in creation order.
    pub fn documents(&self, kind: MovementKind) -> Result<Vec<Versioned<MovementDocument>>, ReconcileError> {
        Ok(self
            .store
            .list(EntityKind::for_movement(kind))?
            .into_iter()
            .filter_map(|r| Some(Versioned::new(r.value.into_document()?, r.version)))
            .collect())
    }

    #[instrument(skip(self, input, principal), fields(warehouse_id = %input.warehouse_id, principal = %principal))]
    pub fn create_receipt(
        &self,
        input: NewReceipt,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<MovementDocument>, ReconcileError> {
        let requested = input.number.clone();
        self.allocate_number(MovementKind::Receipt, requested.as_deref(), |number| {
            let doc = MovementDocument::receipt(
                DocumentId::new(),
                number,
                input.clone(),
                principal.clone(),
                Utc::now(),
            )?;
            self.insert_document(doc)
        })
    }

    #[instrument(skip(self, input, principal), fields(warehouse_id = %input.warehouse_id, principal = %principal))]
    pub fn create_delivery(
        &self,
        input: NewDelivery,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<MovementDocument>, ReconcileError> {
        let requested = input.number.clone();
        self.allocate_number(MovementKind::Delivery, requested.as_deref(), |number| {
            let doc = MovementDocument::delivery(
                DocumentId::new(),
                number,
                input.clone(),
                principal.clone(),
                Utc::now(),
            )?;
            self.insert_document(doc)
        })
    }

    #[instrument(skip(self, input, principal), fields(from = %input.from_warehouse, to = %input.to_warehouse, principal = %principal))]
    pub fn create_transfer(
        &self,
        input: NewTransfer,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<MovementDocument>, ReconcileError> {
        let requested = input.number.clone();
        self.allocate_number(MovementKind::Transfer, requested.as_deref(), |number| {
            let doc = MovementDocument::transfer(
                DocumentId::new(),
                number,
                input.clone(),
                principal.clone(),
                Utc::now(),
            )?;
            self.insert_document(doc)
        })
    }

    /// Edit parties, date, notes or lines of a document that has not moved
    /// stock yet.
    #[instrument(skip(self, edit, principal), fields(principal = %principal))]
    pub fn update_document(
        &self,
        kind: MovementKind,
        id: DocumentId,
        edit: DocumentEdit,
        expected: ExpectedVersion,
        principal: &ActingPrincipal,
    ) -> Result<Versioned<MovementDocument>, ReconcileError> {
        let current = self.load_document(kind, id)?;
        expected.check(current.version)?;

        let mut doc = current.value;
        doc.apply_edit(edit, Utc::now())?;

        let key = EntityKey::document(kind, id);
        let mut ops = vec![WriteOp::put(
            Record::Document(doc.clone()),
            ExpectedVersion::Exact(current.version),
        )];
        ops.extend(self.reference_touches(&doc)?);
        let receipt = self.store.conditional_write_batch(ops)?;

        info!(document = %doc.number(), "document updated");
        Ok(Versioned::new(doc, receipt.version_of(&key).unwrap_or(current.version + 1)))
    }

    /// Delete a document that never caused a committed stock movement.
    #[instrument(skip(self, principal), fields(principal = %principal))]
    pub fn delete_document(
        &self,
        kind: MovementKind,
        id: DocumentId,
        principal: &ActingPrincipal,
    ) -> Result<(), ReconcileError> {
        let current = self.load_document(kind, id)?;
        if current.value.has_moved_stock() {
            return Err(ReconcileError::validation(format!(
                "{} {} has moved stock and cannot be deleted",
                kind,
                current.value.number()
            )));
        }

        self.store.conditional_write_batch(vec![WriteOp::Delete {
            key: EntityKey::document(kind, id),
            expected: ExpectedVersion::Exact(current.version),
        }])?;
        info!(document = %current.value.number(), "document deleted");
        Ok(())
    }

    fn insert_document(&self, doc: MovementDocument) -> Result<Versioned<MovementDocument>, ReconcileError> {
        let key = EntityKey::document(doc.kind(), doc.id_typed());
        let mut ops = vec![WriteOp::insert(Record::Document(doc.clone()))];
        ops.extend(self.reference_touches(&doc)?);
        let receipt = self.store.conditional_write_batch(ops)?;

        info!(document = %doc.number(), status = %doc.status(), "document created");
        Ok(Versioned::new(doc, receipt.version_of(&key).unwrap_or(1)))
    }

    /// Rewrites of every product and warehouse the document names. Each
    /// rewrite bumps the record's version, so a delete that validated
    /// against the older version fails instead of orphaning the document.
    fn reference_touches(&self, doc: &MovementDocument) -> Result<Vec<WriteOp>, ReconcileError> {
        let mut touches = Vec::new();
        for product_id in doc.product_ids().into_iter().collect::<BTreeSet<_>>() {
            let product = self
                .find_product(product_id)?
                .ok_or(MovementError::UnknownProduct(product_id))?;
            touches.push(WriteOp::put(
                Record::Product(product.value),
                ExpectedVersion::Exact(product.version),
            ));
        }
        for warehouse_id in doc.warehouse_ids().into_iter().collect::<BTreeSet<_>>() {
            let warehouse = self
                .find_warehouse(warehouse_id)?
                .ok_or(MovementError::UnknownWarehouse(warehouse_id))?;
            touches.push(WriteOp::put(
                Record::Warehouse(warehouse.value),
                ExpectedVersion::Exact(warehouse.version),
            ));
        }
        Ok(touches)
    }
}
