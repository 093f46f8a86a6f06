//! Stock adjuster.
//!
//! Applies one signed delta to a product's total stock, its quantity at one
//! warehouse and that warehouse's aggregate, as a single step. Every check
//! runs before the first field is written, so a rejected delta leaves the
//! staged records exactly as they were.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmaster_core::{ProductId, WarehouseId};

use crate::error::MovementError;
use crate::product::Product;
use crate::warehouse::Warehouse;

/// What to do when an inbound delta would overflow a warehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityPolicy {
    /// Reject with [`MovementError::CapacityExceeded`].
    #[default]
    Enforce,
    /// Apply the delta and report a [`CapacityWarning`].
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityWarning {
    pub warehouse_id: WarehouseId,
    pub capacity: i64,
    pub resulting: i64,
}

/// Outcome of one applied delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDelta {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub delta: i64,
    pub product_stock: i64,
    pub location_qty: i64,
    pub warehouse_stock: i64,
    pub warning: Option<CapacityWarning>,
}

/// Working copies of the records a single reconciliation step may touch.
///
/// The engine loads products and warehouses into a staging area, applies
/// every delta here, and only then writes the touched records back in one
/// conditional batch. Dropping the staging area is the rollback.
#[derive(Debug, Default, Clone)]
pub struct StagedInventory {
    products: HashMap<ProductId, Product>,
    warehouses: HashMap<WarehouseId, Warehouse>,
    touched_products: Vec<ProductId>,
    touched_warehouses: Vec<WarehouseId>,
}

impl StagedInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id_typed(), product);
    }

    pub fn insert_warehouse(&mut self, warehouse: Warehouse) {
        self.warehouses.insert(warehouse.id_typed(), warehouse);
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn warehouse(&self, id: &WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(id)
    }

    /// Products changed so far, in first-touch order.
    pub fn touched_products(&self) -> impl Iterator<Item = &Product> {
        self.touched_products.iter().filter_map(|id| self.products.get(id))
    }

    /// Warehouses changed so far, in first-touch order.
    pub fn touched_warehouses(&self) -> impl Iterator<Item = &Warehouse> {
        self.touched_warehouses.iter().filter_map(|id| self.warehouses.get(id))
    }

    fn mark(&mut self, product_id: ProductId, warehouse_id: WarehouseId) {
        if !self.touched_products.contains(&product_id) {
            self.touched_products.push(product_id);
        }
        if !self.touched_warehouses.contains(&warehouse_id) {
            self.touched_warehouses.push(warehouse_id);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StockAdjuster {
    policy: CapacityPolicy,
}

impl StockAdjuster {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn apply(
        &self,
        staged: &mut StagedInventory,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<AppliedDelta, MovementError> {
        if delta == 0 {
            return Err(MovementError::validation("stock delta cannot be zero"));
        }

        let product = staged
            .products
            .get(&product_id)
            .ok_or(MovementError::UnknownProduct(product_id))?;
        let warehouse = staged
            .warehouses
            .get(&warehouse_id)
            .ok_or(MovementError::UnknownWarehouse(warehouse_id))?;

        let location = product.quantity_at(&warehouse_id);
        let overflow = || MovementError::validation("stock quantity overflow");
        let product_stock = product.stock().checked_add(delta).ok_or_else(overflow)?;
        let location_qty = location.checked_add(delta).ok_or_else(overflow)?;
        let warehouse_stock = warehouse
            .current_stock()
            .checked_add(delta)
            .ok_or_else(overflow)?;

        if product_stock < 0 || location_qty < 0 || warehouse_stock < 0 {
            return Err(MovementError::InsufficientStock {
                product_id,
                warehouse_id,
                available: location.min(product.stock()),
                requested: -delta,
            });
        }

        let mut warning = None;
        if delta > 0 && warehouse_stock > warehouse.capacity() {
            match self.policy {
                CapacityPolicy::Enforce => {
                    return Err(MovementError::CapacityExceeded {
                        warehouse_id,
                        capacity: warehouse.capacity(),
                        resulting: warehouse_stock,
                    });
                }
                CapacityPolicy::Warn => {
                    warning = Some(CapacityWarning {
                        warehouse_id,
                        capacity: warehouse.capacity(),
                        resulting: warehouse_stock,
                    });
                }
            }
        }

        if let Some(product) = staged.products.get_mut(&product_id) {
            product.shift(warehouse_id, delta, now);
        }
        if let Some(warehouse) = staged.warehouses.get_mut(&warehouse_id) {
            warehouse.shift(delta, now);
        }
        staged.mark(product_id, warehouse_id);

        Ok(AppliedDelta {
            product_id,
            warehouse_id,
            delta,
            product_stock,
            location_qty,
            warehouse_stock,
            warning,
        })
    }
}
