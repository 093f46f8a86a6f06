use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmaster_core::{Entity, ProductId, WarehouseId};

use crate::error::MovementError;

/// Descriptive product fields (everything except quantities).
///
/// Used both to register a product and to replace its description later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub reorder_level: i64,
}

impl ProductDetails {
    fn validate(&self) -> Result<(), MovementError> {
        if self.sku.trim().is_empty() {
            return Err(MovementError::validation("sku cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(MovementError::validation("name cannot be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(MovementError::validation("category cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(MovementError::validation("unit cannot be empty"));
        }
        if self.reorder_level < 0 {
            return Err(MovementError::validation("reorder level cannot be negative"));
        }
        Ok(())
    }
}

/// A stocked product.
///
/// `stock` is derived: it always equals the sum of `locations`. Quantities
/// are only changed through [`crate::stock::StockAdjuster`]; descriptive edits
/// go through [`Product::apply_details`] and never touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    category: String,
    unit: String,
    reorder_level: i64,
    stock: i64,
    locations: BTreeMap<WarehouseId, i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Register a new product with no stock anywhere.
    pub fn register(
        id: ProductId,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, MovementError> {
        details.validate()?;
        Ok(Self {
            id,
            sku: details.sku.trim().to_string(),
            name: details.name.trim().to_string(),
            category: details.category.trim().to_string(),
            unit: details.unit.trim().to_string(),
            reorder_level: details.reorder_level,
            stock: 0,
            locations: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the descriptive fields. Quantities are left untouched.
    pub fn apply_details(
        &mut self,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> Result<(), MovementError> {
        details.validate()?;
        self.sku = details.sku.trim().to_string();
        self.name = details.name.trim().to_string();
        self.category = details.category.trim().to_string();
        self.unit = details.unit.trim().to_string();
        self.reorder_level = details.reorder_level;
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn reorder_level(&self) -> i64 {
        self.reorder_level
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn locations(&self) -> &BTreeMap<WarehouseId, i64> {
        &self.locations
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Quantity held at one warehouse (0 when the product was never there).
    pub fn quantity_at(&self, warehouse_id: &WarehouseId) -> i64 {
        self.locations.get(warehouse_id).copied().unwrap_or(0)
    }

    pub fn location_total(&self) -> i64 {
        self.locations.values().sum()
    }

    /// `stock == sum(locations)` and nothing is negative.
    pub fn is_consistent(&self) -> bool {
        self.stock >= 0
            && self.locations.values().all(|q| *q >= 0)
            && self.stock == self.location_total()
    }

    /// Low stock as shown on the dashboard: still in stock, at or under the
    /// reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= self.reorder_level
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Unchecked quantity shift; the adjuster validates before calling this.
    pub(crate) fn shift(&mut self, warehouse_id: WarehouseId, delta: i64, now: DateTime<Utc>) {
        self.stock += delta;
        let qty = self.locations.entry(warehouse_id).or_insert(0);
        *qty += delta;
        if *qty == 0 {
            self.locations.remove(&warehouse_id);
        }
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(sku: &str) -> ProductDetails {
        ProductDetails {
            sku: sku.to_string(),
            name: "Steel bolt M8".to_string(),
            category: "Hardware".to_string(),
            unit: "pcs".to_string(),
            reorder_level: 10,
        }
    }

    #[test]
    fn registered_product_starts_empty_and_consistent() {
        let p = Product::register(ProductId::new(), details("BOLT-M8"), Utc::now()).unwrap();
        assert_eq!(p.stock(), 0);
        assert!(p.locations().is_empty());
        assert!(p.is_consistent());
        assert!(p.is_out_of_stock());
        assert!(!p.is_low_stock());
    }

    #[test]
    fn blank_sku_is_rejected() {
        let err = Product::register(ProductId::new(), details("  "), Utc::now()).unwrap_err();
        assert!(matches!(err, MovementError::Validation(_)));
    }

    #[test]
    fn negative_reorder_level_is_rejected() {
        let mut d = details("BOLT-M8");
        d.reorder_level = -1;
        assert!(Product::register(ProductId::new(), d, Utc::now()).is_err());
    }

    #[test]
    fn apply_details_leaves_quantities_alone() {
        let wh = WarehouseId::new();
        let mut p = Product::register(ProductId::new(), details("BOLT-M8"), Utc::now()).unwrap();
        p.shift(wh, 7, Utc::now());

        let mut d = details("BOLT-M8-ZN");
        d.name = "Zinc bolt M8".to_string();
        p.apply_details(d, Utc::now()).unwrap();

        assert_eq!(p.sku(), "BOLT-M8-ZN");
        assert_eq!(p.stock(), 7);
        assert_eq!(p.quantity_at(&wh), 7);
    }

    #[test]
    fn shift_to_zero_drops_the_location() {
        let wh = WarehouseId::new();
        let mut p = Product::register(ProductId::new(), details("BOLT-M8"), Utc::now()).unwrap();
        p.shift(wh, 5, Utc::now());
        p.shift(wh, -5, Utc::now());
        assert!(p.locations().is_empty());
        assert!(p.is_consistent());
    }

    #[test]
    fn low_stock_is_inclusive_of_the_threshold() {
        let wh = WarehouseId::new();
        let mut p = Product::register(ProductId::new(), details("BOLT-M8"), Utc::now()).unwrap();
        p.shift(wh, 10, Utc::now());
        assert!(p.is_low_stock());
        p.shift(wh, 1, Utc::now());
        assert!(!p.is_low_stock());
    }
}
