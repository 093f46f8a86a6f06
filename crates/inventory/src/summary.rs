//! Dashboard figures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockmaster_core::ProductId;

use crate::document::{MovementDocument, MovementKind};
use crate::product::Product;
use crate::warehouse::Warehouse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub stock: i64,
    pub reorder_level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_products: usize,
    pub total_warehouses: usize,
    pub total_stock: i64,
    pub total_capacity: i64,
    pub low_stock: Vec<LowStockItem>,
    pub out_of_stock: usize,
    pub pending_receipts: usize,
    pub pending_deliveries: usize,
    pub pending_transfers: usize,
    pub stock_by_category: BTreeMap<String, i64>,
}

impl InventorySummary {
    pub fn compute(
        products: &[Product],
        warehouses: &[Warehouse],
        documents: &[MovementDocument],
    ) -> Self {
        let mut stock_by_category = BTreeMap::new();
        for product in products {
            *stock_by_category.entry(product.category().to_string()).or_insert(0) += product.stock();
        }

        let low_stock = products
            .iter()
            .filter(|p| p.is_low_stock())
            .map(|p| LowStockItem {
                product_id: p.id_typed(),
                sku: p.sku().to_string(),
                name: p.name().to_string(),
                stock: p.stock(),
                reorder_level: p.reorder_level(),
            })
            .collect();

        let pending = |kind: MovementKind| {
            documents
                .iter()
                .filter(|d| d.kind() == kind && d.is_pending())
                .count()
        };

        Self {
            total_products: products.len(),
            total_warehouses: warehouses.len(),
            total_stock: products.iter().map(Product::stock).sum(),
            total_capacity: warehouses.iter().map(Warehouse::capacity).sum(),
            low_stock,
            out_of_stock: products.iter().filter(|p| p.is_out_of_stock()).count(),
            pending_receipts: pending(MovementKind::Receipt),
            pending_deliveries: pending(MovementKind::Delivery),
            pending_transfers: pending(MovementKind::Transfer),
            stock_by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockmaster_core::{ActingPrincipal, DocumentId, WarehouseId};

    use crate::document::{DeliveryStatus, DocumentNumber, NewDelivery, NewLine};
    use crate::product::ProductDetails;
    use crate::stock::{StagedInventory, StockAdjuster};
    use crate::warehouse::WarehouseDetails;

    fn product(sku: &str, category: &str, reorder_level: i64) -> Product {
        Product::register(
            ProductId::new(),
            ProductDetails {
                sku: sku.to_string(),
                name: sku.to_string(),
                category: category.to_string(),
                unit: "pcs".to_string(),
                reorder_level,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn low_and_out_of_stock_are_distinct() {
        let warehouse = Warehouse::register(
            WarehouseId::new(),
            WarehouseDetails {
                name: "Main".to_string(),
                address: "1 Dock Road".to_string(),
                capacity: 1000,
            },
            Utc::now(),
        )
        .unwrap();
        let wid = warehouse.id_typed();

        let low = product("LOW", "Hardware", 10);
        let plenty = product("PLENTY", "Hardware", 10);
        let empty = product("EMPTY", "Paint", 10);
        let (low_id, plenty_id) = (low.id_typed(), plenty.id_typed());

        let mut staged = StagedInventory::new();
        staged.insert_warehouse(warehouse);
        staged.insert_product(low);
        staged.insert_product(plenty);
        let adjuster = StockAdjuster::default();
        adjuster.apply(&mut staged, low_id, wid, 4, Utc::now()).unwrap();
        adjuster.apply(&mut staged, plenty_id, wid, 40, Utc::now()).unwrap();

        let products = vec![
            staged.product(&low_id).unwrap().clone(),
            staged.product(&plenty_id).unwrap().clone(),
            empty,
        ];
        let warehouses = vec![staged.warehouse(&wid).unwrap().clone()];

        let delivery = MovementDocument::delivery(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Delivery, 1),
            NewDelivery {
                number: None,
                customer: "Initech".to_string(),
                warehouse_id: wid,
                date: None,
                status: Some(DeliveryStatus::Pending),
                items: vec![NewLine { product_id: plenty_id, quantity: 1 }],
                notes: None,
            },
            ActingPrincipal::new("clerk").unwrap(),
            Utc::now(),
        )
        .unwrap();

        let summary = InventorySummary::compute(&products, &warehouses, &[delivery]);
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_stock, 44);
        assert_eq!(summary.low_stock.len(), 1);
        assert_eq!(summary.low_stock[0].sku, "LOW");
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.pending_deliveries, 1);
        assert_eq!(summary.pending_receipts, 0);
        assert_eq!(summary.stock_by_category["Hardware"], 44);
        assert_eq!(summary.stock_by_category["Paint"], 0);
    }
}
