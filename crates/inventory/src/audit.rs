//! Consistency audit over a snapshot of products, warehouses and the ledger.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use stockmaster_core::{ProductId, WarehouseId};

use crate::ledger::{replay_locations, replay_stock, LedgerEntry};
use crate::product::Product;
use crate::warehouse::Warehouse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// `stock` differs from the sum of the product's locations.
    ProductStockMismatch {
        product_id: ProductId,
        stock: i64,
        location_total: i64,
    },
    NegativeQuantity {
        product_id: ProductId,
        warehouse_id: Option<WarehouseId>,
        quantity: i64,
    },
    /// `current_stock` differs from what products say is stored there.
    WarehouseStockMismatch {
        warehouse_id: WarehouseId,
        current_stock: i64,
        location_total: i64,
    },
    LedgerReplayMismatch {
        product_id: ProductId,
        stock: i64,
        replayed: i64,
    },
    LocationReplayMismatch {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
        replayed: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub products_checked: usize,
    pub warehouses_checked: usize,
    pub ledger_entries: usize,
    pub violations: Vec<Violation>,
}

impl ConsistencyReport {
    pub fn check(products: &[Product], warehouses: &[Warehouse], ledger: &[LedgerEntry]) -> Self {
        let mut violations = Vec::new();

        let mut per_warehouse: BTreeMap<WarehouseId, i64> = BTreeMap::new();
        let mut stock: BTreeMap<ProductId, i64> = BTreeMap::new();
        let mut locations: BTreeMap<(ProductId, WarehouseId), i64> = BTreeMap::new();

        for product in products {
            let pid = product.id_typed();
            if product.stock() < 0 {
                violations.push(Violation::NegativeQuantity {
                    product_id: pid,
                    warehouse_id: None,
                    quantity: product.stock(),
                });
            }
            if !product.is_consistent() {
                violations.push(Violation::ProductStockMismatch {
                    product_id: pid,
                    stock: product.stock(),
                    location_total: product.location_total(),
                });
            }
            for (wid, qty) in product.locations() {
                if *qty < 0 {
                    violations.push(Violation::NegativeQuantity {
                        product_id: pid,
                        warehouse_id: Some(*wid),
                        quantity: *qty,
                    });
                }
                *per_warehouse.entry(*wid).or_insert(0) += qty;
                locations.insert((pid, *wid), *qty);
            }
            stock.insert(pid, product.stock());
        }

        let known: BTreeSet<WarehouseId> = warehouses.iter().map(|w| w.id_typed()).collect();
        for warehouse in warehouses {
            let wid = warehouse.id_typed();
            let location_total = per_warehouse.get(&wid).copied().unwrap_or(0);
            if warehouse.current_stock() != location_total {
                violations.push(Violation::WarehouseStockMismatch {
                    warehouse_id: wid,
                    current_stock: warehouse.current_stock(),
                    location_total,
                });
            }
        }
        // stock recorded against warehouses that no longer exist
        for (wid, total) in &per_warehouse {
            if !known.contains(wid) && *total != 0 {
                violations.push(Violation::WarehouseStockMismatch {
                    warehouse_id: *wid,
                    current_stock: 0,
                    location_total: *total,
                });
            }
        }

        let replayed = replay_stock(ledger);
        let product_ids: BTreeSet<ProductId> = stock.keys().chain(replayed.keys()).copied().collect();
        for pid in product_ids {
            let current = stock.get(&pid).copied().unwrap_or(0);
            let from_ledger = replayed.get(&pid).copied().unwrap_or(0);
            if current != from_ledger {
                violations.push(Violation::LedgerReplayMismatch {
                    product_id: pid,
                    stock: current,
                    replayed: from_ledger,
                });
            }
        }

        let replayed_locations = replay_locations(ledger);
        let keys: BTreeSet<(ProductId, WarehouseId)> = locations
            .keys()
            .chain(replayed_locations.keys())
            .copied()
            .collect();
        for key in keys {
            let quantity = locations.get(&key).copied().unwrap_or(0);
            let from_ledger = replayed_locations.get(&key).copied().unwrap_or(0);
            if quantity != from_ledger {
                violations.push(Violation::LocationReplayMismatch {
                    product_id: key.0,
                    warehouse_id: key.1,
                    quantity,
                    replayed: from_ledger,
                });
            }
        }

        Self {
            products_checked: products.len(),
            warehouses_checked: warehouses.len(),
            ledger_entries: ledger.len(),
            violations,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockmaster_core::{ActingPrincipal, DocumentId, LedgerEntryId};

    use crate::document::{DocumentNumber, MovementKind};
    use crate::product::ProductDetails;
    use crate::stock::{StagedInventory, StockAdjuster};
    use crate::warehouse::WarehouseDetails;

    fn fixture() -> (Product, Warehouse) {
        let now = Utc::now();
        let product = Product::register(
            ProductId::new(),
            ProductDetails {
                sku: "SKU-1".to_string(),
                name: "Widget".to_string(),
                category: "Parts".to_string(),
                unit: "pcs".to_string(),
                reorder_level: 0,
            },
            now,
        )
        .unwrap();
        let warehouse = Warehouse::register(
            WarehouseId::new(),
            WarehouseDetails {
                name: "Main".to_string(),
                address: "1 Dock Road".to_string(),
                capacity: 100,
            },
            now,
        )
        .unwrap();
        (product, warehouse)
    }

    fn ledger_entry(product_id: ProductId, warehouse_id: WarehouseId, quantity: i64) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            sequence: 1,
            product_id,
            warehouse_id,
            quantity,
            movement: MovementKind::Receipt,
            from: "Acme".to_string(),
            to: "Main".to_string(),
            document_id: DocumentId::new(),
            reference: DocumentNumber::generate(MovementKind::Receipt, 1),
            performed_by: ActingPrincipal::new("clerk").unwrap(),
            recorded_at: Utc::now(),
        }
    }

    fn stocked(qty: i64) -> (Product, Warehouse) {
        let (product, warehouse) = fixture();
        let (pid, wid) = (product.id_typed(), warehouse.id_typed());
        let mut staged = StagedInventory::new();
        staged.insert_product(product);
        staged.insert_warehouse(warehouse);
        StockAdjuster::default().apply(&mut staged, pid, wid, qty, Utc::now()).unwrap();
        (
            staged.product(&pid).unwrap().clone(),
            staged.warehouse(&wid).unwrap().clone(),
        )
    }

    #[test]
    fn matching_snapshot_is_consistent() {
        let (product, warehouse) = stocked(20);
        let ledger = vec![ledger_entry(product.id_typed(), warehouse.id_typed(), 20)];
        let report = ConsistencyReport::check(&[product], &[warehouse], &ledger);
        assert!(report.is_consistent(), "{:?}", report.violations);
        assert_eq!(report.ledger_entries, 1);
    }

    #[test]
    fn missing_ledger_entry_is_reported_per_product_and_location() {
        let (product, warehouse) = stocked(20);
        let report = ConsistencyReport::check(&[product], &[warehouse], &[]);
        assert_eq!(report.violations.len(), 2);
        assert!(matches!(report.violations[0], Violation::LedgerReplayMismatch { stock: 20, replayed: 0, .. }));
        assert!(matches!(report.violations[1], Violation::LocationReplayMismatch { quantity: 20, replayed: 0, .. }));
    }

    #[test]
    fn warehouse_drift_is_reported() {
        let (product, _) = stocked(5);
        let (_, fresh_warehouse) = fixture();
        let report = ConsistencyReport::check(&[product.clone()], &[fresh_warehouse], &[]);
        assert!(report
            .violations
            .iter()
            .any(|v| matches!(v, Violation::WarehouseStockMismatch { location_total: 5, current_stock: 0, .. })));
    }
}
