use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use uuid::Uuid;

use stockmaster_core::{LedgerEntryId, ProductId};
use stockmaster_inventory::{DocumentNumber, LedgerEntry};

use super::r#trait::{
    CommitReceipt, EntityKey, EntityKind, EntityStore, LedgerFilter, Record, StoreError,
    StoreSnapshot, Versioned, WriteOp,
};

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<EntityKey, Versioned<Record>>,
    unique: HashMap<(EntityKind, String), Uuid>,
    ledger: Vec<LedgerEntry>,
    by_product: HashMap<ProductId, Vec<usize>>,
    by_reference: HashMap<DocumentNumber, Vec<usize>>,
}

impl State {
    fn version(&self, key: &EntityKey) -> u64 {
        self.records.get(key).map(|r| r.version).unwrap_or(0)
    }

    fn entries(&self, positions: Option<&Vec<usize>>) -> Vec<LedgerEntry> {
        positions
            .map(|idx| idx.iter().map(|i| self.ledger[*i].clone()).collect())
            .unwrap_or_default()
    }

    /// Reject the batch before anything is written.
    fn validate(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut seen: HashSet<EntityKey> = HashSet::new();
        let mut claimed: HashMap<(EntityKind, String), Uuid> = HashMap::new();

        for op in ops {
            let (key, expected) = match op {
                WriteOp::Put { record, expected } => (record.key(), *expected),
                WriteOp::Delete { key, expected } | WriteOp::Check { key, expected } => {
                    (*key, *expected)
                }
                WriteOp::AppendLedger(_) => continue,
            };

            if !seen.insert(key) {
                return Err(StoreError::InvalidBatch(format!("{key} appears twice")));
            }

            let found = self.version(&key);
            if !expected.matches(found) {
                return Err(StoreError::VersionConflict {
                    key,
                    expected,
                    found,
                });
            }

            if let WriteOp::Put { record, .. } = op {
                let slot = (key.kind, record.unique_value());
                let owner = claimed.get(&slot).or_else(|| self.unique.get(&slot));
                if owner.is_some_and(|id| *id != key.id) {
                    return Err(StoreError::Duplicate {
                        kind: key.kind,
                        value: slot.1,
                    });
                }
                claimed.insert(slot, key.id);
            }
        }
        Ok(())
    }

    fn release_unique(&mut self, key: &EntityKey) {
        if let Some(existing) = self.records.get(key) {
            let slot = (key.kind, existing.value.unique_value());
            if self.unique.get(&slot) == Some(&key.id) {
                self.unique.remove(&slot);
            }
        }
    }
}

/// In-memory entity store.
///
/// Intended for tests/dev. A single `RwLock` makes each batch commit atomic;
/// conflicts between callers are detected through record versions.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: RwLock<State>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

impl EntityStore for InMemoryEntityStore {
    fn get(&self, key: &EntityKey) -> Result<Option<Versioned<Record>>, StoreError> {
        let state = self.state.read().map_err(Self::poisoned)?;
        Ok(state.records.get(key).cloned())
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<Versioned<Record>>, StoreError> {
        let state = self.state.read().map_err(Self::poisoned)?;
        let from = EntityKey { kind, id: Uuid::nil() };
        let to = EntityKey { kind, id: Uuid::from_u128(u128::MAX) };
        Ok(state.records.range(from..=to).map(|(_, r)| r.clone()).collect())
    }

    fn conditional_write_batch(&self, ops: Vec<WriteOp>) -> Result<CommitReceipt, StoreError> {
        let mut state = self.state.write().map_err(Self::poisoned)?;
        state.validate(&ops)?;

        let mut receipt = CommitReceipt::default();
        for op in ops {
            match op {
                WriteOp::Put { record, .. } => {
                    let key = record.key();
                    let version = state.version(&key) + 1;
                    state.release_unique(&key);
                    state.unique.insert((key.kind, record.unique_value()), key.id);
                    state.records.insert(key, Versioned::new(record, version));
                    receipt.versions.push((key, version));
                }
                WriteOp::Delete { key, .. } => {
                    state.release_unique(&key);
                    state.records.remove(&key);
                    receipt.versions.push((key, 0));
                }
                WriteOp::Check { .. } => {}
                WriteOp::AppendLedger(draft) => {
                    let position = state.ledger.len();
                    let entry = LedgerEntry::commit(draft, LedgerEntryId::new(), position as u64 + 1);
                    state.by_product.entry(entry.product_id).or_default().push(position);
                    state
                        .by_reference
                        .entry(entry.reference.clone())
                        .or_default()
                        .push(position);
                    state.ledger.push(entry.clone());
                    receipt.ledger.push(entry);
                }
            }
        }

        Ok(receipt)
    }

    fn ledger(&self, filter: &LedgerFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.state.read().map_err(Self::poisoned)?;
        Ok(match filter {
            LedgerFilter::All => state.ledger.clone(),
            LedgerFilter::Product(id) => state.entries(state.by_product.get(id)),
            LedgerFilter::Reference(number) => state.entries(state.by_reference.get(number)),
        })
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.state.read().map_err(Self::poisoned)?;
        Ok(StoreSnapshot {
            records: state.records.values().cloned().collect(),
            ledger: state.ledger.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockmaster_core::{ActingPrincipal, DocumentId, ExpectedVersion, WarehouseId};
    use stockmaster_inventory::{LedgerDraft, MovementKind, Product, ProductDetails};

    fn product(sku: &str) -> Product {
        Product::register(
            ProductId::new(),
            ProductDetails {
                sku: sku.to_string(),
                name: "Widget".to_string(),
                category: "Parts".to_string(),
                unit: "pcs".to_string(),
                reorder_level: 0,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn draft(product_id: ProductId, number: u64) -> LedgerDraft {
        LedgerDraft {
            product_id,
            warehouse_id: WarehouseId::new(),
            quantity: 1,
            movement: MovementKind::Receipt,
            from: "Acme".to_string(),
            to: "Main".to_string(),
            document_id: DocumentId::new(),
            reference: DocumentNumber::generate(MovementKind::Receipt, number),
            performed_by: ActingPrincipal::new("clerk").unwrap(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn insert_then_update_bumps_version() {
        let store = InMemoryEntityStore::new();
        let p = product("SKU-1");
        let key = EntityKey::product(p.id_typed());

        let r = store.conditional_write_batch(vec![WriteOp::insert(Record::Product(p.clone()))]).unwrap();
        assert_eq!(r.version_of(&key), Some(1));

        let r = store
            .conditional_write_batch(vec![WriteOp::put(Record::Product(p), ExpectedVersion::Exact(1))])
            .unwrap();
        assert_eq!(r.version_of(&key), Some(2));
        assert_eq!(store.get(&key).unwrap().unwrap().version, 2);
    }

    #[test]
    fn stale_version_rejects_whole_batch() {
        let store = InMemoryEntityStore::new();
        let p = product("SKU-1");
        let key = EntityKey::product(p.id_typed());
        store.conditional_write_batch(vec![WriteOp::insert(Record::Product(p.clone()))]).unwrap();

        let err = store
            .conditional_write_batch(vec![
                WriteOp::AppendLedger(draft(p.id_typed(), 1)),
                WriteOp::put(Record::Product(p.clone()), ExpectedVersion::Exact(7)),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { found: 1, .. }));
        assert!(store.ledger(&LedgerFilter::All).unwrap().is_empty());
        assert_eq!(store.get(&key).unwrap().unwrap().version, 1);
    }

    #[test]
    fn unique_values_are_enforced_per_collection() {
        let store = InMemoryEntityStore::new();
        store.conditional_write_batch(vec![WriteOp::insert(Record::Product(product("SKU-1")))]).unwrap();

        let err = store
            .conditional_write_batch(vec![WriteOp::insert(Record::Product(product("SKU-1")))])
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { kind: EntityKind::Product, .. }));
    }

    #[test]
    fn deleting_frees_the_unique_value() {
        let store = InMemoryEntityStore::new();
        let p = product("SKU-1");
        store.conditional_write_batch(vec![WriteOp::insert(Record::Product(p.clone()))]).unwrap();
        store
            .conditional_write_batch(vec![WriteOp::Delete {
                key: EntityKey::product(p.id_typed()),
                expected: ExpectedVersion::Exact(1),
            }])
            .unwrap();

        store.conditional_write_batch(vec![WriteOp::insert(Record::Product(product("SKU-1")))]).unwrap();
        assert_eq!(store.list(EntityKind::Product).unwrap().len(), 1);
    }

    #[test]
    fn ledger_sequences_are_global_and_indexed() {
        let store = InMemoryEntityStore::new();
        let (a, b) = (ProductId::new(), ProductId::new());
        store
            .conditional_write_batch(vec![
                WriteOp::AppendLedger(draft(a, 1)),
                WriteOp::AppendLedger(draft(b, 2)),
            ])
            .unwrap();
        store.conditional_write_batch(vec![WriteOp::AppendLedger(draft(a, 3))]).unwrap();

        let all = store.ledger(&LedgerFilter::All).unwrap();
        assert_eq!(all.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);

        let for_a = store.ledger(&LedgerFilter::Product(a)).unwrap();
        assert_eq!(for_a.len(), 2);

        let by_ref = store
            .ledger(&LedgerFilter::Reference(DocumentNumber::generate(MovementKind::Receipt, 2)))
            .unwrap();
        assert_eq!(by_ref.len(), 1);
        assert_eq!(by_ref[0].product_id, b);
    }

    #[test]
    fn check_op_guards_without_writing() {
        let store = InMemoryEntityStore::new();
        let p = product("SKU-1");
        let key = EntityKey::product(p.id_typed());
        store.conditional_write_batch(vec![WriteOp::insert(Record::Product(p))]).unwrap();

        let err = store
            .conditional_write_batch(vec![WriteOp::Check {
                key,
                expected: ExpectedVersion::ABSENT,
            }])
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
        assert_eq!(store.get(&key).unwrap().unwrap().version, 1);
    }
}
