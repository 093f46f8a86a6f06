use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use stockmaster_core::{DocumentId, ExpectedVersion, ProductId, WarehouseId};
use stockmaster_inventory::{
    DocumentNumber, LedgerDraft, LedgerEntry, MovementDocument, MovementKind, Product, Warehouse,
};

/// Independent collections of the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Warehouse,
    Receipt,
    Delivery,
    Transfer,
    Adjustment,
}

impl EntityKind {
    pub fn for_movement(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Receipt => EntityKind::Receipt,
            MovementKind::Delivery => EntityKind::Delivery,
            MovementKind::Transfer => EntityKind::Transfer,
            MovementKind::Adjustment => EntityKind::Adjustment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Warehouse => "warehouse",
            EntityKind::Receipt => "receipt",
            EntityKind::Delivery => "delivery",
            EntityKind::Transfer => "transfer",
            EntityKind::Adjustment => "adjustment",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(collection, id)` address of one record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityKey {
    pub fn product(id: ProductId) -> Self {
        Self {
            kind: EntityKind::Product,
            id: *id.as_uuid(),
        }
    }

    pub fn warehouse(id: WarehouseId) -> Self {
        Self {
            kind: EntityKind::Warehouse,
            id: *id.as_uuid(),
        }
    }

    pub fn document(kind: MovementKind, id: DocumentId) -> Self {
        Self {
            kind: EntityKind::for_movement(kind),
            id: *id.as_uuid(),
        }
    }
}

impl core::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Product(Product),
    Warehouse(Warehouse),
    Document(MovementDocument),
}

impl Record {
    pub fn key(&self) -> EntityKey {
        match self {
            Record::Product(p) => EntityKey::product(p.id_typed()),
            Record::Warehouse(w) => EntityKey::warehouse(w.id_typed()),
            Record::Document(d) => EntityKey::document(d.kind(), d.id_typed()),
        }
    }

    /// Value that must be unique within the record's collection.
    pub fn unique_value(&self) -> String {
        match self {
            Record::Product(p) => p.sku().to_string(),
            Record::Warehouse(w) => w.name().to_string(),
            Record::Document(d) => d.number().as_str().to_string(),
        }
    }

    pub fn into_product(self) -> Option<Product> {
        match self {
            Record::Product(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_warehouse(self) -> Option<Warehouse> {
        match self {
            Record::Warehouse(w) => Some(w),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<MovementDocument> {
        match self {
            Record::Document(d) => Some(d),
            _ => None,
        }
    }
}

/// A value with its optimistic-concurrency version (1 on first write).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Versioned<T> {
    pub version: u64,
    #[serde(flatten)]
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { version, value }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            version: self.version,
            value: f(self.value),
        }
    }
}

/// One element of a conditional batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or replace; `expected` is checked against the current version
    /// (`ExpectedVersion::ABSENT` for inserts).
    Put { record: Record, expected: ExpectedVersion },
    Delete { key: EntityKey, expected: ExpectedVersion },
    /// Assert a version without writing.
    Check { key: EntityKey, expected: ExpectedVersion },
    /// Append to the ledger; the store assigns id and sequence.
    AppendLedger(LedgerDraft),
}

impl WriteOp {
    pub fn put(record: Record, expected: ExpectedVersion) -> Self {
        WriteOp::Put { record, expected }
    }

    pub fn insert(record: Record) -> Self {
        WriteOp::Put {
            record,
            expected: ExpectedVersion::ABSENT,
        }
    }
}

/// What a successful batch committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub versions: Vec<(EntityKey, u64)>,
    pub ledger: Vec<LedgerEntry>,
}

impl CommitReceipt {
    pub fn version_of(&self, key: &EntityKey) -> Option<u64> {
        self.versions.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerFilter {
    All,
    Product(ProductId),
    Reference(DocumentNumber),
}

/// Everything in the store, read under one lock.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub records: Vec<Versioned<Record>>,
    pub ledger: Vec<LedgerEntry>,
}

impl StoreSnapshot {
    pub fn products(&self) -> Vec<Product> {
        self.records
            .iter()
            .filter_map(|r| r.value.clone().into_product())
            .collect()
    }

    pub fn warehouses(&self) -> Vec<Warehouse> {
        self.records
            .iter()
            .filter_map(|r| r.value.clone().into_warehouse())
            .collect()
    }

    pub fn documents(&self) -> Vec<MovementDocument> {
        self.records
            .iter()
            .filter_map(|r| r.value.clone().into_document())
            .collect()
    }
}

/// Entity store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("version conflict on {key}: expected {expected:?}, found {found}")]
    VersionConflict {
        key: EntityKey,
        expected: ExpectedVersion,
        found: u64,
    },

    #[error("duplicate {kind} '{value}'")]
    Duplicate { kind: EntityKind, value: String },

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Transactional document store with per-record optimistic versioning.
///
/// Version 0 means "absent". Every successful write bumps the record's
/// version by one.
///
/// ## Batch semantics
///
/// `conditional_write_batch()`:
/// - checks every op's expected version against the current one
/// - enforces uniqueness of sku, warehouse name and document number
/// - assigns ledger ids and store-wide sequence numbers in op order
/// - applies all ops or none
pub trait EntityStore: Send + Sync {
    fn get(&self, key: &EntityKey) -> Result<Option<Versioned<Record>>, StoreError>;

    /// All records of one collection, ordered by id (UUIDv7, so creation order).
    fn list(&self, kind: EntityKind) -> Result<Vec<Versioned<Record>>, StoreError>;

    fn conditional_write_batch(&self, ops: Vec<WriteOp>) -> Result<CommitReceipt, StoreError>;

    /// Ledger entries in sequence order.
    fn ledger(&self, filter: &LedgerFilter) -> Result<Vec<LedgerEntry>, StoreError>;

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError>;
}

impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    fn get(&self, key: &EntityKey) -> Result<Option<Versioned<Record>>, StoreError> {
        (**self).get(key)
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<Versioned<Record>>, StoreError> {
        (**self).list(kind)
    }

    fn conditional_write_batch(&self, ops: Vec<WriteOp>) -> Result<CommitReceipt, StoreError> {
        (**self).conditional_write_batch(ops)
    }

    fn ledger(&self, filter: &LedgerFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).ledger(filter)
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        (**self).snapshot()
    }
}
