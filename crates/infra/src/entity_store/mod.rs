//! Entity store boundary.
//!
//! The reconciliation engine reads records one at a time and writes every
//! change of one operation through a single conditional batch. Storage
//! technology stays behind [`EntityStore`].

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEntityStore;
pub use r#trait::{
    CommitReceipt, EntityKey, EntityKind, EntityStore, LedgerFilter, Record, StoreError,
    StoreSnapshot, Versioned, WriteOp,
};
