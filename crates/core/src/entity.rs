//! Entity identity and optimistic version expectations.

use crate::error::{DomainError, DomainResult};

/// Entity marker + minimal interface.
///
/// Products, warehouses, movement documents and ledger entries are all
/// entities: two records with the same id are the same thing, whatever their
/// attribute values.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Optimistic concurrency expectation for a stored entity.
///
/// Versions start at 1 on first write and grow by one per successful write.
/// Version 0 means "no such record", so `Exact(0)` expresses "must not exist
/// yet".
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// Expectation for inserting a record that must not already exist.
    pub const ABSENT: ExpectedVersion = ExpectedVersion::Exact(0);

    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
