use thiserror::Error;

use stockmaster_core::{DocumentId, DomainError, ProductId, WarehouseId};
use stockmaster_inventory::{MovementError, MovementKind};

use crate::entity_store::StoreError;

/// Failure of one engine operation.
///
/// Every variant is scoped to the operation that returned it: quantities and
/// document state are unchanged whenever an error comes back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("{kind} {id} not found")]
    DocumentNotFound { kind: MovementKind, id: DocumentId },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid {kind} transition: {from} -> {to}")]
    InvalidTransition {
        kind: MovementKind,
        from: String,
        to: String,
    },

    #[error(
        "insufficient stock for product {product_id} at warehouse {warehouse_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        available: i64,
        requested: i64,
    },

    #[error("capacity exceeded at warehouse {warehouse_id}: capacity {capacity}, resulting stock {resulting}")]
    CapacityExceeded {
        warehouse_id: WarehouseId,
        capacity: i64,
        resulting: i64,
    },

    /// Optimistic-lock conflict; the only retryable kind.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("duplicate {entity} '{value}'")]
    Duplicate { entity: &'static str, value: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("store error: {0}")]
    Store(String),
}

impl ReconcileError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::ConcurrentModification(_))
    }
}

impl From<MovementError> for ReconcileError {
    fn from(value: MovementError) -> Self {
        match value {
            MovementError::InvalidTransition { kind, from, to } => {
                ReconcileError::InvalidTransition { kind, from, to }
            }
            MovementError::InsufficientStock {
                product_id,
                warehouse_id,
                available,
                requested,
            } => ReconcileError::InsufficientStock {
                product_id,
                warehouse_id,
                available,
                requested,
            },
            MovementError::CapacityExceeded {
                warehouse_id,
                capacity,
                resulting,
            } => ReconcileError::CapacityExceeded {
                warehouse_id,
                capacity,
                resulting,
            },
            MovementError::Validation(msg) => ReconcileError::Validation(msg),
            MovementError::UnknownProduct(id) => {
                ReconcileError::Validation(format!("unknown product {id}"))
            }
            MovementError::UnknownWarehouse(id) => {
                ReconcileError::Validation(format!("unknown warehouse {id}"))
            }
        }
    }
}

impl From<StoreError> for ReconcileError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::VersionConflict { .. } => {
                ReconcileError::ConcurrentModification(value.to_string())
            }
            StoreError::Duplicate { kind, value } => ReconcileError::Duplicate {
                entity: kind.as_str(),
                value,
            },
            StoreError::InvalidBatch(msg) | StoreError::Unavailable(msg) => {
                ReconcileError::Store(msg)
            }
        }
    }
}

impl From<DomainError> for ReconcileError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ReconcileError::Validation(msg)
            }
            DomainError::Conflict(msg) => ReconcileError::ConcurrentModification(msg),
        }
    }
}
