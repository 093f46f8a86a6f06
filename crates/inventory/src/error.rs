//! Stock-movement error model.

use thiserror::Error;

use stockmaster_core::{DomainError, ProductId, WarehouseId};

use crate::document::MovementKind;

/// Deterministic failure of a stock-movement rule.
///
/// Every variant is raised before any quantity is touched, so callers can
/// rely on "error returned ⇒ nothing changed".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementError {
    /// Requested status is not a legal successor of the current one.
    #[error("invalid {kind} transition: {from} -> {to}")]
    InvalidTransition {
        kind: MovementKind,
        from: String,
        to: String,
    },

    /// A negative delta would drive product stock or a location below zero.
    #[error(
        "insufficient stock for product {product_id} at warehouse {warehouse_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        available: i64,
        requested: i64,
    },

    /// A positive delta would push a warehouse past its capacity.
    #[error("capacity exceeded at warehouse {warehouse_id}: capacity {capacity}, resulting stock {resulting}")]
    CapacityExceeded {
        warehouse_id: WarehouseId,
        capacity: i64,
        resulting: i64,
    },

    /// Malformed input (negative quantities, empty parties, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A line or adjustment references a product that is not staged/known.
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    /// A document references a warehouse that is not staged/known.
    #[error("unknown warehouse {0}")]
    UnknownWarehouse(WarehouseId),
}

impl MovementError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for MovementError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::Conflict(msg) => Self::Validation(format!("conflict: {msg}")),
        }
    }
}
