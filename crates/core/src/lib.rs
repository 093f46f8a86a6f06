//! `stockmaster-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the inventory
//! model, the reconciliation engine and the HTTP layer (no infrastructure
//! concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod principal;
pub mod value_object;

pub use entity::{Entity, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, LedgerEntryId, ProductId, WarehouseId};
pub use principal::ActingPrincipal;
pub use value_object::ValueObject;
