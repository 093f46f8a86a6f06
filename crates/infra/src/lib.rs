//! Infrastructure layer: entity store, reconciliation engine, configuration.

pub mod config;
pub mod entity_store;
pub mod reconciliation;


pub use config::AppConfig;
pub use entity_store::{EntityStore, InMemoryEntityStore};
pub use reconciliation::{ReconcileError, ReconciliationEngine, TransitionOutcome};
