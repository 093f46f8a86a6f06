use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmaster_core::{Entity, WarehouseId};

use crate::error::MovementError;
use crate::stock::CapacityPolicy;

/// Descriptive warehouse fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseDetails {
    pub name: String,
    pub address: String,
    pub capacity: i64,
}

impl WarehouseDetails {
    fn validate(&self) -> Result<(), MovementError> {
        if self.name.trim().is_empty() {
            return Err(MovementError::validation("warehouse name cannot be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(MovementError::validation("warehouse address cannot be empty"));
        }
        if self.capacity < 0 {
            return Err(MovementError::validation("capacity cannot be negative"));
        }
        Ok(())
    }
}

/// A stock location.
///
/// `current_stock` mirrors the sum of every product's quantity at this
/// warehouse and is only moved by the stock adjuster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    name: String,
    address: String,
    capacity: i64,
    current_stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn register(
        id: WarehouseId,
        details: WarehouseDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, MovementError> {
        details.validate()?;
        Ok(Self {
            id,
            name: details.name.trim().to_string(),
            address: details.address.trim().to_string(),
            capacity: details.capacity,
            current_stock: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the descriptive fields.
    ///
    /// Under [`CapacityPolicy::Enforce`] the capacity may not drop below what
    /// is already stored here.
    pub fn apply_details(
        &mut self,
        details: WarehouseDetails,
        policy: CapacityPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), MovementError> {
        details.validate()?;
        if policy == CapacityPolicy::Enforce && details.capacity < self.current_stock {
            return Err(MovementError::validation(format!(
                "capacity {} is below current stock {}",
                details.capacity, self.current_stock
            )));
        }
        self.name = details.name.trim().to_string();
        self.address = details.address.trim().to_string();
        self.capacity = details.capacity;
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> WarehouseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    /// Units that still fit before hitting capacity (never negative).
    pub fn headroom(&self) -> i64 {
        (self.capacity - self.current_stock).max(0)
    }

    pub(crate) fn shift(&mut self, delta: i64, now: DateTime<Utc>) {
        self.current_stock += delta;
        self.updated_at = now;
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(capacity: i64) -> WarehouseDetails {
        WarehouseDetails {
            name: "Main Warehouse".to_string(),
            address: "1 Dock Road".to_string(),
            capacity,
        }
    }

    #[test]
    fn new_warehouse_is_empty() {
        let wh = Warehouse::register(WarehouseId::new(), details(100), Utc::now()).unwrap();
        assert_eq!(wh.current_stock(), 0);
        assert_eq!(wh.headroom(), 100);
    }

    #[test]
    fn capacity_cannot_shrink_below_stock_when_enforced() {
        let mut wh = Warehouse::register(WarehouseId::new(), details(100), Utc::now()).unwrap();
        wh.shift(60, Utc::now());

        let err = wh
            .apply_details(details(50), CapacityPolicy::Enforce, Utc::now())
            .unwrap_err();
        assert!(matches!(err, MovementError::Validation(_)));
        assert_eq!(wh.capacity(), 100);

        wh.apply_details(details(50), CapacityPolicy::Warn, Utc::now())
            .unwrap();
        assert_eq!(wh.capacity(), 50);
        assert_eq!(wh.headroom(), 0);
    }

    #[test]
    fn negative_capacity_is_rejected() {
        assert!(Warehouse::register(WarehouseId::new(), details(-1), Utc::now()).is_err());
    }
}
