//! The acting principal threaded through every mutating operation.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Who performed a stock-affecting operation.
///
/// Authentication happens outside the domain; by the time a request reaches
/// the engine the caller has been resolved to this label, which ends up on
/// every ledger entry the operation writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActingPrincipal(String);

impl ActingPrincipal {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("acting principal cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for ActingPrincipal {}

impl core::fmt::Display for ActingPrincipal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ActingPrincipal {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActingPrincipal> for String {
    fn from(value: ActingPrincipal) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_principal_is_rejected() {
        assert!(ActingPrincipal::new("   ").is_err());
    }

    #[test]
    fn principal_is_trimmed() {
        let p = ActingPrincipal::new("  warehouse.clerk ").unwrap();
        assert_eq!(p.as_str(), "warehouse.clerk");
    }

    #[test]
    fn deserializing_blank_principal_fails() {
        let res: Result<ActingPrincipal, _> = serde_json::from_str("\"\"");
        assert!(res.is_err());
    }
}
