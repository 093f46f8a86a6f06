use serde::{Deserialize, Serialize};

use stockmaster_core::ValueObject;

use super::MovementKind;
use crate::error::MovementError;

/// Human-readable, unique document number such as `REC-0001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentNumber(String);

impl DocumentNumber {
    /// `PREFIX-NNNN`, zero padded to four digits and widening past 9999.
    pub fn generate(kind: MovementKind, sequence: u64) -> Self {
        Self(format!("{}-{:04}", kind.prefix(), sequence))
    }

    /// Accept a caller-supplied number; it must carry the kind's prefix.
    pub fn parse(kind: MovementKind, raw: &str) -> Result<Self, MovementError> {
        let raw = raw.trim();
        let prefix = format!("{}-", kind.prefix());
        match raw.strip_prefix(&prefix) {
            Some(rest) if !rest.is_empty() => Ok(Self(raw.to_string())),
            _ => Err(MovementError::validation(format!(
                "{kind} number must look like {prefix}0001, got '{raw}'"
            ))),
        }
    }

    /// Numeric suffix, if the number ends in digits.
    pub fn sequence(&self) -> Option<u64> {
        self.0.rsplit('-').next()?.parse().ok()
    }

    /// Next generated number after the highest numeric suffix in `existing`.
    ///
    /// Fails once a caller-supplied number has taken the largest possible suffix.
    pub fn next_after<'a>(
        kind: MovementKind,
        existing: impl IntoIterator<Item = &'a DocumentNumber>,
    ) -> Result<Self, MovementError> {
        let max = existing
            .into_iter()
            .filter_map(DocumentNumber::sequence)
            .max()
            .unwrap_or(0);
        let next = max.checked_add(1).ok_or_else(|| {
            MovementError::validation(format!(
                "{kind} numbering exhausted after {}-{max}; supply a number explicitly",
                kind.prefix()
            ))
        })?;
        Ok(Self::generate(kind, next))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for DocumentNumber {}

impl core::fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_numbers_are_zero_padded() {
        assert_eq!(DocumentNumber::generate(MovementKind::Receipt, 1).as_str(), "REC-0001");
        assert_eq!(DocumentNumber::generate(MovementKind::Transfer, 12345).as_str(), "TRF-12345");
    }

    #[test]
    fn next_after_skips_past_the_highest_suffix() {
        let existing = vec![
            DocumentNumber::generate(MovementKind::Delivery, 3),
            DocumentNumber::parse(MovementKind::Delivery, "DEL-17").unwrap(),
            DocumentNumber::parse(MovementKind::Delivery, "DEL-north").unwrap(),
        ];
        let next = DocumentNumber::next_after(MovementKind::Delivery, &existing).unwrap();
        assert_eq!(next.as_str(), "DEL-0018");
    }

    #[test]
    fn next_after_rejects_an_exhausted_suffix() {
        let existing = vec![
            DocumentNumber::generate(MovementKind::Receipt, 2),
            DocumentNumber::parse(MovementKind::Receipt, "REC-18446744073709551615").unwrap(),
        ];
        let err = DocumentNumber::next_after(MovementKind::Receipt, &existing).unwrap_err();
        assert!(matches!(err, MovementError::Validation(_)));
    }

    #[test]
    fn parse_requires_the_kind_prefix() {
        assert!(DocumentNumber::parse(MovementKind::Receipt, "REC-1").is_ok());
        assert!(DocumentNumber::parse(MovementKind::Receipt, "DEL-1").is_err());
        assert!(DocumentNumber::parse(MovementKind::Receipt, "REC-").is_err());
    }
}
