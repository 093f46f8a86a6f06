//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two document numbers with the same text
/// are the same number. They are immutable; "changing" one means building a
/// new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct DocumentNumber(String);
///
/// impl ValueObject for DocumentNumber {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
