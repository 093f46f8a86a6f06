//! Per-type document statuses.
//!
//! Each movement type has its own finite status set; the legal edges between
//! them live in [`crate::lifecycle`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MovementKind;
use crate::error::MovementError;

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

fn unknown(kind: MovementKind, raw: &str) -> MovementError {
    MovementError::validation(format!("unknown {kind} status '{raw}'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Draft,
    Pending,
    Received,
    Done,
    Cancelled,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReceiptStatus::Draft => "Draft",
            ReceiptStatus::Pending => "Pending",
            ReceiptStatus::Received => "Received",
            ReceiptStatus::Done => "Done",
            ReceiptStatus::Cancelled => "Cancelled",
        })
    }
}

impl FromStr for ReceiptStatus {
    type Err = MovementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "draft" => Ok(ReceiptStatus::Draft),
            "pending" => Ok(ReceiptStatus::Pending),
            "received" => Ok(ReceiptStatus::Received),
            "done" => Ok(ReceiptStatus::Done),
            "cancelled" | "canceled" => Ok(ReceiptStatus::Cancelled),
            _ => Err(unknown(MovementKind::Receipt, s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Draft,
    Pending,
    #[serde(alias = "shipped")]
    Dispatched,
    #[serde(alias = "done")]
    Delivered,
    Cancelled,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeliveryStatus::Draft => "Draft",
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::Dispatched => "Dispatched",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
        })
    }
}

impl FromStr for DeliveryStatus {
    type Err = MovementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "draft" => Ok(DeliveryStatus::Draft),
            "pending" => Ok(DeliveryStatus::Pending),
            "dispatched" | "shipped" => Ok(DeliveryStatus::Dispatched),
            "delivered" | "done" => Ok(DeliveryStatus::Delivered),
            "cancelled" | "canceled" => Ok(DeliveryStatus::Cancelled),
            _ => Err(unknown(MovementKind::Delivery, s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Draft,
    Pending,
    InTransit,
    #[serde(alias = "done")]
    Completed,
    Cancelled,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferStatus::Draft => "Draft",
            TransferStatus::Pending => "Pending",
            TransferStatus::InTransit => "In Transit",
            TransferStatus::Completed => "Completed",
            TransferStatus::Cancelled => "Cancelled",
        })
    }
}

impl FromStr for TransferStatus {
    type Err = MovementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "draft" => Ok(TransferStatus::Draft),
            "pending" => Ok(TransferStatus::Pending),
            "in_transit" | "intransit" => Ok(TransferStatus::InTransit),
            "completed" | "done" => Ok(TransferStatus::Completed),
            "cancelled" | "canceled" => Ok(TransferStatus::Cancelled),
            _ => Err(unknown(MovementKind::Transfer, s)),
        }
    }
}

/// Adjustments are recorded and reconciled in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    Recorded,
}

impl fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Recorded")
    }
}

impl FromStr for AdjustmentStatus {
    type Err = MovementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "recorded" | "done" => Ok(AdjustmentStatus::Recorded),
            _ => Err(unknown(MovementKind::Adjustment, s)),
        }
    }
}

/// A status tagged with its movement type.
///
/// Transition requests carry one of these, which also tells the engine which
/// collection the document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Receipt(ReceiptStatus),
    Delivery(DeliveryStatus),
    Transfer(TransferStatus),
    Adjustment(AdjustmentStatus),
}

impl DocumentStatus {
    pub fn kind(&self) -> MovementKind {
        match self {
            DocumentStatus::Receipt(_) => MovementKind::Receipt,
            DocumentStatus::Delivery(_) => MovementKind::Delivery,
            DocumentStatus::Transfer(_) => MovementKind::Transfer,
            DocumentStatus::Adjustment(_) => MovementKind::Adjustment,
        }
    }

    /// Parse a user-supplied status label for a given movement type.
    ///
    /// Matching is case-insensitive and treats spaces, dashes and underscores
    /// alike (`"In Transit"`, `"in-transit"` and `"in_transit"` are equal).
    pub fn parse(kind: MovementKind, raw: &str) -> Result<Self, MovementError> {
        Ok(match kind {
            MovementKind::Receipt => DocumentStatus::Receipt(raw.parse()?),
            MovementKind::Delivery => DocumentStatus::Delivery(raw.parse()?),
            MovementKind::Transfer => DocumentStatus::Transfer(raw.parse()?),
            MovementKind::Adjustment => DocumentStatus::Adjustment(raw.parse()?),
        })
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Receipt(s) => s.fmt(f),
            DocumentStatus::Delivery(s) => s.fmt(f),
            DocumentStatus::Transfer(s) => s.fmt(f),
            DocumentStatus::Adjustment(s) => s.fmt(f),
        }
    }
}
