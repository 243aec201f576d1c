//! Order and order-item fulfillment statuses.
//!
//! The wire form of every status is the lowercase word used by clients
//! (`"inprogress"`, `"cancelled"`, `"shipped"`, ...).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown status or role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Aggregate status of an order.
///
/// ```text
/// InProgress ──┬──► Completed ──► Delivered
///              │
///              └──► Cancelled
/// ```
///
/// Only cancellation is caller-triggered; the other edges belong to
/// automation outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Freshly placed, items are being fulfilled.
    #[default]
    InProgress,

    /// All items fulfilled.
    Completed,

    /// Cancelled by the customer (terminal state).
    Cancelled,

    /// Delivered to the customer (terminal state).
    Delivered,
}

impl OrderStatus {
    /// Returns true if a cancellation may be applied in this state.
    ///
    /// Re-cancelling is allowed so a half-applied cascade can be retried.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::InProgress | OrderStatus::Cancelled)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "inprogress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inprogress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "delivered" => Ok(OrderStatus::Delivered),
            _ => Err(UnknownVariant {
                kind: "order status",
                value: s.to_string(),
            }),
        }
    }
}

/// Fulfillment status of a single order item.
///
/// ```text
/// Placed ──► Shipped ──► OutForDelivery ──► Delivered
///    │          │              │
///    └──────────┴──────────────┴──► Cancelled   (only via order cancellation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Stamped on every item when its order is persisted.
    #[default]
    Placed,

    /// Handed to the carrier by the merchant.
    Shipped,

    /// With the last-mile carrier.
    OutForDelivery,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled together with the parent order (terminal state).
    Cancelled,
}

impl ItemStatus {
    /// Returns true if a merchant may mark the item shipped in this state.
    ///
    /// Shipping an already shipped item is accepted as a no-op retry.
    pub fn can_ship(&self) -> bool {
        matches!(self, ItemStatus::Placed | ItemStatus::Shipped)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Delivered | ItemStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Placed => "placed",
            ItemStatus::Shipped => "shipped",
            ItemStatus::OutForDelivery => "outfordelivery",
            ItemStatus::Delivered => "delivered",
            ItemStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placed" => Ok(ItemStatus::Placed),
            "shipped" => Ok(ItemStatus::Shipped),
            "outfordelivery" => Ok(ItemStatus::OutForDelivery),
            "delivered" => Ok(ItemStatus::Delivered),
            "cancelled" => Ok(ItemStatus::Cancelled),
            _ => Err(UnknownVariant {
                kind: "item status",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_initial_states() {
        assert_eq!(OrderStatus::default(), OrderStatus::InProgress);
        assert_eq!(ItemStatus::default(), ItemStatus::Placed);
    }

    #[test]
    fn order_cancellation_table() {
        assert!(OrderStatus::InProgress.can_cancel());
        assert!(OrderStatus::Cancelled.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
    }

    #[test]
    fn item_shipping_table() {
        assert!(ItemStatus::Placed.can_ship());
        assert!(ItemStatus::Shipped.can_ship());
        assert!(!ItemStatus::OutForDelivery.can_ship());
        assert!(!ItemStatus::Delivered.can_ship());
        assert!(!ItemStatus::Cancelled.can_ship());
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(ItemStatus::Cancelled.is_terminal());
        assert!(!ItemStatus::Shipped.is_terminal());
    }

    #[test]
    fn text_forms_agree_with_serde() {
        for status in [
            ItemStatus::Placed,
            ItemStatus::Shipped,
            ItemStatus::OutForDelivery,
            ItemStatus::Delivered,
            ItemStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"inprogress\""
        );
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!("Cancelled".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!("lost".parse::<ItemStatus>().is_err());
    }
}
