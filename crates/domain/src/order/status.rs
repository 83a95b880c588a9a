//! Order status value object.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// The status of an order.
///
/// Stored by name, never by ordinal. Legal transitions:
/// ```text
/// Pending ──► Paid ──► Completed
///    │          │
///    └──────────┴──► Cancelled
/// ```
/// Construction accepts any status; only [`Order::transition_to`] checks the
/// table above.
///
/// [`Order::transition_to`]: crate::Order::transition_to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// The order is pending.
    #[default]
    Pending,

    /// The order has been paid.
    Paid,

    /// The order has been cancelled (terminal).
    Cancelled,

    /// The order has been completed (terminal).
    Completed,
}

impl OrderStatus {
    /// Every defined status, in declaration order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Cancelled,
        OrderStatus::Completed,
    ];

    /// Returns true if an order may move from this status to `target`.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Completed)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::invalid("status", format!("'{s}' is not a valid OrderStatus value"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_paid_transitions() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses_have_no_transitions() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn test_parse_by_name() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_rejects_undefined_names() {
        for raw in ["", "pending", "Shipped", "1"] {
            let err = raw.parse::<OrderStatus>().unwrap_err();
            assert!(matches!(
                err,
                DomainError::InvalidArgument {
                    argument: "status",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_serializes_by_name() {
        let json = serde_json::to_string(&OrderStatus::Completed).unwrap();
        assert_eq!(json, "\"Completed\"");
        let status: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, OrderStatus::Completed);
    }
}
