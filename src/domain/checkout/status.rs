//! Order lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where an order stands with respect to payment.
///
/// ```text
/// AwaitingPayment ──► Paid
///        │  ▲
///        ▼  │
///   PaymentFailed
///        │
///        ▼
///    Cancelled  ◄── (also from AwaitingPayment)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Committed with stock reserved; the intent has not settled yet.
    AwaitingPayment,

    /// The processor reported a successful charge.
    Paid,

    /// The last attempt was declined. The shopper may retry on the same intent.
    PaymentFailed,

    /// Abandoned or cancelled. Reserved stock has been released.
    Cancelled,
}

impl OrderStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_payment" => Some(OrderStatus::AwaitingPayment),
            "paid" => Some(OrderStatus::Paid),
            "payment_failed" => Some(OrderStatus::PaymentFailed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the order still holds reserved stock that a cancellation must return.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, OrderStatus::AwaitingPayment | OrderStatus::PaymentFailed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (AwaitingPayment, Paid)
                | (AwaitingPayment, PaymentFailed)
                | (AwaitingPayment, Cancelled)
                | (PaymentFailed, Paid)
                | (PaymentFailed, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            AwaitingPayment => vec![Paid, PaymentFailed, Cancelled],
            PaymentFailed => vec![Paid, Cancelled],
            Paid | Cancelled => vec![],
        }
    }
}
