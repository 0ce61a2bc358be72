use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// A line item owned by an order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
}

impl OrderItem {
    pub fn new(product_id: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
            subtotal: unit_price * Decimal::from(quantity),
            product_name: None,
            product_category: None,
        }
    }

    /// unitPrice × quantity, independent of the stored subtotal
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Order lifecycle states. Stored and serialized by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Validated,
    InventoryChecking,
    InventoryConfirmed,
    PaymentPending,
    PaymentProcessed,
    PaymentFailed,
    Completed,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Created,
        OrderStatus::Validated,
        OrderStatus::InventoryChecking,
        OrderStatus::InventoryConfirmed,
        OrderStatus::PaymentPending,
        OrderStatus::PaymentProcessed,
        OrderStatus::PaymentFailed,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Validated => "VALIDATED",
            OrderStatus::InventoryChecking => "INVENTORY_CHECKING",
            OrderStatus::InventoryConfirmed => "INVENTORY_CONFIRMED",
            OrderStatus::PaymentPending => "PAYMENT_PENDING",
            OrderStatus::PaymentProcessed => "PAYMENT_PROCESSED",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Cancelled
                | OrderStatus::Failed
                | OrderStatus::PaymentFailed
        )
    }

    /// Edges of the orchestration state machine.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Created, OrderStatus::InventoryConfirmed)
                | (OrderStatus::Created, OrderStatus::Failed)
                | (OrderStatus::InventoryConfirmed, OrderStatus::Completed)
                | (OrderStatus::InventoryConfirmed, OrderStatus::PaymentFailed)
                | (OrderStatus::InventoryConfirmed, OrderStatus::Failed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Status reported by the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Successful,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Successful => "SUCCESSFUL",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
