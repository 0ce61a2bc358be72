use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::requests::ValidOrderRequest;
use super::value_objects::{OrderItem, OrderStatus};
use crate::telemetry::SpanContext;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// One aggregate for both the in-memory workflow and the stored rows; the
// persistence layer maps it to `orders` / `order_items` explicitly.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub order_id: String,
    /// Number of successful persists of this order.
    pub version: i64,

    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,

    // Trace correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl Order {
    /// Materialize a new order from a validated request.
    ///
    /// The total stays at zero until [`Order::calculate_total_amount`] runs
    /// after inventory confirmation.
    pub fn create(request: &ValidOrderRequest, now: DateTime<Utc>) -> Self {
        let items = request
            .items
            .iter()
            .map(|line| OrderItem::new(line.product_id.clone(), line.quantity, line.unit_price))
            .collect();

        Self {
            order_id: Uuid::new_v4().to_string(),
            version: 0,
            customer_id: request.customer_id.clone(),
            items,
            total_amount: Decimal::ZERO,
            status: OrderStatus::Created,
            payment_id: None,
            created_at: now,
            updated_at: now,
            created_by: None,
            last_modified_by: None,
            trace_id: None,
            span_id: None,
        }
    }

    /// Move along a state machine edge, bumping `updated_at`.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        let previous = self.status;
        self.status = next;
        self.touch(Utc::now());
        Ok(previous)
    }

    /// Record the successful payment and complete the order.
    pub fn complete(&mut self, payment_id: impl Into<String>) -> Result<OrderStatus, OrderError> {
        let previous = self.transition_to(OrderStatus::Completed)?;
        self.payment_id = Some(payment_id.into());
        Ok(previous)
    }

    /// Sum of unitPrice × quantity over all items.
    pub fn calculate_total_amount(&mut self) -> Decimal {
        self.total_amount = self.items.iter().map(OrderItem::line_total).sum();
        self.total_amount
    }

    /// Capture audit and trace identifiers right before a persist.
    pub fn stamp(&mut self, context: &SpanContext, principal: Option<&str>) {
        self.trace_id = Some(context.trace_id().to_string());
        self.span_id = Some(context.span_id().to_string());

        if let Some(principal) = principal {
            if self.version == 0 && self.created_by.is_none() {
                self.created_by = Some(principal.to_string());
            }
            self.last_modified_by = Some(principal.to_string());
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    // never moves backwards, even if the wall clock does
    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
