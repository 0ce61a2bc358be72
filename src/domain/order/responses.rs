use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::Order;
use super::value_objects::{OrderItem, OrderStatus};

/// Envelope returned by `POST /orders`, for success and logical failure alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub status: OrderStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl OrderResponse {
    pub fn success(order: &Order) -> Self {
        Self {
            order_id: Some(order.order_id.clone()),
            status: order.status,
            message: "Order processed successfully".to_string(),
            items: Some(order.items.clone()),
            total_amount: Some(order.total_amount),
            created_at: Some(order.created_at),
            trace_id: None,
            request_id: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            order_id: None,
            status: OrderStatus::Failed,
            message: message.into(),
            items: None,
            total_amount: None,
            created_at: None,
            trace_id: None,
            request_id: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}
