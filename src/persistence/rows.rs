use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::RepositoryError;
use crate::domain::order::{Order, OrderItem, OrderStatus};

// ============================================================================
// Row types - `orders` and `order_items`
// ============================================================================

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: String,
    pub customer_id: String,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_id: String,
    pub position: i32,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

impl OrderRow {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            total_amount: order.total_amount,
            status: order.status.as_str().to_string(),
            payment_id: order.payment_id.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            created_by: order.created_by.clone(),
            last_modified_by: order.last_modified_by.clone(),
            trace_id: order.trace_id.clone(),
            span_id: order.span_id.clone(),
            version: order.version,
        }
    }

    /// Rebuild the aggregate; `items` must already be in position order.
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
        let corrupt = |reason: String| RepositoryError::Corrupt {
            order_id: self.order_id.clone(),
            reason,
        };

        let status: OrderStatus = self.status.parse().map_err(|e| corrupt(format!("{e}")))?;
        let items = items
            .into_iter()
            .map(|row| row.into_item().map_err(corrupt))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            order_id: self.order_id,
            version: self.version,
            customer_id: self.customer_id,
            items,
            total_amount: self.total_amount,
            status,
            payment_id: self.payment_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
            last_modified_by: self.last_modified_by,
            trace_id: self.trace_id,
            span_id: self.span_id,
        })
    }
}

impl OrderItemRow {
    pub fn from_item(order_id: &str, position: usize, item: &OrderItem) -> Result<Self, RepositoryError> {
        let out_of_range = |field: &str| RepositoryError::Corrupt {
            order_id: order_id.to_string(),
            reason: format!("{field} out of range"),
        };

        Ok(Self {
            order_id: order_id.to_string(),
            position: i32::try_from(position).map_err(|_| out_of_range("position"))?,
            product_id: item.product_id.clone(),
            quantity: i32::try_from(item.quantity).map_err(|_| out_of_range("quantity"))?,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
            product_name: item.product_name.clone(),
            product_category: item.product_category.clone(),
        })
    }

    fn into_item(self) -> Result<OrderItem, String> {
        let quantity = u32::try_from(self.quantity)
            .map_err(|_| format!("negative quantity {} for {}", self.quantity, self.product_id))?;

        Ok(OrderItem {
            product_id: self.product_id,
            quantity,
            unit_price: self.unit_price,
            subtotal: self.subtotal,
            product_name: self.product_name,
            product_category: self.product_category,
        })
    }
}

/// Row images of one order version.
pub fn to_rows(order: &Order) -> Result<(OrderRow, Vec<OrderItemRow>), RepositoryError> {
    let items = order
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| OrderItemRow::from_item(&order.order_id, position, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((OrderRow::from_order(order), items))
}
