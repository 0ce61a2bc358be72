use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::OrderError;

// ============================================================================
// Order Requests - inbound submission and its validated form
// ============================================================================

/// Body of `POST /orders` as received. Every field is optional here so that
/// missing values surface as validation violations instead of parse errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_id: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
    pub customer_note: Option<String>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
}

/// A request that satisfied every schema rule. Only this type enters the
/// orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrderRequest {
    pub customer_id: String,
    pub items: Vec<ValidOrderLine>,
    pub customer_note: Option<String>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrderLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

fn minimum_unit_price() -> Decimal {
    Decimal::new(1, 2)
}

impl OrderRequest {
    /// Check cardinalities and numeric bounds, collecting every violation.
    pub fn validate(&self) -> Result<ValidOrderRequest, Vec<String>> {
        let mut violations = Vec::new();

        let customer_id = match self.customer_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                violations.push(OrderError::MissingCustomerId.to_string());
                String::new()
            }
        };

        let items = self.items.as_deref().unwrap_or_default();
        if items.is_empty() {
            violations.push(OrderError::EmptyItems.to_string());
        }

        let mut lines = Vec::with_capacity(items.len());
        let mut order_total = Some(Decimal::ZERO);
        for (index, item) in items.iter().enumerate() {
            let product_id = match item.product_id.as_deref() {
                Some(id) if !id.trim().is_empty() => Some(id.to_string()),
                _ => {
                    violations.push(format!("items[{index}].productId: Product ID is required"));
                    None
                }
            };

            let quantity = match item.quantity {
                None => {
                    violations.push(format!("items[{index}].quantity: Quantity is required"));
                    None
                }
                Some(q) => match u32::try_from(q) {
                    Ok(q) if q >= 1 => Some(q),
                    _ => {
                        violations.push(format!(
                            "items[{index}].quantity: Quantity must be at least 1"
                        ));
                        None
                    }
                },
            };

            let unit_price = match item.unit_price {
                None => {
                    violations.push(format!("items[{index}].unitPrice: Unit Price is required"));
                    None
                }
                Some(price) if price < minimum_unit_price() => {
                    violations.push(format!(
                        "items[{index}].unitPrice: Unit Price must be at least 0.01"
                    ));
                    None
                }
                Some(price) => Some(price),
            };

            if let (Some(product_id), Some(quantity), Some(unit_price)) =
                (product_id, quantity, unit_price)
            {
                // line and order totals must stay representable as Decimal
                let Some(line_total) = unit_price.checked_mul(Decimal::from(quantity)) else {
                    violations.push(format!("items[{index}].unitPrice: line total out of range"));
                    continue;
                };
                order_total = order_total.and_then(|total| total.checked_add(line_total));
                if order_total.is_none() {
                    violations.push(format!("items[{index}].unitPrice: order total out of range"));
                    order_total = Some(Decimal::ZERO);
                    continue;
                }

                lines.push(ValidOrderLine {
                    product_id,
                    quantity,
                    unit_price,
                });
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ValidOrderRequest {
            customer_id,
            items: lines,
            customer_note: self.customer_note.clone(),
            promo_code: self.promo_code.clone(),
        })
    }
}
