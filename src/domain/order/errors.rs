use super::value_objects::{OrderStatus, PaymentStatus};
use crate::clients::ClientError;
use crate::persistence::RepositoryError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order must contain at least one item")]
    EmptyItems,

    #[error("Customer ID is required")]
    MissingCustomerId,

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

// ============================================================================
// Orchestration Errors - one variant per failure outcome of a submission
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Insufficient inventory")]
    InventoryUnavailable { product_id: String },

    #[error("Error checking inventory")]
    Inventory {
        #[source]
        source: ClientError,
    },

    #[error("Payment processing failed")]
    PaymentRejected {
        status: Option<PaymentStatus>,
        error_message: Option<String>,
    },

    #[error("Error processing payment")]
    Payment {
        #[source]
        source: ClientError,
    },

    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Domain(#[from] OrderError),
}

impl OrchestrationError {
    pub fn code(&self) -> &'static str {
        match self {
            OrchestrationError::InventoryUnavailable { .. } => "INVENTORY_UNAVAILABLE",
            OrchestrationError::Inventory { .. } => "INVENTORY_ERROR",
            OrchestrationError::PaymentRejected { .. } => "PAYMENT_REJECTED",
            OrchestrationError::Payment { .. } => "PAYMENT_ERROR",
            OrchestrationError::Repository(_) | OrchestrationError::Domain(_) => "INTERNAL_ERROR",
        }
    }

    /// Business outcomes, as opposed to transport or internal faults.
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            OrchestrationError::InventoryUnavailable { .. }
                | OrchestrationError::PaymentRejected { .. }
        )
    }

    /// Status the order is left in when this error ends an orchestration.
    pub fn terminal_status(&self) -> Option<OrderStatus> {
        match self {
            OrchestrationError::PaymentRejected { .. } => Some(OrderStatus::PaymentFailed),
            OrchestrationError::InventoryUnavailable { .. }
            | OrchestrationError::Inventory { .. }
            | OrchestrationError::Payment { .. } => Some(OrderStatus::Failed),
            // state stays at the last successful persist
            OrchestrationError::Repository(_) | OrchestrationError::Domain(_) => None,
        }
    }

    /// Message carried by the failure response.
    pub fn response_message(&self) -> String {
        if self.is_logical() {
            self.to_string()
        } else {
            format!("Order processing failed: {}", self)
        }
    }
}
