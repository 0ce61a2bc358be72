// ============================================================================
// Persistence - Order Repository port and its backings
// ============================================================================
//
// - rows       - row types for `orders` / `order_items` and their mappers
// - postgres   - sqlx/PostgreSQL implementation
// - in_memory  - in-process implementation keeping every saved version
//
// ============================================================================

mod in_memory;
mod postgres;
mod rows;

use async_trait::async_trait;

use crate::domain::order::Order;

pub use in_memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use rows::{OrderItemRow, OrderRow};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository operation timed out")]
    Timeout,

    #[error("Stored order {order_id} is corrupt: {reason}")]
    Corrupt { order_id: String, reason: String },

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Key-by-id storage of the order aggregate.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Upsert by `order_id`, replacing every mutable field and the items.
    /// Atomic per call.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Latest persisted version.
    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError>;

    /// Liveness check used by `/health`.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
