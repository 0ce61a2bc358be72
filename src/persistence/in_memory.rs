use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{OrderRepository, RepositoryError};
use crate::domain::order::Order;

/// Process-local repository. Besides the latest version it keeps every saved
/// version of each order, oldest first.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    versions: RwLock<HashMap<String, Vec<Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every version saved for `order_id`, in save order.
    pub async fn history(&self, order_id: &str) -> Vec<Order> {
        self.versions
            .read()
            .await
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn order_ids(&self) -> Vec<String> {
        self.versions.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut versions = self.versions.write().await;
        let history = versions.entry(order.order_id.clone()).or_default();

        let mut stored = order.clone();
        // createdAt / createdBy are fixed by the first save
        if let Some(first) = history.first() {
            stored.created_at = first.created_at;
            stored.created_by = first.created_by.clone();
        }
        history.push(stored);

        tracing::debug!(
            order_id = %order.order_id,
            status = %order.status,
            version = order.version,
            "Stored order version in memory"
        );
        Ok(())
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .versions
            .read()
            .await
            .get(order_id)
            .and_then(|history| history.last().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderStatus, ValidOrderLine, ValidOrderRequest};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order() -> Order {
        let request = ValidOrderRequest {
            customer_id: "c1".into(),
            items: vec![ValidOrderLine {
                product_id: "A".into(),
                quantity: 1,
                unit_price: Decimal::ONE,
            }],
            customer_note: None,
            promo_code: None,
        };
        Order::create(&request, Utc::now())
    }

    #[tokio::test]
    async fn test_save_and_find_latest() {
        let repo = InMemoryOrderRepository::new();
        let mut order = order();

        repo.save(&order).await.unwrap();
        order.transition_to(OrderStatus::InventoryConfirmed).unwrap();
        repo.save(&order).await.unwrap();

        let found = repo.find_by_id(&order.order_id).await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::InventoryConfirmed);
        assert_eq!(repo.history(&order.order_id).await.len(), 2);
        assert_eq!(repo.order_ids().await, vec![order.order_id.clone()]);
    }

    #[tokio::test]
    async fn test_find_unknown_order() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
        assert!(repo.order_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_created_at_is_immutable() {
        let repo = InMemoryOrderRepository::new();
        let mut order = order();
        let created_at = order.created_at;
        repo.save(&order).await.unwrap();

        order.created_at = created_at + chrono::Duration::seconds(30);
        repo.save(&order).await.unwrap();

        let found = repo.find_by_id(&order.order_id).await.unwrap().unwrap();
        assert_eq!(found.created_at, created_at);
    }
}
