#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use order_service::clients::{
    ClientError, InventoryClient, PaymentClient, PaymentCompensator, PaymentRequest,
    PaymentResponse,
};
use order_service::domain::order::{
    Order, OrderItemRequest, OrderOrchestrator, OrderRequest, PaymentStatus, ValidOrderRequest,
};
use order_service::metrics::Metrics;
use order_service::persistence::{InMemoryOrderRepository, OrderRepository, RepositoryError};
use order_service::telemetry::{InMemorySpanExporter, PropagationContext, Tracer};

pub const PRINCIPAL: &str = "order-service";

// ============================================================================
// Inventory stub
// ============================================================================

#[derive(Debug, Clone)]
pub struct InventoryCall {
    pub product_id: String,
    pub quantity: u32,
    pub traceparent: String,
    pub request_id: Option<String>,
}

/// Answers `available` unless a product has a scripted answer.
#[derive(Default)]
pub struct ScriptedInventory {
    answers: Mutex<HashMap<String, Result<bool, ClientError>>>,
    calls: Mutex<Vec<InventoryCall>>,
}

impl ScriptedInventory {
    pub fn available() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(self: Arc<Self>, product_id: &str, answer: Result<bool, ClientError>) -> Arc<Self> {
        self.answers.lock().insert(product_id.to_string(), answer);
        self
    }

    pub fn calls(&self) -> Vec<InventoryCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl InventoryClient for ScriptedInventory {
    async fn check(
        &self,
        context: &PropagationContext,
        product_id: &str,
        quantity: u32,
    ) -> Result<bool, ClientError> {
        self.calls.lock().push(InventoryCall {
            product_id: product_id.to_string(),
            quantity,
            traceparent: context.span.traceparent(),
            request_id: context.request_id.clone(),
        });
        self.answers
            .lock()
            .get(product_id)
            .cloned()
            .unwrap_or(Ok(true))
    }
}

// ============================================================================
// Payment stub
// ============================================================================

#[derive(Debug, Clone)]
pub struct PaymentCall {
    pub request: PaymentRequest,
    pub traceparent: String,
}

pub struct ScriptedPayment {
    answer: Result<Option<PaymentResponse>, ClientError>,
    calls: Mutex<Vec<PaymentCall>>,
}

impl ScriptedPayment {
    pub fn new(answer: Result<Option<PaymentResponse>, ClientError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn successful(payment_id: &str) -> Arc<Self> {
        Self::new(Ok(Some(PaymentResponse {
            payment_id: Some(payment_id.to_string()),
            status: Some(PaymentStatus::Successful),
            ..Default::default()
        })))
    }

    pub fn rejected(status: Option<PaymentStatus>, error_message: &str) -> Arc<Self> {
        Self::new(Ok(Some(PaymentResponse {
            status,
            error_message: Some(error_message.to_string()),
            ..Default::default()
        })))
    }

    pub fn calls(&self) -> Vec<PaymentCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PaymentClient for ScriptedPayment {
    async fn process(
        &self,
        context: &PropagationContext,
        request: &PaymentRequest,
    ) -> Result<Option<PaymentResponse>, ClientError> {
        self.calls.lock().push(PaymentCall {
            request: request.clone(),
            traceparent: context.span.traceparent(),
        });
        self.answer.clone()
    }
}

// ============================================================================
// Repository and compensator doubles
// ============================================================================

/// In-memory repository whose n-th save (1-based) fails.
pub struct FailingRepository {
    inner: InMemoryOrderRepository,
    fail_on_save: usize,
    saves: AtomicUsize,
}

impl FailingRepository {
    pub fn failing_on(fail_on_save: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryOrderRepository::new(),
            fail_on_save,
            saves: AtomicUsize::new(0),
        })
    }

    pub async fn history(&self, order_id: &str) -> Vec<Order> {
        self.inner.history(order_id).await
    }

    pub async fn order_ids(&self) -> Vec<String> {
        self.inner.order_ids().await
    }
}

#[async_trait]
impl OrderRepository for FailingRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on_save {
            return Err(RepositoryError::Unavailable("connection reset".to_string()));
        }
        self.inner.save(order).await
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_by_id(order_id).await
    }
}

#[derive(Default)]
pub struct RecordingCompensator {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingCompensator {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PaymentCompensator for RecordingCompensator {
    async fn compensate(&self, order_id: &str, payment_id: &str) -> Result<(), ClientError> {
        self.calls
            .lock()
            .push((order_id.to_string(), payment_id.to_string()));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: OrderOrchestrator,
    pub metrics: Arc<Metrics>,
    pub spans: Arc<InMemorySpanExporter>,
}

pub fn harness(
    repository: Arc<dyn OrderRepository>,
    inventory: Arc<ScriptedInventory>,
    payment: Arc<ScriptedPayment>,
) -> Harness {
    let metrics = Arc::new(Metrics::new().expect("metrics registry"));
    let spans = Arc::new(InMemorySpanExporter::new());
    let orchestrator = OrderOrchestrator::new(
        repository,
        inventory,
        payment,
        metrics.clone(),
        Tracer::new(spans.clone()),
    )
    .with_principal(PRINCIPAL);

    Harness {
        orchestrator,
        metrics,
        spans,
    }
}

pub fn item(product_id: &str, quantity: i64, unit_price: &str) -> OrderItemRequest {
    OrderItemRequest {
        product_id: Some(product_id.to_string()),
        quantity: Some(quantity),
        unit_price: Some(unit_price.parse::<Decimal>().expect("decimal literal")),
    }
}

pub fn request(customer_id: &str, items: Vec<OrderItemRequest>) -> OrderRequest {
    OrderRequest {
        customer_id: Some(customer_id.to_string()),
        items: Some(items),
        customer_note: None,
        promo_code: None,
    }
}

pub fn valid(customer_id: &str, items: Vec<OrderItemRequest>) -> ValidOrderRequest {
    request(customer_id, items)
        .validate()
        .expect("request should be valid")
}
