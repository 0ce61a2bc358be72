use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::aggregate::Order;
use super::errors::OrchestrationError;
use super::requests::ValidOrderRequest;
use super::responses::OrderResponse;
use super::value_objects::OrderStatus;
use crate::clients::{
    ClientError, InventoryClient, PaymentClient, PaymentCompensator, PaymentRequest,
    PaymentResponse,
};
use crate::metrics::Metrics;
use crate::persistence::{OrderRepository, RepositoryError};
use crate::telemetry::{InboundContext, PropagationContext, Span, SpanContext, SpanStatus, Tracer};

// ============================================================================
// Order Orchestrator
// ============================================================================
//
// Drives one submission through the state machine:
//
//   CREATED ──inventory ok──> INVENTORY_CONFIRMED ──payment ok──> COMPLETED
//      │                             │
//      └──> FAILED                   ├──> PAYMENT_FAILED (rejected)
//                                    └──> FAILED (transport error)
//
// Every transition is persisted before the next outbound call. Every persisted
// version carries the trace/span ids of the `process_order` span.
//
// ============================================================================

pub struct OrderOrchestrator {
    repository: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryClient>,
    payment: Arc<dyn PaymentClient>,
    metrics: Arc<Metrics>,
    tracer: Tracer,
    principal: Option<String>,
    compensator: Option<Arc<dyn PaymentCompensator>>,
}

impl OrderOrchestrator {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryClient>,
        payment: Arc<dyn PaymentClient>,
        metrics: Arc<Metrics>,
        tracer: Tracer,
    ) -> Self {
        Self {
            repository,
            inventory,
            payment,
            metrics,
            tracer,
            principal: None,
            compensator: None,
        }
    }

    /// Name written to `createdBy` / `lastModifiedBy`.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_compensator(mut self, compensator: Arc<dyn PaymentCompensator>) -> Self {
        self.compensator = Some(compensator);
        self
    }

    /// Run a validated submission to a terminal state.
    ///
    /// Never fails: logical, transport and repository errors all end up in the
    /// returned envelope.
    pub async fn process_order(
        &self,
        request: ValidOrderRequest,
        inbound: InboundContext,
    ) -> OrderResponse {
        let started = Instant::now();
        let mut span = self.tracer.start_span("process_order", inbound.parent.as_ref());
        let trace_id = span.context().trace_id().to_string();

        let log_span = tracing::info_span!(
            "process_order",
            trace_id = %trace_id,
            customer_id = %request.customer_id,
            order_id = tracing::field::Empty,
        );

        async move {
            span.set_attribute("customer.id", &request.customer_id);
            span.set_attribute("order.item_count", request.items.len());

            let mut order = Order::create(&request, Utc::now());
            tracing::Span::current().record("order_id", tracing::field::display(&order.order_id));
            span.set_attribute("order.id", &order.order_id);

            tracing::info!(items = order.items.len(), "Processing order");

            let outcome = self
                .orchestrate(&mut order, &span, inbound.request_id.as_deref())
                .await;

            let response = match outcome {
                Ok(()) => {
                    span.set_status(SpanStatus::Ok);
                    self.metrics.record_order_processing(
                        "success",
                        &order.customer_id,
                        started.elapsed().as_secs_f64(),
                    );
                    tracing::info!(
                        total_amount = %order.total_amount,
                        payment_id = order.payment_id.as_deref().unwrap_or_default(),
                        "✅ Order completed"
                    );
                    OrderResponse::success(&order)
                }
                Err(error) => {
                    let status_label = if error.is_logical() { "failed" } else { "error" };
                    let response = self.fail(&mut order, &mut span, error).await;
                    self.metrics.record_order_processing(
                        status_label,
                        &order.customer_id,
                        started.elapsed().as_secs_f64(),
                    );
                    response
                }
            };

            span.end();
            response
                .with_trace_id(trace_id)
                .with_request_id(inbound.request_id)
        }
        .instrument(log_span)
        .await
    }

    /// Latest persisted version of an order.
    pub async fn get_order(
        &self,
        order_id: &str,
        parent: Option<&SpanContext>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut span = self.tracer.start_span("get_order", parent);
        span.set_attribute("order.id", order_id);

        let result = self.repository.find_by_id(order_id).await;
        match &result {
            Ok(Some(_)) => span.set_status(SpanStatus::Ok),
            Ok(None) => span.set_status(SpanStatus::Error("Order not found".to_string())),
            Err(e) => {
                span.set_status(SpanStatus::Error(e.to_string()));
                span.record_exception(e);
                tracing::error!(order_id, error = %e, "Order lookup failed");
            }
        }
        span.end();
        result
    }

    async fn orchestrate(
        &self,
        order: &mut Order,
        span: &Span,
        request_id: Option<&str>,
    ) -> Result<(), OrchestrationError> {
        self.persist(order, span.context(), None).await?;
        self.metrics.record_order_created(&order.customer_id);

        self.check_inventory(order, span, request_id).await?;

        let previous = order.transition_to(OrderStatus::InventoryConfirmed)?;
        order.calculate_total_amount();
        self.persist(order, span.context(), Some(previous)).await?;

        let payment_id = self.process_payment(order, span, request_id).await?;

        let previous = order.complete(payment_id.clone())?;
        if let Err(e) = self.persist(order, span.context(), Some(previous)).await {
            self.compensate(&order.order_id, &payment_id).await;
            return Err(e.into());
        }
        Ok(())
    }

    // ========================================================================
    // Downstream Calls
    // ========================================================================

    async fn check_inventory(
        &self,
        order: &Order,
        parent: &Span,
        request_id: Option<&str>,
    ) -> Result<(), OrchestrationError> {
        let mut span = self.tracer.start_child("check_inventory", parent);
        span.set_attribute("code.function", "check_inventory");
        span.set_attribute("order.id", &order.order_id);
        let context = PropagationContext::new(span.context().clone(), request_id.map(str::to_string));

        let started = Instant::now();
        let result = self.check_items(order, &mut span, &context).await;
        self.metrics.record_inventory_check(started.elapsed().as_secs_f64());

        end_call_span(span, &result);
        result
    }

    // Items are checked in request order; the first unavailable one stops the batch.
    async fn check_items(
        &self,
        order: &Order,
        span: &mut Span,
        context: &PropagationContext,
    ) -> Result<(), OrchestrationError> {
        for item in &order.items {
            span.set_attribute("product.id", &item.product_id);
            span.set_attribute("product.quantity", item.quantity);

            let available = self
                .inventory
                .check(context, &item.product_id, item.quantity)
                .await
                .map_err(|source| OrchestrationError::Inventory { source })?;

            tracing::debug!(
                product_id = %item.product_id,
                quantity = item.quantity,
                available,
                "Inventory check answered"
            );

            if !available {
                span.set_attribute("inventory.available", false);
                return Err(OrchestrationError::InventoryUnavailable {
                    product_id: item.product_id.clone(),
                });
            }
        }
        span.set_attribute("inventory.available", true);
        Ok(())
    }

    async fn process_payment(
        &self,
        order: &Order,
        parent: &Span,
        request_id: Option<&str>,
    ) -> Result<String, OrchestrationError> {
        let mut span = self.tracer.start_child("process_payment", parent);
        let request = PaymentRequest::new(order.order_id.clone(), order.total_amount);
        span.set_attribute("code.function", "process_payment");
        span.set_attribute("order.id", &order.order_id);
        span.set_attribute("payment.amount", request.amount);
        span.set_attribute("payment.currency", &request.currency);
        let context = PropagationContext::new(span.context().clone(), request_id.map(str::to_string));

        let started = Instant::now();
        let response = self.payment.process(&context, &request).await;
        let status_label = match &response {
            Ok(Some(body)) => body.status_label(),
            _ => "ERROR",
        };
        self.metrics
            .record_payment(status_label, started.elapsed().as_secs_f64());

        let result = payment_outcome(response);
        if let Ok(payment_id) = &result {
            span.set_attribute("payment.id", payment_id);
        }
        span.set_attribute("payment.status", status_label);

        end_call_span(span, &result);
        result
    }

    async fn compensate(&self, order_id: &str, payment_id: &str) {
        let Some(compensator) = &self.compensator else {
            tracing::error!(
                order_id,
                payment_id,
                "❌ Payment captured but the completed order could not be stored; no compensator configured"
            );
            return;
        };

        match compensator.compensate(order_id, payment_id).await {
            Ok(()) => tracing::warn!(order_id, payment_id, "↩️ Payment compensated"),
            Err(e) => tracing::error!(
                order_id,
                payment_id,
                error = %e,
                "❌ Payment compensation failed"
            ),
        }
    }

    // ========================================================================
    // Persistence and Failure Handling
    // ========================================================================

    async fn persist(
        &self,
        order: &mut Order,
        context: &SpanContext,
        from: Option<OrderStatus>,
    ) -> Result<(), RepositoryError> {
        order.stamp(context, self.principal.as_deref());
        order.version += 1;

        if let Err(e) = self.repository.save(order).await {
            order.version -= 1;
            tracing::error!(
                order_id = %order.order_id,
                status = %order.status,
                error = %e,
                "Failed to persist order"
            );
            return Err(e);
        }

        if let Some(from) = from {
            self.metrics
                .record_status_transition(from.as_str(), order.status.as_str());
        }
        tracing::info!(
            order_id = %order.order_id,
            from = from.map(|s| s.as_str()).unwrap_or("NONE"),
            to = %order.status,
            version = order.version,
            "Order persisted"
        );
        Ok(())
    }

    async fn fail(
        &self,
        order: &mut Order,
        span: &mut Span,
        error: OrchestrationError,
    ) -> OrderResponse {
        let code = error.code();
        let reason = error.to_string();

        span.set_attribute("failure.reason", &reason);
        span.set_attribute("error.code", code);
        span.set_status(SpanStatus::Error(reason.clone()));
        span.record_exception(&error);

        if error.is_logical() {
            tracing::warn!(code, reason = %reason, "Order rejected");
        } else {
            tracing::error!(code, error = %error, "❌ Error processing order");
            self.metrics.record_order_error(code);
        }

        if let Some(terminal) = error.terminal_status() {
            self.metrics.record_order_failed(&reason, &order.customer_id);
            self.settle(order, span.context(), terminal).await;
        }

        let response = OrderResponse::failure(error.response_message());
        if order.is_persisted() {
            response.with_order_id(order.order_id.clone())
        } else {
            response
        }
    }

    // Leave the order in its terminal status; a failure here keeps the last
    // persisted state and is only logged.
    async fn settle(&self, order: &mut Order, context: &SpanContext, terminal: OrderStatus) {
        if !order.is_persisted() {
            return;
        }

        match order.transition_to(terminal) {
            Ok(previous) => {
                if self.persist(order, context, Some(previous)).await.is_err() {
                    self.metrics.record_order_error("INTERNAL_ERROR");
                }
            }
            Err(e) => tracing::error!(
                order_id = %order.order_id,
                error = %e,
                "Cannot move order to its terminal status"
            ),
        }
    }
}

/// Map a payment answer to the payment id of a captured payment, or the
/// failure it represents.
fn payment_outcome(
    response: Result<Option<PaymentResponse>, ClientError>,
) -> Result<String, OrchestrationError> {
    match response {
        Err(source) => Err(OrchestrationError::Payment { source }),
        Ok(None) => Err(OrchestrationError::PaymentRejected {
            status: None,
            error_message: None,
        }),
        Ok(Some(body)) if body.is_success() => body
            .payment_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| OrchestrationError::Payment {
                source: ClientError::Malformed("SUCCESSFUL payment without paymentId".to_string()),
            }),
        Ok(Some(body)) => Err(OrchestrationError::PaymentRejected {
            status: body.status,
            error_message: body.error_message,
        }),
    }
}

fn end_call_span<T>(mut span: Span, result: &Result<T, OrchestrationError>) {
    match result {
        Ok(_) => span.set_status(SpanStatus::Ok),
        Err(e) => {
            span.set_status(SpanStatus::Error(e.to_string()));
            if !e.is_logical() {
                span.record_exception(e);
            }
        }
    }
    span.end();
}
