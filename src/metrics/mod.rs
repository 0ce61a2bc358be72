// Private module declaration
mod server;

use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
};

// Re-export for public API
pub use server::{configure_admin_routes, start_admin_server, AdminState};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order submissions (created, failed, unexpected errors)
// - End-to-end processing latency
// - Inventory and payment call latency
// - State machine transitions
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

const LATENCY_BUCKETS: [f64; 10] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Central metrics registry for the service
pub struct Metrics {
    registry: Registry,

    // Order Outcome Metrics
    pub orders_created: IntCounterVec,
    pub orders_failed: IntCounterVec,
    pub order_errors: IntCounterVec,
    pub order_processing_duration: HistogramVec,

    // Downstream Call Metrics
    pub inventory_check_duration: Histogram,
    pub payment_processing_duration: HistogramVec,

    // State Machine Metrics
    pub status_transitions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Outcome Metrics
        let orders_created = IntCounterVec::new(
            Opts::new("order_created_total", "Accepted order submissions"),
            &["customer_id"],
        )?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_failed = IntCounterVec::new(
            Opts::new("order_failed_total", "Orders that ended in a failure state"),
            &["reason", "customer_id"],
        )?;
        registry.register(Box::new(orders_failed.clone()))?;

        let order_errors = IntCounterVec::new(
            Opts::new("order_errors_total", "Unexpected errors while processing orders"),
            &["error_type"],
        )?;
        registry.register(Box::new(order_errors.clone()))?;

        let order_processing_duration = HistogramVec::new(
            HistogramOpts::new("order_processing_time_seconds", "End-to-end order processing time")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["status", "customer_id"],
        )?;
        registry.register(Box::new(order_processing_duration.clone()))?;

        // Downstream Call Metrics
        let inventory_check_duration = Histogram::with_opts(
            HistogramOpts::new("inventory_check_time_seconds", "Inventory check batch duration")
                .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(inventory_check_duration.clone()))?;

        let payment_processing_duration = HistogramVec::new(
            HistogramOpts::new("payment_processing_time_seconds", "Payment call duration")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["status"],
        )?;
        registry.register(Box::new(payment_processing_duration.clone()))?;

        // State Machine Metrics
        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Persisted order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_failed,
            order_errors,
            order_processing_duration,
            inventory_check_duration,
            payment_processing_duration,
            status_transitions,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self, customer_id: &str) {
        self.orders_created.with_label_values(&[customer_id]).inc();
    }

    pub fn record_order_failed(&self, reason: &str, customer_id: &str) {
        self.orders_failed.with_label_values(&[reason, customer_id]).inc();
    }

    pub fn record_order_error(&self, error_type: &str) {
        self.order_errors.with_label_values(&[error_type]).inc();
    }

    pub fn record_order_processing(&self, status: &str, customer_id: &str, duration_secs: f64) {
        self.order_processing_duration
            .with_label_values(&[status, customer_id])
            .observe(duration_secs);
    }

    pub fn record_inventory_check(&self, duration_secs: f64) {
        self.inventory_check_duration.observe(duration_secs);
    }

    pub fn record_payment(&self, status: &str, duration_secs: f64) {
        self.payment_processing_duration
            .with_label_values(&[status])
            .observe(duration_secs);
    }

    pub fn record_status_transition(&self, from: &str, to: &str) {
        self.status_transitions.with_label_values(&[from, to]).inc();
    }

    /// Current value of a counter series, for assertions and diagnostics.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.name() == name)
            .flat_map(|family| family.metric.iter())
            .filter(|metric| {
                labels.iter().all(|(key, value)| {
                    metric
                        .label
                        .iter()
                        .any(|pair| pair.name() == *key && pair.value() == *value)
                })
            })
            .map(|metric| metric.counter.value.unwrap_or(0.0) as u64)
            .sum()
    }

    /// Number of observations of a histogram series.
    pub fn histogram_count(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.name() == name)
            .flat_map(|family| family.metric.iter())
            .filter(|metric| {
                labels.iter().all(|(key, value)| {
                    metric
                        .label
                        .iter()
                        .any(|pair| pair.name() == *key && pair.value() == *value)
                })
            })
            .map(|metric| metric.histogram.sample_count.unwrap_or(0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_created("c1");
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_order_created() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_created("c1");
        metrics.record_order_created("c1");
        metrics.record_order_created("c2");

        assert_eq!(metrics.counter_value("order_created_total", &[("customer_id", "c1")]), 2);
        assert_eq!(metrics.counter_value("order_created_total", &[]), 3);
    }

    #[test]
    fn test_record_order_failed() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_failed("Insufficient inventory", "c1");

        assert_eq!(
            metrics.counter_value(
                "order_failed_total",
                &[("reason", "Insufficient inventory"), ("customer_id", "c1")]
            ),
            1
        );
        assert_eq!(
            metrics.counter_value("order_failed_total", &[("reason", "Payment processing failed")]),
            0
        );
    }

    #[test]
    fn test_timers() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_processing("success", "c1", 0.05);
        metrics.record_inventory_check(0.01);
        metrics.record_payment("SUCCESSFUL", 0.02);

        assert_eq!(
            metrics.histogram_count(
                "order_processing_time_seconds",
                &[("status", "success"), ("customer_id", "c1")]
            ),
            1
        );
        assert_eq!(metrics.histogram_count("inventory_check_time_seconds", &[]), 1);
        assert_eq!(
            metrics.histogram_count("payment_processing_time_seconds", &[("status", "SUCCESSFUL")]),
            1
        );
    }

    #[test]
    fn test_status_transitions() {
        let metrics = Metrics::new().unwrap();
        metrics.record_status_transition("CREATED", "INVENTORY_CONFIRMED");
        metrics.record_status_transition("INVENTORY_CONFIRMED", "COMPLETED");

        let gathered = metrics.registry.gather();
        let transitions = gathered
            .iter()
            .find(|m| m.name() == "order_status_transitions_total")
            .unwrap();
        assert_eq!(transitions.metric.len(), 2);
    }
}
