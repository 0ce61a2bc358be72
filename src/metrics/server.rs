use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::Metrics;
use crate::health::{ComponentHealth, HealthStatus};
use crate::persistence::OrderRepository;

/// Shared state of the admin listener.
pub struct AdminState {
    pub metrics: Arc<Metrics>,
    pub repository: Arc<dyn OrderRepository>,
    pub service_name: String,
}

/// Mount `/metrics` and `/health`.
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

/// Start the admin HTTP server (metrics + health) on its own port.
pub async fn start_admin_server(state: web::Data<AdminState>, host: &str, port: u16) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://{}:{}/metrics", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure_admin_routes)
    })
    .bind((host, port))?
    .run()
    .await
}

async fn metrics_handler(state: web::Data<AdminState>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(state: web::Data<AdminState>) -> impl Responder {
    let repository = match state.repository.ping().await {
        Ok(()) => ComponentHealth::new("order_repository", HealthStatus::Healthy),
        Err(e) => ComponentHealth::new("order_repository", HealthStatus::Unhealthy(e.to_string())),
    };

    let overall = HealthStatus::aggregate([&repository]);
    let body = serde_json::json!({
        "status": overall.label(),
        "service": state.service_name,
        "components": [repository.to_json()],
    });

    if overall.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}
