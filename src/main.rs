use actix_web::web;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use order_service::clients::{HttpInventoryClient, HttpPaymentClient};
use order_service::config::ServiceConfig;
use order_service::domain::order::OrderOrchestrator;
use order_service::metrics::{self, AdminState, Metrics};
use order_service::persistence::{OrderRepository, PostgresOrderRepository};
use order_service::telemetry::{init_logging, Tracer};
use order_service::http;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter, e.g. RUST_LOG=order_service=trace
    init_logging();

    let config = ServiceConfig::parse();
    tracing::info!("🚀 Starting {}", config.service_name);
    tracing::info!(
        inventory_url = %config.inventory_url,
        payment_url = %config.payment_url,
        "Downstream services configured"
    );

    // === 1. PostgreSQL ===
    tracing::info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_timeout())
        .connect(&config.database_url)
        .await?;

    let postgres = PostgresOrderRepository::new(pool, config.database_timeout());
    postgres.init_schema().await?;
    let repository: Arc<dyn OrderRepository> = Arc::new(postgres);

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Downstream clients ===
    let inventory = Arc::new(HttpInventoryClient::new(&config.inventory_url, config.http_timeout())?);
    let payment = Arc::new(HttpPaymentClient::new(&config.payment_url, config.http_timeout())?);

    // === 4. Orchestrator ===
    let orchestrator = web::Data::new(
        OrderOrchestrator::new(
            repository.clone(),
            inventory,
            payment,
            metrics.clone(),
            Tracer::default(),
        )
        .with_principal(config.service_name.clone()),
    );

    let admin = web::Data::new(AdminState {
        metrics,
        repository,
        service_name: config.service_name.clone(),
    });

    // === 5. API and admin listeners ===
    futures_util::future::try_join(
        http::start_api_server(orchestrator, &config.host, config.port),
        metrics::start_admin_server(admin, &config.host, config.metrics_port),
    )
    .await?;

    tracing::info!("🛑 {} stopped", config.service_name);
    Ok(())
}
