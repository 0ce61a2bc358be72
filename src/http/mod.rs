// ============================================================================
// HTTP Adapter - POST /orders and GET /orders/{order_id}
// ============================================================================
//
// A passive translation layer: validate, extract the trace context, call the
// orchestrator. No retries, rate limiting or authentication happen here.
//
// ============================================================================

mod errors;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

pub use errors::ApiError;

use crate::domain::order::{OrderOrchestrator, OrderRequest};
use crate::telemetry::{InboundContext, REQUEST_ID_HEADER, TRACEPARENT_HEADER, TRACESTATE_HEADER};

/// Mount the order routes and the JSON error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/orders", web::post().to(submit_order))
        .route("/orders/{order_id}", web::get().to(get_order));
}

/// Start the public API listener.
pub async fn start_api_server(
    orchestrator: web::Data<OrderOrchestrator>,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("🚀 Order API listening on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(orchestrator.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}

// Unparseable bodies are validation failures, not actix's default plain text 400.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!(error = %err, "Rejected unreadable order request");
        ApiError::Validation {
            violations: vec![err.to_string()],
        }
        .into()
    })
}

async fn submit_order(
    req: HttpRequest,
    body: web::Json<OrderRequest>,
    orchestrator: web::Data<OrderOrchestrator>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner().validate().map_err(|violations| {
        tracing::warn!(?violations, "Rejected invalid order request");
        ApiError::Validation { violations }
    })?;

    let response = orchestrator
        .process_order(request, inbound_context(&req))
        .await;
    Ok(HttpResponse::Ok().json(response))
}

async fn get_order(
    req: HttpRequest,
    path: web::Path<String>,
    orchestrator: web::Data<OrderOrchestrator>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let inbound = inbound_context(&req);

    match orchestrator.get_order(&order_id, inbound.parent.as_ref()).await {
        Ok(Some(order)) => Ok(HttpResponse::Ok().json(order)),
        Ok(None) => Err(ApiError::NotFound(order_id)),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

fn inbound_context(req: &HttpRequest) -> InboundContext {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());

    InboundContext::from_headers(
        header(TRACEPARENT_HEADER),
        header(TRACESTATE_HEADER),
        header(REQUEST_ID_HEADER),
    )
}
