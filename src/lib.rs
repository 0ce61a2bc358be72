// ============================================================================
// Order Service - order orchestration over inventory and payment services
// ============================================================================
//
// - domain       - Order aggregate, state machine and orchestrator
// - clients      - inventory / payment ports and their HTTP adapters
// - persistence  - order repository port, PostgreSQL and in-memory backings
// - http         - public API (actix-web)
// - metrics      - Prometheus registry and the admin listener (/metrics, /health)
// - telemetry    - logging, W3C trace context and spans
//
// ============================================================================

pub mod clients;
pub mod config;
pub mod domain;
pub mod health;
pub mod http;
pub mod metrics;
pub mod persistence;
pub mod telemetry;
