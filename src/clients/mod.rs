// ============================================================================
// Downstream Clients - Inventory and Payment ports
// ============================================================================
//
// Each port is a trait consumed by the orchestrator; the HTTP adapters inject
// the caller's trace context on every request. No retries happen here: retry
// policy belongs to the service mesh.
//
// ============================================================================

mod inventory;
mod payment;
#[cfg(test)]
mod stub_server;

use reqwest::Url;

pub use inventory::{parse_inventory_body, HttpInventoryClient, InventoryCheckResult, InventoryClient};
pub use payment::{
    parse_payment_body, HttpPaymentClient, PaymentClient, PaymentCompensator, PaymentRequest,
    PaymentResponse, DEFAULT_CURRENCY,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ClientError::Status(status.as_u16()),
            None => ClientError::Transport(e.to_string()),
        }
    }
}

/// Base URL plus path segments; segments are percent-encoded and a trailing
/// slash on the base is tolerated.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn parse_base_url(base: &str) -> Result<Url, ClientError> {
    Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))
}
