use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{endpoint, parse_base_url, ClientError};
use crate::telemetry::PropagationContext;

/// Body of `GET /check/{productId}?quantity={n}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryCheckResult {
    #[serde(default)]
    pub available: Option<bool>,
}

/// Per-product availability check.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// `Ok(false)` covers both "not in stock" and an empty/null answer;
    /// only transport and decode failures are errors.
    async fn check(
        &self,
        context: &PropagationContext,
        product_id: &str,
        quantity: u32,
    ) -> Result<bool, ClientError>;
}

/// Empty body, JSON `null` or a missing `available` field mean unavailable.
pub fn parse_inventory_body(body: &[u8]) -> Result<bool, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(false);
    }

    let result: Option<InventoryCheckResult> =
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(result.is_some_and(|r| r.available == Some(true)))
}

pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpInventoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn check(
        &self,
        context: &PropagationContext,
        product_id: &str,
        quantity: u32,
    ) -> Result<bool, ClientError> {
        let mut url = endpoint(&self.base_url, &["check", product_id])?;
        url.query_pairs_mut()
            .append_pair("quantity", &quantity.to_string());

        tracing::debug!(product_id = %product_id, quantity, url = %url, "Checking inventory");

        let mut request = self.http.get(url);
        for (name, value) in context.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        parse_inventory_body(&body)
    }
}
