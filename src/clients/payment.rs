use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{endpoint, parse_base_url, ClientError};
use crate::domain::order::PaymentStatus;
use crate::telemetry::PropagationContext;

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
}

impl PaymentRequest {
    pub fn new(order_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            order_id: order_id.into(),
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl PaymentResponse {
    pub fn is_success(&self) -> bool {
        self.status == Some(PaymentStatus::Successful)
    }

    /// Label for `payment_processing_time_seconds{status}`.
    pub fn status_label(&self) -> &'static str {
        self.status.map_or("ERROR", |s| s.as_str())
    }
}

/// "Process payment" endpoint of the payment service.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// `Ok(None)` when the service answered without a body.
    async fn process(
        &self,
        context: &PropagationContext,
        request: &PaymentRequest,
    ) -> Result<Option<PaymentResponse>, ClientError>;
}

/// Optional hook to undo a captured payment whose order could not be stored.
#[async_trait]
pub trait PaymentCompensator: Send + Sync {
    async fn compensate(&self, order_id: &str, payment_id: &str) -> Result<(), ClientError>;
}

pub fn parse_payment_body(body: &[u8]) -> Result<Option<PaymentResponse>, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
}

pub struct HttpPaymentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPaymentClient {
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
impl PaymentClient for HttpPaymentClient {
    async fn process(
        &self,
        context: &PropagationContext,
        request: &PaymentRequest,
    ) -> Result<Option<PaymentResponse>, ClientError> {
        let url = endpoint(&self.base_url, &["process"])?;

        tracing::debug!(
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            "Requesting payment"
        );

        let mut builder = self.http.post(url).json(request);
        for (name, value) in context.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        parse_payment_body(&body)
    }
}
