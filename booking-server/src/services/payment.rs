//! Payment collaborator
//!
//! The booking flow only needs two operations from the payment service:
//! charge a deposit and refund it. Charge idempotency for a repeated
//! idempotency key is the collaborator's contract; the coordinator does
//! not re-validate it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::utils::AppResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_token: String,
    pub idempotency_key: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    pub payment_intent_id: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub payment_intent_id: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub refund_id: String,
    pub status: String,
}

/// Payment collaborator errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment service unreachable: {0}")]
    Unreachable(String),

    #[error("payment declined: {0}")]
    Declined(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResponse, PaymentError>;
    async fn refund(&self, request: RefundRequest) -> Result<RefundResponse, PaymentError>;
}

// ── HTTP gateway ────────────────────────────────────────────────────

/// Gateway talking to the payment service over HTTP
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, PaymentError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Declined(format!(
                "payment service returned {}",
                response.status()
            )));
        }

        let envelope: AppResponse<Resp> = response
            .json()
            .await
            .map_err(|e| PaymentError::Unreachable(format!("invalid payment response: {e}")))?;

        match envelope.data {
            Some(data) if envelope.success => Ok(data),
            _ => Err(PaymentError::Declined(
                envelope
                    .error
                    .unwrap_or_else(|| "payment service rejected the request".to_string()),
            )),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResponse, PaymentError> {
        self.post("/api/payments/charge", &request).await
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundResponse, PaymentError> {
        self.post("/api/payments/refund", &request).await
    }
}

// ── Dev gateway ─────────────────────────────────────────────────────

/// Simulated gateway for development: every charge and refund succeeds
/// with a fake reference, mirroring a sandbox payment provider.
#[derive(Debug, Default)]
pub struct DevPaymentGateway;

impl DevPaymentGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for DevPaymentGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResponse, PaymentError> {
        let payment_intent_id = format!("pi_dev_{}", Uuid::new_v4().simple());
        info!(
            amount = %request.amount,
            currency = %request.currency,
            payment_intent_id = %payment_intent_id,
            "DEV MODE: simulated charge"
        );
        Ok(ChargeResponse {
            payment_intent_id,
            status: "captured".to_string(),
            amount: request.amount,
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundResponse, PaymentError> {
        let refund_id = format!("re_dev_{}", Uuid::new_v4().simple());
        info!(
            payment_intent_id = %request.payment_intent_id,
            refund_id = %refund_id,
            "DEV MODE: simulated refund"
        );
        Ok(RefundResponse {
            refund_id,
            status: "refunded".to_string(),
        })
    }
}
