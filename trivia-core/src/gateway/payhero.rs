use super::PaymentGateway;
use crate::config::GatewayConfig;
use crate::error::{PaymentError, Result};
use crate::request::{DepositRequest, WithdrawalRequest};
use crate::types::{DepositReceipt, TransactionReference, TransactionStatus, WithdrawalReceipt};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DEPOSIT_FALLBACK: &str = "Payment initiation failed";
const WITHDRAWAL_FALLBACK: &str = "Withdrawal initiation failed";

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// HTTP client for the PayHero v2 API.
///
/// Basic credentials are encoded once here and sent as a default header on
/// every request for the lifetime of the client.
pub struct PayHeroClient {
    client: Client,
    config: GatewayConfig,
}

impl PayHeroClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;

        let credentials = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            config.api_username, config.api_password
        ));
        let mut auth = HeaderValue::from_str(&format!("Basic {}", credentials))
            .map_err(|_| PaymentError::config("Invalid characters in gateway credentials"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PaymentError::unreachable(e.to_string()))?;

        read_response(response, fallback).await
    }
}

#[async_trait]
impl PaymentGateway for PayHeroClient {
    async fn initiate_deposit(&self, request: &DepositRequest) -> Result<DepositReceipt> {
        tracing::debug!(
            "Initiating STK push: amount={}, phone={}, channel={}, external_reference={}",
            request.amount,
            request.phone_number,
            request.channel_id,
            request.external_reference
        );

        match self
            .post_json::<_, DepositReceipt>("payments", request, DEPOSIT_FALLBACK)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    "STK push accepted: reference={}, status={}",
                    receipt.reference,
                    receipt.status
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("STK push failed: {}", e);
                Err(e)
            }
        }
    }

    async fn initiate_withdrawal(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt> {
        tracing::debug!(
            "Initiating withdrawal: amount={}, phone={}, channel={}, external_reference={}",
            request.amount,
            request.phone_number,
            request.channel_id,
            request.external_reference
        );

        match self
            .post_json::<_, WithdrawalReceipt>("withdraw", request, WITHDRAWAL_FALLBACK)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    "Withdrawal accepted: reference={}, status={}",
                    receipt.merchant_reference,
                    receipt.status
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("Withdrawal failed: {}", e);
                Err(e)
            }
        }
    }

    async fn query_status(&self, reference: &TransactionReference) -> Result<TransactionStatus> {
        tracing::debug!("Checking transaction status for reference: {}", reference);

        let url = self.config.endpoint("transaction-status");
        let response = self
            .client
            .get(&url)
            .query(&[("reference", reference.as_str())])
            .send()
            .await
            .map_err(|e| PaymentError::unreachable(e.to_string()))?;

        let fallback = format!("Status check failed (HTTP {})", response.status().as_u16());
        let body: StatusResponse = read_response(response, &fallback).await?;
        TransactionStatus::from_provider(&body.status).map_err(PaymentError::malformed)
    }
}

async fn read_response<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = provider_error_message(&body).unwrap_or_else(|| fallback.to_string());
        return Err(PaymentError::request_failed(status.as_u16(), message));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PaymentError::unreachable(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| PaymentError::malformed(e.to_string()))
}

/// Pull a human-readable message out of a provider error body.
fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let message = value
        .get("message")
        .or_else(|| value.get("error_message"))
        .and_then(|m| m.as_str())
        .or_else(|| match value.get("error") {
            Some(serde_json::Value::String(s)) => Some(s.as_str()),
            Some(obj) => obj.get("message").and_then(|m| m.as_str()),
            None => None,
        })?;

    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
