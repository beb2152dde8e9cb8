use crate::channels::ChannelConfig;
use crate::error::{PaymentError, Result};
use crate::phone::normalize_valid;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const DEPOSIT_REFERENCE_PREFIX: &str = "trivia_";
pub const WITHDRAWAL_REFERENCE_PREFIX: &str = "trivia_withdraw_";

/// STK push collections go through M-Pesa.
pub const DEPOSIT_PROVIDER: &str = "m-pesa";
/// Safaricom M-Pesa network code for B2C disbursements.
pub const MPESA_NETWORK_CODE: &str = "63902";
pub const WITHDRAWAL_CHANNEL: &str = "mobile";
pub const WITHDRAWAL_PAYMENT_SERVICE: &str = "b2c";

/// Body of `POST /payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: u64,
    pub phone_number: String,
    pub channel_id: String,
    pub external_reference: String,
    pub provider: String,
    pub callback_url: String,
}

/// Body of `POST /withdraw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: u64,
    pub phone_number: String,
    pub network_code: String,
    pub external_reference: String,
    pub channel: String,
    pub channel_id: String,
    pub payment_service: String,
    pub callback_url: String,
}

/// Millisecond-timestamp tokens that never repeat within a process, even
/// when two are requested in the same millisecond.
#[derive(Debug, Default)]
pub struct ReferenceGenerator {
    last: AtomicI64,
}

impl ReferenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        now.max(prev + 1)
    }

    pub fn next_reference(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_token())
    }
}

/// Whole currency units; fractions are truncated the way the provider
/// expects integer amounts.
pub fn validate_amount(amount: f64) -> Result<u64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PaymentError::invalid_amount(format!(
            "amount must be a positive number, got {}",
            amount
        )));
    }

    let whole = amount.trunc();
    if whole < 1.0 {
        return Err(PaymentError::invalid_amount(format!(
            "amount must be at least 1, got {}",
            amount
        )));
    }

    if whole >= i64::MAX as f64 {
        return Err(PaymentError::invalid_amount("amount is too large"));
    }

    Ok(whole as u64)
}

pub struct RequestBuilder {
    channels: Arc<ChannelConfig>,
    callback_url: String,
    references: ReferenceGenerator,
}

impl RequestBuilder {
    pub fn new(channels: Arc<ChannelConfig>, callback_url: impl Into<String>) -> Self {
        Self {
            channels,
            callback_url: callback_url.into(),
            references: ReferenceGenerator::new(),
        }
    }

    pub fn channels(&self) -> &ChannelConfig {
        &self.channels
    }

    pub fn deposit(&self, amount: f64, phone: &str) -> Result<DepositRequest> {
        let amount = validate_amount(amount)?;
        let phone_number = normalize_valid(phone)?;

        Ok(DepositRequest {
            amount,
            phone_number,
            channel_id: self.channels.deposit_channel_id(),
            external_reference: self.references.next_reference(DEPOSIT_REFERENCE_PREFIX),
            provider: DEPOSIT_PROVIDER.to_string(),
            callback_url: self.callback_url.clone(),
        })
    }

    pub fn withdrawal(&self, amount: f64, phone: &str) -> Result<WithdrawalRequest> {
        let amount = validate_amount(amount)?;
        let phone_number = normalize_valid(phone)?;

        Ok(WithdrawalRequest {
            amount,
            phone_number,
            network_code: MPESA_NETWORK_CODE.to_string(),
            external_reference: self
                .references
                .next_reference(WITHDRAWAL_REFERENCE_PREFIX),
            channel: WITHDRAWAL_CHANNEL.to_string(),
            channel_id: self.channels.withdrawal_channel_id(),
            payment_service: WITHDRAWAL_PAYMENT_SERVICE.to_string(),
            callback_url: self.callback_url.clone(),
        })
    }
}
