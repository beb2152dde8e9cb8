use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://backend.payhero.co.ke/api/v2/";
pub const DEFAULT_CHANNEL_ID: &str = "1487";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_username: String,
    #[serde(skip_serializing)]
    pub api_password: String,
    /// Where the provider posts its asynchronous result.
    pub callback_url: String,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_username: String::new(),
            api_password: String::new(),
            callback_url: "http://localhost:8080/payments/callback".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    pub fn new(api_username: impl Into<String>, api_password: impl Into<String>) -> Self {
        Self {
            api_username: api_username.into(),
            api_password: api_password.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = callback_url.into();
        self
    }

    /// `base_url` joined with `path`, tolerating a missing trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(PaymentError::config("Gateway base URL cannot be empty"));
        }

        if self.api_username.is_empty() || self.api_password.is_empty() {
            return Err(PaymentError::config("Gateway credentials cannot be empty"));
        }

        if self.request_timeout.is_zero() {
            return Err(PaymentError::config(
                "Request timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Give up and report `TIMEOUT` after this long. `None` polls until the
    /// provider reports a terminal status or the caller stops the poll.
    pub max_duration: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: None,
        }
    }
}

impl PollerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(PaymentError::config("Poll interval must be greater than 0"));
        }

        if let Some(max) = self.max_duration {
            if max < self.interval {
                return Err(PaymentError::config(
                    "Maximum poll duration must cover at least one interval",
                ));
            }
        }

        Ok(())
    }
}
