use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use trivia_core::config::DEFAULT_BASE_URL;
use trivia_core::{GatewayConfig, PollerConfig};

/// Smallest stake a player may deposit, in KSH.
pub const MIN_DEPOSIT: f64 = 20.0;
/// Smallest payout a player may withdraw, in KSH.
pub const MIN_WITHDRAWAL: f64 = 50.0;

#[derive(Args, Debug, Clone)]
pub struct GatewayArgs {
    /// PayHero API base URL
    #[arg(long, env = "TRIVIA_PAYHERO_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub payhero_url: String,

    /// PayHero API username
    #[arg(long, env = "TRIVIA_PAYHERO_USERNAME", global = true, hide_env_values = true)]
    pub payhero_username: Option<String>,

    /// PayHero API password
    #[arg(long, env = "TRIVIA_PAYHERO_PASSWORD", global = true, hide_env_values = true)]
    pub payhero_password: Option<String>,

    /// URL the provider notifies when a transaction settles
    #[arg(long, env = "TRIVIA_CALLBACK_URL", global = true)]
    pub callback_url: Option<String>,

    /// Seconds between status checks
    #[arg(long, default_value = "5", global = true)]
    pub poll_interval: u64,

    /// Give up watching after this many seconds
    #[arg(long, global = true)]
    pub poll_timeout: Option<u64>,
}

impl GatewayArgs {
    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        let (Some(username), Some(password)) = (&self.payhero_username, &self.payhero_password)
        else {
            bail!(
                "PayHero credentials missing: pass --payhero-username/--payhero-password \
                 or set TRIVIA_PAYHERO_USERNAME and TRIVIA_PAYHERO_PASSWORD"
            );
        };

        let mut config =
            GatewayConfig::new(username.as_str(), password.as_str()).with_base_url(&self.payhero_url);
        if let Some(callback_url) = &self.callback_url {
            config = config.with_callback_url(callback_url);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval),
            max_duration: self.poll_timeout.map(Duration::from_secs),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trivia")
}
