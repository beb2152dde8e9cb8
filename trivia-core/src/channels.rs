use crate::config::DEFAULT_CHANNEL_ID;
use crate::error::{PaymentError, Result};
use crate::storage::KeyValueStore;
use parking_lot::RwLock;
use std::sync::Arc;

pub const DEPOSIT_CHANNEL_KEY: &str = "deposit_channel_id";
pub const WITHDRAWAL_CHANNEL_KEY: &str = "withdrawal_channel_id";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChannelIds {
    deposit: String,
    withdrawal: String,
}

/// Provider channel identifiers for collections and disbursements.
///
/// Reads are served from memory. Writes hit the backing store first, so a
/// failed write leaves the in-memory value untouched.
pub struct ChannelConfig {
    store: Arc<dyn KeyValueStore>,
    ids: RwLock<ChannelIds>,
}

impl ChannelConfig {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let deposit = store
            .get(DEPOSIT_CHANNEL_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string());
        let withdrawal = store
            .get(WITHDRAWAL_CHANNEL_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string());

        tracing::debug!(
            "Loaded channel config: deposit={}, withdrawal={}",
            deposit,
            withdrawal
        );

        Ok(Self {
            store,
            ids: RwLock::new(ChannelIds {
                deposit,
                withdrawal,
            }),
        })
    }

    pub fn deposit_channel_id(&self) -> String {
        self.ids.read().deposit.clone()
    }

    pub fn withdrawal_channel_id(&self) -> String {
        self.ids.read().withdrawal.clone()
    }

    pub async fn set_deposit_channel_id(&self, channel_id: &str) -> Result<()> {
        let channel_id = validate_channel_id(channel_id)?;
        self.store.set(DEPOSIT_CHANNEL_KEY, channel_id).await?;
        self.ids.write().deposit = channel_id.to_string();
        tracing::info!("Deposit channel set to {}", channel_id);
        Ok(())
    }

    pub async fn set_withdrawal_channel_id(&self, channel_id: &str) -> Result<()> {
        let channel_id = validate_channel_id(channel_id)?;
        self.store.set(WITHDRAWAL_CHANNEL_KEY, channel_id).await?;
        self.ids.write().withdrawal = channel_id.to_string();
        tracing::info!("Withdrawal channel set to {}", channel_id);
        Ok(())
    }
}

fn validate_channel_id(channel_id: &str) -> Result<&str> {
    let channel_id = channel_id.trim();
    if channel_id.is_empty() {
        return Err(PaymentError::config("Channel ID cannot be empty"));
    }
    Ok(channel_id)
}
