use super::open_storage;
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;
use std::sync::Arc;
use trivia_core::storage::SettingsStore;
use trivia_core::ChannelConfig;

#[derive(Subcommand)]
pub enum ChannelCommands {
    /// Show the configured payment channels
    Show,
    /// Set the channel used for STK push deposits
    SetDeposit {
        /// PayHero channel id
        channel_id: String,
    },
    /// Set the channel used for withdrawals
    SetWithdrawal {
        /// PayHero channel id
        channel_id: String,
    },
}

pub async fn handle_channel_command(cmd: ChannelCommands, data_dir: &Path) -> Result<()> {
    let storage = open_storage(data_dir).await?;
    let channels = ChannelConfig::load(Arc::new(SettingsStore::new(storage))).await?;

    match cmd {
        ChannelCommands::Show => {
            println!("Deposit channel:    {}", channels.deposit_channel_id());
            println!("Withdrawal channel: {}", channels.withdrawal_channel_id());
        }
        ChannelCommands::SetDeposit { channel_id } => {
            channels.set_deposit_channel_id(&channel_id).await?;
            println!("✅ Deposit channel set to {}", channels.deposit_channel_id());
        }
        ChannelCommands::SetWithdrawal { channel_id } => {
            channels.set_withdrawal_channel_id(&channel_id).await?;
            println!(
                "✅ Withdrawal channel set to {}",
                channels.withdrawal_channel_id()
            );
        }
    }

    Ok(())
}
