use crate::config::{GatewayArgs, MIN_DEPOSIT, MIN_WITHDRAWAL};
use anyhow::{bail, Result};
use clap::Subcommand;
use dialoguer::Confirm;
use std::path::Path;
use tokio::sync::mpsc;
use trivia_core::{PaymentService, TransactionReference, TransactionStatus};

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Send an M-Pesa STK push to collect a deposit
    Deposit {
        /// Amount in KSH
        amount: f64,
        /// Payer phone number
        phone: String,
        /// Keep checking until the deposit settles
        #[arg(short, long)]
        watch: bool,
    },
    /// Pay winnings out to a phone number
    Withdraw {
        /// Amount in KSH
        amount: f64,
        /// Recipient phone number
        phone: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Keep checking until the withdrawal settles
        #[arg(short, long)]
        watch: bool,
    },
    /// Query the status of a transaction once
    Status {
        /// Transaction reference
        reference: String,
    },
    /// Poll a transaction until it succeeds or fails
    Watch {
        /// Transaction reference
        reference: String,
    },
}

pub async fn handle_payment_command(
    cmd: PaymentCommands,
    data_dir: &Path,
    gateway: &GatewayArgs,
) -> Result<()> {
    let gateway_config = gateway.gateway_config()?;
    tracing::debug!("Using PayHero API at {}", gateway_config.base_url);
    let service = PaymentService::open(data_dir, gateway_config, gateway.poller_config()).await?;

    match cmd {
        PaymentCommands::Deposit {
            amount,
            phone,
            watch,
        } => {
            if amount < MIN_DEPOSIT {
                bail!("Minimum deposit is Ksh {}", MIN_DEPOSIT);
            }

            println!("Requesting Ksh {} from {}...", amount, phone);
            let receipt = service.initiate_deposit(amount, &phone).await?;

            println!("✅ STK push sent. Check the phone to complete payment.");
            println!("Reference: {}", receipt.reference);
            if let Some(checkout) = &receipt.checkout_request_id {
                println!("Checkout request: {}", checkout);
            }

            if watch {
                watch_until_settled(&service, receipt.reference).await?;
            }
        }
        PaymentCommands::Withdraw {
            amount,
            phone,
            yes,
            watch,
        } => {
            if amount < MIN_WITHDRAWAL {
                bail!("Minimum withdrawal is Ksh {}", MIN_WITHDRAWAL);
            }

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Send Ksh {} to {}?", amount, phone))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Withdrawal cancelled");
                    return Ok(());
                }
            }

            let receipt = service.withdraw_to_mobile(amount, &phone).await?;

            println!("✅ Withdrawal submitted");
            println!("Reference: {}", receipt.merchant_reference);
            println!("Status: {}", receipt.status);

            if watch {
                watch_until_settled(&service, receipt.merchant_reference).await?;
            }
        }
        PaymentCommands::Status { reference } => {
            let reference = TransactionReference::new(reference);
            let status = service.check_transaction_status(&reference).await?;
            println!("{}: {}", reference, status);
        }
        PaymentCommands::Watch { reference } => {
            watch_until_settled(&service, TransactionReference::new(reference)).await?;
        }
    }

    Ok(())
}

async fn watch_until_settled(service: &PaymentService, reference: TransactionReference) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    service.start_status_check(reference.clone(), move |status| {
        let _ = tx.send(status);
    })?;

    println!("Waiting for {} to settle (Ctrl+C to stop)...", reference);

    loop {
        tokio::select! {
            status = rx.recv() => {
                let Some(status) = status else {
                    break;
                };
                println!("{}: {}", reference, status);
                match status {
                    TransactionStatus::Success => {
                        println!("✅ Transaction completed");
                        break;
                    }
                    TransactionStatus::Failed => {
                        println!("❌ Transaction failed");
                        break;
                    }
                    TransactionStatus::TimedOut => {
                        println!("⏱ Gave up waiting. Run `trivia pay status {}` later.", reference);
                        break;
                    }
                    TransactionStatus::Queued => {
                        if let Some(elapsed) = service.poller().elapsed(&reference) {
                            println!("Still queued after {}s", elapsed.as_secs());
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                service.stop_status_check(&reference);
                println!("Stopped watching {}", reference);
                break;
            }
        }
    }

    Ok(())
}
