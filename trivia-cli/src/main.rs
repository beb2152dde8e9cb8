mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trivia_core::{ErrorKind, PaymentError};

#[derive(Parser)]
#[command(name = "trivia")]
#[command(about = "Trivia-for-cash payments and question tooling")]
#[command(version)]
struct Cli {
    /// Data directory for settings and the transaction ledger
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    gateway: config::GatewayArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deposits, withdrawals and status checks
    #[command(subcommand)]
    Pay(commands::PaymentCommands),

    /// Payment channel settings
    #[command(subcommand)]
    Channels(commands::ChannelCommands),

    /// Locally recorded transactions
    History {
        /// Number of transactions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// LLM question generation
    #[command(subcommand)]
    Questions(commands::QuestionCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "trivia={},trivia_core={},trivia_questions={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;

    let result = match cli.command {
        Commands::Pay(cmd) => commands::handle_payment_command(cmd, &data_dir, &cli.gateway).await,
        Commands::Channels(cmd) => commands::handle_channel_command(cmd, &data_dir).await,
        Commands::History { limit } => commands::show_history(&data_dir, limit).await,
        Commands::Questions(cmd) => commands::handle_question_command(cmd).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<PaymentError>() {
            Some(err) => match err.kind() {
                ErrorKind::InvalidPhoneNumber => {
                    eprintln!("Error: {}", err);
                    eprintln!("Use a Safaricom number such as 0712345678 or +254712345678");
                }
                ErrorKind::GatewayUnreachable => {
                    eprintln!("Error: {}", err);
                    eprintln!("Check your connection and the --payhero-url setting");
                }
                _ => eprintln!("Error: {}", err),
            },
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}
