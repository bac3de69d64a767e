//! skysend - build Skycoin-style transactions from the command line
//!
//! Select source addresses, list destinations with coins (and hours when
//! allocating them manually), and have the node build the transaction.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use sky_send::cli::commands::{self, SendArgs};
use sky_send::config::Config;

/// Advanced send for Skycoin-style wallets
#[derive(Parser)]
#[command(name = "skysend")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "skysend.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and submit a transaction
    Send {
        /// Wallet id (e.g. 2017_11_25_e5fb.wlt)
        #[arg(short, long)]
        wallet: String,

        /// Source address; repeat for several. Defaults to every spendable address
        #[arg(long = "from", value_name = "ADDRESS")]
        from: Vec<String>,

        /// Destination as address:coins[:hours]; repeat for several
        #[arg(long = "to", value_name = "SPEC", required = true)]
        to: Vec<String>,

        /// Allocate hours per destination instead of automatically
        #[arg(long)]
        manual_hours: bool,

        /// Share factor for automatic hours (default from config)
        #[arg(long, conflicts_with = "manual_hours")]
        share_factor: Option<String>,

        /// Address receiving leftover coins
        #[arg(long)]
        change_address: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        /// Validate only, don't request a transaction
        #[arg(long)]
        dry_run: bool,
    },

    /// List spendable addresses of a wallet
    Addresses {
        /// Wallet id
        #[arg(short, long)]
        wallet: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sky_send=info".parse()?),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Send {
            wallet,
            from,
            to,
            manual_hours,
            share_factor,
            change_address,
            force,
            dry_run,
        } => {
            let args = SendArgs {
                wallet,
                from,
                to,
                manual_hours,
                share_factor,
                change_address,
                force,
                dry_run,
            };
            commands::send(&config, args).await
        }
        Commands::Addresses { wallet } => commands::addresses(&config, &wallet).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
