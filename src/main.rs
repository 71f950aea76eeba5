//! GetSet wallet session CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   getset <command>
//!        │
//!        ▼
//!   ┌────────────────┐     ┌──────────────────┐     ┌────────────────────┐
//!   │ ViewController │────▶│ WalletConnector  │────▶│ WalletProvider     │
//!   │ (ViewState)    │     │ SigningIdentity  │     │ rpc | simulated    │
//!   └───────┬────────┘     └──────────────────┘     └─────────▲──────────┘
//!           │                                                 │
//!           ▼                                                 │
//!   ┌────────────────┐     ┌──────────────────────┐           │
//!   │ContractBinding │────▶│TransactionCoordinator│───────────┘
//!   │ (descriptor)   │     │ submit / confirm     │
//!   └────────────────┘     └──────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use getset::blockchain::{
    ConfirmationPolicy, RpcWalletProvider, SimulatedWallet, TransactionCoordinator, WalletProvider,
};
use getset::config::load_config;
use getset::contract::artifact::load_descriptor;
use getset::observability::logging::init_logging;
use getset::session::WalletConnector;
use getset::view::ViewController;

#[derive(Parser)]
#[command(name = "getset")]
#[command(about = "Interact with a deployed GetSet contract", long_about = None)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "getset.toml")]
    config: PathBuf,

    /// Use an in-memory chain instead of the configured RPC node
    #[arg(long)]
    simulated: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the wallet and show the account
    Connect,
    /// Store a value in the contract
    Set { value: String },
    /// Read the stored value
    Get,
    /// Deposit ether into the contract
    Deposit { amount: String },
    /// Read the connected account's deposited balance
    Balance,
    /// Connect, set 42, read it back, deposit 0.5 ETH, read the balance
    Demo,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.observability);

    tracing::info!(
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        simulated = cli.simulated,
        "getset v0.1.0 starting"
    );

    let descriptor = Arc::new(load_descriptor(&config.artifacts)?);

    let provider: Option<Arc<dyn WalletProvider>> = if cli.simulated {
        Some(Arc::new(SimulatedWallet::new(
            config.network.chain_id,
            descriptor.address(),
        )))
    } else {
        RpcWalletProvider::discover(&config.network)?
    };

    let controller = ViewController::new(
        WalletConnector::new(provider, config.network.chain_id),
        descriptor,
        TransactionCoordinator::new(ConfirmationPolicy::from(&config.network)),
    );
    let events = controller.watch_provider_events();

    let result = run(&controller, cli.command).await;
    println!("{}", serde_json::to_string_pretty(&controller.state())?);

    if let Some(events) = events {
        events.abort();
    }
    result?;
    Ok(())
}

async fn run(controller: &ViewController, command: Commands) -> getset::SessionResult<()> {
    controller.connect_wallet().await?;

    match command {
        Commands::Connect => {}
        Commands::Set { value } => {
            controller.set_value(&value).await?;
        }
        Commands::Get => {
            controller.get_value().await?;
        }
        Commands::Deposit { amount } => {
            controller.deposit_funds(&amount).await?;
        }
        Commands::Balance => {
            controller.get_balance().await?;
        }
        Commands::Demo => {
            controller.set_value("42").await?;
            controller.get_value().await?;
            controller.deposit_funds("0.5").await?;
            controller.get_balance().await?;
        }
    }
    Ok(())
}
