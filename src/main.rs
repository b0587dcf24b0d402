use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use raytrader::app::{self, App, AppCfg, CliOverrides};
use raytrader::config::Config;

#[derive(Parser, Debug)]
#[command(name = "raytrader", version, about = "Trading scripts for Raydium pools on Solana")]
struct Cli {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    config: Option<String>,

    /// RPC endpoint URL (overrides config and environment)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Wallet key file, one base58 secret key per line
    #[arg(long, global = true)]
    keys_file: Option<String>,

    /// Pool address (AMM v4 or CPMM)
    #[arg(long, global = true)]
    pool: Option<String>,

    /// Only simulate transactions without sending them
    #[arg(long, global = true)]
    simulate_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the RPC node is healthy
    Health,

    /// Show SOL and token balance of every wallet
    Balance,

    /// Decode and print the pool keys
    Pool {
        /// Also hex-dump the raw pool account
        #[arg(long)]
        dump: bool,
    },

    /// Buy the token with SOL
    Buy {
        /// Amount of SOL to spend
        #[arg(long)]
        amount_sol: f64,

        /// Wallet index in the key file (random when omitted)
        #[arg(long)]
        wallet: Option<usize>,
    },

    /// Sell the token for SOL
    Sell {
        /// Amount of tokens to sell (UI units)
        #[arg(long)]
        amount: f64,

        /// Wallet index in the key file (random when omitted)
        #[arg(long)]
        wallet: Option<usize>,
    },

    /// Sell a random slice from a random wallet that holds enough supply
    Auto,

    /// Save SOL and token balances of every wallet
    Snapshot,

    /// Proportional random-direction trades across all wallets
    #[command(name = "random-trade")]
    RandomTrade {
        /// Run a single round and exit
        #[arg(long)]
        once: bool,
    },

    /// Decode a base58 CreateMetadataAccountV3 instruction into JSON
    #[command(name = "decode-metadata")]
    DecodeMetadata {
        /// Base58 instruction data
        data: String,
    },
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path).with_context(|| format!("loading config {}", path))?,
        None => Config::default(),
    };
    config.apply_env()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    // Decoding needs no network or wallets
    if let Commands::DecodeMetadata { data } = &cli.command {
        println!("{}", app::decode_metadata(data)?);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let overrides = CliOverrides {
        rpc_url: cli.rpc_url,
        keys_file: cli.keys_file,
        pool: cli.pool,
        simulate_only: cli.simulate_only,
    };
    let app = App::new(AppCfg::from_config(config, overrides)?);

    match cli.command {
        Commands::Health => {
            if !app.health().await {
                anyhow::bail!("RPC node is not healthy");
            }
        }
        Commands::Balance => app.balance().await?,
        Commands::Pool { dump } => {
            app.show_pool(dump).await?;
        }
        Commands::Buy { amount_sol, wallet } => {
            let outcome = app.buy(amount_sol, wallet).await?;
            info!("Result: {:?}", outcome);
        }
        Commands::Sell { amount, wallet } => {
            let outcome = app.sell(amount, wallet).await?;
            info!("Result: {:?}", outcome);
        }
        Commands::Auto => match app.auto().await? {
            Some(outcome) => info!("Result: {:?}", outcome),
            None => info!("No trade this time"),
        },
        Commands::Snapshot => {
            app.snapshot().await?;
        }
        Commands::RandomTrade { once } => {
            tokio::select! {
                result = app.random_trade(once) => result?,
                _ = tokio::signal::ctrl_c() => warn!("🛑 Interrupted, stopping"),
            }
        }
        Commands::DecodeMetadata { .. } => {}
    }

    Ok(())
}
