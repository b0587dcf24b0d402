//! raytrader - trading scripts for Raydium AMM v4 and CPMM pools on Solana

pub mod app;
pub mod config;
pub mod exchanges;
pub mod infrastructure;
pub mod math;
pub mod shared;

pub use app::{App, AppCfg};
pub use config::Config;
pub use exchanges::types::{PoolKeys, SwapDirection};
pub use infrastructure::blockchain::{SolanaClient, SwapExecutor};
