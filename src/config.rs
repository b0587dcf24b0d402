use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::{env, fs, path::Path, str::FromStr};
use tracing::debug;

use crate::shared::errors::ConfigError;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const RAYDIUM_V4_PROGRAM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";
pub const RAYDIUM_CPMM_PROGRAM: &str = "CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C";
pub const OPENBOOK_PROGRAM: &str = "srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcCfg {
    pub url: String,
}

impl Default for RpcCfg {
    fn default() -> Self {
        Self { url: DEFAULT_RPC_URL.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletCfg {
    /// One base58 secret key per line
    pub keys_file: String,
    pub snapshot_file: String,
}

impl Default for WalletCfg {
    fn default() -> Self {
        Self {
            keys_file: "Wallets.txt".to_string(),
            snapshot_file: "wallets.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolCfg {
    pub amm_id: String,
    pub mint: String,
    /// Total token supply in UI units
    pub token_supply: f64,
}

impl Default for PoolCfg {
    fn default() -> Self {
        Self {
            amm_id: "ATDyH3UarK8wEbjwKwzFgzvNsw7UCC2uaTWFaEHZAxLW".to_string(),
            mint: "8Eewax7ooBdi5nwkp7VwittjEV9mVWAGhN1KVRJroeMR".to_string(),
            token_supply: 1_000_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradeCfg {
    pub compute_unit_limit: u32,
    /// Priority fee in micro-lamports per compute unit
    pub compute_unit_price: u64,
    pub slippage_bps: u32,
    pub skip_preflight: bool,
    pub simulate_only: bool,
    pub min_holding_fraction: f64,
    pub sell_pct_min: f64,
    pub sell_pct_max: f64,
    pub holdings_before_sell_pct: f64,
    pub random_trade_pct_start: f64,
    pub random_trade_pct_end: f64,
    pub min_sol_balance: f64,
    pub wallet_delay_secs: u64,
    pub round_delay_secs: u64,
    pub max_swap_attempts: u32,
}

impl Default for TradeCfg {
    fn default() -> Self {
        Self {
            compute_unit_limit: 600_000,
            compute_unit_price: 10_000_000,
            slippage_bps: 10,
            skip_preflight: true,
            simulate_only: false,
            min_holding_fraction: 0.3,
            sell_pct_min: 2.0,
            sell_pct_max: 10.0,
            holdings_before_sell_pct: 0.0,
            random_trade_pct_start: 2.0,
            random_trade_pct_end: 10.0,
            min_sol_balance: 0.0005,
            wallet_delay_secs: 10,
            round_delay_secs: 5_000,
            max_swap_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfirmCfg {
    pub max_retries: u32,
    pub retry_interval_secs: u64,
}

impl Default for ConfirmCfg {
    fn default() -> Self {
        Self {
            max_retries: 20,
            retry_interval_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgramsCfg {
    pub raydium_v4: String,
    pub raydium_cpmm: String,
    pub openbook: String,
}

impl Default for ProgramsCfg {
    fn default() -> Self {
        Self {
            raydium_v4: RAYDIUM_V4_PROGRAM.to_string(),
            raydium_cpmm: RAYDIUM_CPMM_PROGRAM.to_string(),
            openbook: OPENBOOK_PROGRAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcCfg,
    pub wallet: WalletCfg,
    pub pool: PoolCfg,
    pub trade: TradeCfg,
    pub confirm: ConfirmCfg,
    pub programs: ProgramsCfg,
}

/// Program ids resolved from [`ProgramsCfg`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramIds {
    pub raydium_v4: Pubkey,
    pub raydium_cpmm: Pubkey,
    pub openbook: Pubkey,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Apply environment overrides. `lookup` abstracts `std::env::var` for tests.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("RPC").or_else(|| lookup("SOLANA_ENDPOINT")) {
            debug!("RPC url overridden from environment");
            self.rpc.url = url;
        }
        if let Some(v) = lookup("WALLET_HOLDINGS_BEFORE_SELL") {
            self.trade.holdings_before_sell_pct = parse_f64("WALLET_HOLDINGS_BEFORE_SELL", &v)?;
        }
        if let Some(v) = lookup("RANDOM_TRADE_PERCENTAGE_START") {
            self.trade.random_trade_pct_start = parse_f64("RANDOM_TRADE_PERCENTAGE_START", &v)?;
        }
        if let Some(v) = lookup("RANDOM_TRADE_PERCENTAGE_END") {
            self.trade.random_trade_pct_end = parse_f64("RANDOM_TRADE_PERCENTAGE_END", &v)?;
        }
        Ok(())
    }

    /// Load `.env` (if any) and apply process environment overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        self.apply_env_with(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rpc.url",
                reason: "must not be empty".to_string(),
            });
        }
        self.pool_address()?;
        self.token_mint()?;
        self.program_ids()?;

        if self.trade.slippage_bps > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "trade.slippage_bps",
                reason: format!("{} exceeds 10000", self.trade.slippage_bps),
            });
        }
        let percentages = [
            ("trade.min_holding_fraction", self.trade.min_holding_fraction),
            ("trade.sell_pct_min", self.trade.sell_pct_min),
            ("trade.sell_pct_max", self.trade.sell_pct_max),
            ("trade.holdings_before_sell_pct", self.trade.holdings_before_sell_pct),
            ("trade.random_trade_pct_start", self.trade.random_trade_pct_start),
            ("trade.random_trade_pct_end", self.trade.random_trade_pct_end),
            ("trade.min_sol_balance", self.trade.min_sol_balance),
            ("pool.token_supply", self.pool.token_supply),
        ];
        for (field, value) in percentages {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{} is not a non-negative number", value),
                });
            }
        }
        if self.confirm.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "confirm.max_retries",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.trade.max_swap_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "trade.max_swap_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn pool_address(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey("pool.amm_id", &self.pool.amm_id)
    }

    pub fn token_mint(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey("pool.mint", &self.pool.mint)
    }

    pub fn program_ids(&self) -> Result<ProgramIds, ConfigError> {
        Ok(ProgramIds {
            raydium_v4: parse_pubkey("programs.raydium_v4", &self.programs.raydium_v4)?,
            raydium_cpmm: parse_pubkey("programs.raydium_cpmm", &self.programs.raydium_cpmm)?,
            openbook: parse_pubkey("programs.openbook", &self.programs.openbook)?,
        })
    }
}

fn parse_pubkey(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|_| ConfigError::InvalidPubkey {
        field,
        value: value.to_string(),
    })
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.rpc.url, DEFAULT_RPC_URL);
        assert_eq!(cfg.trade.compute_unit_limit, 600_000);
        assert_eq!(cfg.confirm.max_retries, 20);
        assert_eq!(cfg.confirm.retry_interval_secs, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            [rpc]
            url = "http://localhost:8899"

            [trade]
            slippage_bps = 50
            "#,
        )
        .unwrap();
        assert_eq!(cfg.rpc.url, "http://localhost:8899");
        assert_eq!(cfg.trade.slippage_bps, 50);
        assert_eq!(cfg.trade.compute_unit_price, 10_000_000);
        assert_eq!(cfg.wallet.keys_file, "Wallets.txt");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SOLANA_ENDPOINT", "http://rpc.example"),
            ("WALLET_HOLDINGS_BEFORE_SELL", "12.5"),
            ("RANDOM_TRADE_PERCENTAGE_START", "8"),
            ("RANDOM_TRADE_PERCENTAGE_END", "3"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_env_with(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.rpc.url, "http://rpc.example");
        assert_eq!(cfg.trade.holdings_before_sell_pct, 12.5);
        assert_eq!(cfg.trade.random_trade_pct_start, 8.0);
        assert_eq!(cfg.trade.random_trade_pct_end, 3.0);
    }

    #[test]
    fn test_rpc_env_takes_precedence_over_solana_endpoint() {
        let mut cfg = Config::default();
        cfg.apply_env_with(|k| match k {
            "RPC" => Some("http://primary".to_string()),
            "SOLANA_ENDPOINT" => Some("http://secondary".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.rpc.url, "http://primary");
    }

    #[test]
    fn test_bad_env_number_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_with(|k| (k == "WALLET_HOLDINGS_BEFORE_SELL").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "WALLET_HOLDINGS_BEFORE_SELL", .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.pool.amm_id = "not-a-pubkey".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPubkey { field: "pool.amm_id", .. })));

        let mut cfg = Config::default();
        cfg.trade.slippage_bps = 10_001;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.trade.sell_pct_max = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.confirm.max_retries = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_program_ids_parse() {
        let ids = Config::default().program_ids().unwrap();
        assert_eq!(ids.raydium_v4.to_string(), RAYDIUM_V4_PROGRAM);
        assert_eq!(ids.raydium_cpmm.to_string(), RAYDIUM_CPMM_PROGRAM);
        assert_eq!(ids.openbook.to_string(), OPENBOOK_PROGRAM);
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
