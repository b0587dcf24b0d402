// src/app.rs
use anyhow::{Context, Result};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, ProgramIds};
use crate::exchanges::common::get_metadata;
use crate::exchanges::types::{PoolKeys, SwapDirection};
use crate::exchanges::utils::format_sol;
use crate::exchanges::{detect_adapter, DexAdapter};
use crate::infrastructure::blockchain::{ExecutionConfig, SolanaClient, SolanaRpcClient, SwapExecutor, SwapOutcome};
use crate::math::{allocate, has_min_holdings, holding_percentage, random_direction, sell_amount, trade_amount};
use crate::shared::wallets::{choose_random, read_private_keys, BalanceSnapshot, WalletBalance, WalletKey};

/// Flags that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub rpc_url: Option<String>,
    pub keys_file: Option<String>,
    pub pool: Option<String>,
    pub simulate_only: bool,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub config: Config,
    pub pool_address: Pubkey,
    pub token_mint: Pubkey,
    pub programs: ProgramIds,
}

impl AppCfg {
    pub fn from_config(mut cfg: Config, overrides: CliOverrides) -> Result<Self> {
        if let Some(rpc_url) = overrides.rpc_url {
            cfg.rpc.url = rpc_url;
        }
        if let Some(keys_file) = overrides.keys_file {
            cfg.wallet.keys_file = keys_file;
        }
        if let Some(pool) = overrides.pool {
            cfg.pool.amm_id = pool;
        }
        if overrides.simulate_only {
            cfg.trade.simulate_only = true;
        }
        cfg.validate().context("invalid configuration")?;

        Ok(Self {
            pool_address: cfg.pool_address()?,
            token_mint: cfg.token_mint()?,
            programs: cfg.program_ids()?,
            config: cfg,
        })
    }
}

pub struct App {
    cfg: AppCfg,
    rpc: Arc<SolanaRpcClient>,
}

impl App {
    pub fn new(cfg: AppCfg) -> Self {
        let rpc = Arc::new(SolanaRpcClient::new(cfg.config.rpc.url.clone()));
        Self { cfg, rpc }
    }

    fn load_keys(&self) -> Result<Vec<WalletKey>> {
        read_private_keys(&self.cfg.config.wallet.keys_file)
            .with_context(|| format!("loading wallets from {}", self.cfg.config.wallet.keys_file))
    }

    fn pick_key(&self, keys: &[WalletKey], index: Option<usize>) -> Result<WalletKey> {
        let key = match index {
            Some(i) => keys.get(i).with_context(|| format!("wallet index {} out of range (have {})", i, keys.len()))?,
            None => choose_random(keys, &mut rand::thread_rng()).context("no wallets loaded")?,
        };
        Ok(key.clone())
    }

    fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig::from_config(&self.cfg.config)
    }

    async fn adapter(&self) -> Result<Box<dyn DexAdapter>> {
        detect_adapter(&self.cfg.pool_address, self.rpc.clone(), &self.cfg.programs).await
    }

    async fn load_pool(&self, adapter: &dyn DexAdapter) -> Result<PoolKeys> {
        adapter
            .load_pool(&self.cfg.pool_address)
            .await
            .with_context(|| format!("loading pool {}", self.cfg.pool_address))
    }

    async fn token_program(&self) -> Result<Pubkey> {
        self.rpc
            .get_mint_program(&self.cfg.token_mint)
            .await
            .with_context(|| format!("resolving token program of {}", self.cfg.token_mint))
    }

    pub async fn health(&self) -> bool {
        let healthy = self.rpc.check_health().await;
        if healthy {
            info!("✅ RPC {} is healthy", self.rpc.url());
        } else {
            error!("❌ RPC {} is not healthy", self.rpc.url());
        }
        healthy
    }

    pub async fn balance(&self) -> Result<()> {
        let token_program = self.token_program().await?;
        for key in self.load_keys()? {
            let client = SolanaClient::from_key(self.rpc.clone(), &key)?;
            let sol = client.balance().await?;
            let tokens = client.check_token_balance(&self.cfg.token_mint, &token_program).await;
            info!("👛 {}: {} | {} tokens", client.wallet_address(), format_sol(sol), tokens);
        }
        Ok(())
    }

    pub async fn show_pool(&self, dump: bool) -> Result<PoolKeys> {
        if dump {
            let data = self.rpc.get_account_data(&self.cfg.pool_address).await?;
            info!("🔬 Raw pool account ({} bytes):", data.len());
            for line in hex_dump(&data) {
                info!("{}", line);
            }
        }
        let adapter = self.adapter().await?;
        let pool = self.load_pool(adapter.as_ref()).await?;
        info!("📊 {} pool {}", adapter.get_label().as_str(), pool.address);
        info!("   mint A {} ({} decimals), vault {}", pool.mint_a, pool.decimals_a, pool.vault_a);
        info!("   mint B {} ({} decimals), vault {}", pool.mint_b, pool.decimals_b, pool.vault_b);
        info!("   reserves {} / {}, fee {:.2} bps", pool.reserve_a, pool.reserve_b, pool.fees.as_bps());
        Ok(pool)
    }

    pub async fn buy(&self, amount_sol: f64, wallet: Option<usize>) -> Result<SwapOutcome> {
        let key = self.pick_key(&self.load_keys()?, wallet)?;
        let adapter = self.adapter().await?;
        let pool = self.load_pool(adapter.as_ref()).await?;
        let executor = SwapExecutor::new(SolanaClient::from_key(self.rpc.clone(), &key)?, adapter.as_ref(), self.execution_config());
        info!("🛒 Buying with {} from {}", format_sol(amount_sol), key.pubkey());
        executor.make_buy_swap(&pool, amount_sol).await
    }

    pub async fn sell(&self, amount: f64, wallet: Option<usize>) -> Result<SwapOutcome> {
        let key = self.pick_key(&self.load_keys()?, wallet)?;
        let adapter = self.adapter().await?;
        let pool = self.load_pool(adapter.as_ref()).await?;
        let executor = SwapExecutor::new(SolanaClient::from_key(self.rpc.clone(), &key)?, adapter.as_ref(), self.execution_config());
        info!("💸 Selling {} tokens from {}", amount, key.pubkey());
        executor.make_sell_swap(&pool, amount).await
    }

    /// Sell a random slice from a random wallet if it holds enough of the supply
    pub async fn auto(&self) -> Result<Option<SwapOutcome>> {
        let key = self.pick_key(&self.load_keys()?, None)?;
        let client = SolanaClient::from_key(self.rpc.clone(), &key)?;
        let token_program = self.token_program().await?;
        let holding = client.check_token_balance(&self.cfg.token_mint, &token_program).await;
        let trade = &self.cfg.config.trade;

        info!("🎲 Picked wallet {} holding {} tokens", client.wallet_address(), holding);
        if !has_min_holdings(holding, self.cfg.config.pool.token_supply, trade.min_holding_fraction) {
            info!("⏭️ Wallet holds less than {:.0}% of supply, skipping", trade.min_holding_fraction * 100.0);
            return Ok(None);
        }

        let amount = sell_amount(holding, trade.sell_pct_min, trade.sell_pct_max, &mut StdRng::from_entropy());
        let adapter = self.adapter().await?;
        let pool = self.load_pool(adapter.as_ref()).await?;
        let executor = SwapExecutor::new(client, adapter.as_ref(), self.execution_config());
        info!("💸 Selling {} tokens", amount);
        Ok(Some(executor.make_sell_swap(&pool, amount).await?))
    }

    /// Fetch SOL and token balances of every wallet concurrently and save them
    pub async fn snapshot(&self) -> Result<BalanceSnapshot> {
        let keys = self.load_keys()?;
        let token_program = self.token_program().await?;
        let token_program = &token_program;
        let fetches = keys.iter().map(|key| async move {
            let client = SolanaClient::from_key(self.rpc.clone(), key)?;
            let sol_balance = client.balance().await.unwrap_or_else(|e| {
                warn!("⚠️ Could not read SOL balance of {}: {}", key.pubkey(), e);
                0.0
            });
            let token_balance = client.check_token_balance(&self.cfg.token_mint, token_program).await;
            Ok::<_, anyhow::Error>((
                key.pubkey().to_string(),
                WalletBalance {
                    private_key: key.to_base58(),
                    sol_balance,
                    token_balance,
                },
            ))
        });
        let wallets = join_all(fetches).await.into_iter().collect::<Result<BTreeMap<_, _>>>()?;

        let snapshot = BalanceSnapshot::new(wallets);
        snapshot
            .save(&self.cfg.config.wallet.snapshot_file)
            .with_context(|| format!("saving snapshot to {}", self.cfg.config.wallet.snapshot_file))?;
        info!(
            "📸 Snapshot of {} wallets: {} and {} tokens -> {}",
            snapshot.wallets.len(),
            format_sol(snapshot.total_sol()),
            snapshot.total_tokens(),
            self.cfg.config.wallet.snapshot_file
        );
        Ok(snapshot)
    }

    /// Rounds of proportional random-direction trades across all snapshot wallets
    pub async fn random_trade(&self, once: bool) -> Result<()> {
        let mut snapshot = self.snapshot().await?;
        let adapter = self.adapter().await?;
        let mut rng = StdRng::from_entropy();

        loop {
            let round_id = Uuid::new_v4();
            let traded = self
                .trade_round(adapter.as_ref(), &mut snapshot, &mut rng)
                .instrument(info_span!("round", id = %round_id))
                .await;

            let traded = match traded {
                Ok(traded) => {
                    info!("🏁 Round {} ended, traded: {}", round_id, traded);
                    traded
                }
                Err(e) => {
                    error!("❌ Round {} failed: {:#}", round_id, e);
                    false
                }
            };
            if once {
                return Ok(());
            }
            if !traded {
                let delay = self.cfg.config.trade.round_delay_secs;
                info!("⏳ Waiting {}s before next round", delay);
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
        }
    }

    async fn trade_round(&self, adapter: &dyn DexAdapter, snapshot: &mut BalanceSnapshot, rng: &mut StdRng) -> Result<bool> {
        let trade = &self.cfg.config.trade;
        let direction = random_direction(rng);
        let total_tokens = snapshot.total_tokens();
        let total_sol = snapshot.total_sol();
        let holding_pct = holding_percentage(total_tokens, self.cfg.config.pool.token_supply);

        info!("Total SOL Balance: {}", format_sol(total_sol));
        info!("Total Token Balance: {}", total_tokens);
        info!("Holdings: {:.2}%, direction {}", holding_pct, direction);

        if holding_pct <= trade.holdings_before_sell_pct {
            info!("⏭️ Holdings below {:.2}%, not trading", trade.holdings_before_sell_pct);
            return Ok(false);
        }

        let base = match direction {
            SwapDirection::Sell => total_tokens,
            SwapDirection::Buy => total_sol,
        };
        let total = trade_amount(base, trade.random_trade_pct_start, trade.random_trade_pct_end, rng);
        info!("Amount to {}: {} ({:.2}%)", direction, total, if base > 0.0 { total / base * 100.0 } else { 0.0 });

        let allocations = allocate(direction, snapshot, total, trade.min_sol_balance);
        if allocations.is_empty() {
            warn!("⚠️ No wallet can {}", direction);
            return Ok(false);
        }

        let pool = self.load_pool(adapter).await?;
        for allocation in allocations {
            tokio::time::sleep(Duration::from_secs(trade.wallet_delay_secs)).await;

            let key = WalletKey::from_base58(&allocation.private_key, 0)?;
            let executor = SwapExecutor::new(SolanaClient::from_key(self.rpc.clone(), &key)?, adapter, self.execution_config());

            let mut swapped = false;
            for attempt in 1..=trade.max_swap_attempts {
                let result = match direction {
                    SwapDirection::Buy => executor.make_buy_swap(&pool, allocation.amount).await,
                    SwapDirection::Sell => executor.make_sell_swap(&pool, allocation.amount).await,
                };
                match result {
                    Ok(outcome) if outcome.is_success() => {
                        swapped = true;
                        break;
                    }
                    Ok(outcome) => warn!("Swap for {} did not land (attempt {}): {:?}", allocation.wallet, attempt, outcome),
                    Err(e) => warn!("Swap failed for wallet {} (attempt {}): {:#}", allocation.wallet, attempt, e),
                }
            }

            if !swapped {
                error!("❌ Giving up on wallet {} after {} attempts", allocation.wallet, trade.max_swap_attempts);
                continue;
            }
            if let Some(balance) = snapshot.wallets.get_mut(&allocation.wallet) {
                match direction {
                    SwapDirection::Sell => balance.token_balance -= allocation.amount,
                    SwapDirection::Buy => balance.sol_balance -= allocation.amount,
                }
            }
        }
        Ok(true)
    }
}

/// 32-byte rows of hex prefixed with their offset
pub fn hex_dump(data: &[u8]) -> Vec<String> {
    data.chunks(32)
        .enumerate()
        .map(|(i, chunk)| format!("  {:4}: {}", i * 32, hex::encode(chunk)))
        .collect()
}

/// Decode a base58 metadata instruction and render it as JSON
pub fn decode_metadata(encoded: &str) -> Result<String> {
    get_metadata(encoded).context("decoding metadata instruction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_take_precedence() {
        let mut config = Config::default();
        config.trade.simulate_only = false;
        let overrides = CliOverrides {
            rpc_url: Some("http://localhost:8899".to_string()),
            keys_file: Some("keys.txt".to_string()),
            pool: Some("58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2".to_string()),
            simulate_only: true,
        };

        let cfg = AppCfg::from_config(config, overrides).unwrap();
        assert_eq!(cfg.config.rpc.url, "http://localhost:8899");
        assert_eq!(cfg.config.wallet.keys_file, "keys.txt");
        assert_eq!(cfg.pool_address.to_string(), "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2");
        assert!(cfg.config.trade.simulate_only);
    }

    #[test]
    fn test_invalid_pool_override_rejected() {
        let overrides = CliOverrides {
            pool: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(AppCfg::from_config(Config::default(), overrides).is_err());
    }

    #[test]
    fn test_pick_key_by_index() {
        let cfg = AppCfg::from_config(Config::default(), CliOverrides::default()).unwrap();
        let app = App::new(cfg);
        let keys: Vec<WalletKey> = (0..3)
            .map(|i| WalletKey::from_base58(&solana_sdk::signature::Keypair::new().to_base58_string(), i + 1).unwrap())
            .collect();

        assert_eq!(app.pick_key(&keys, Some(2)).unwrap().pubkey(), keys[2].pubkey());
        assert!(app.pick_key(&keys, Some(3)).is_err());
        let random = app.pick_key(&keys, None).unwrap();
        assert!(keys.iter().any(|k| k.pubkey() == random.pubkey()));
        assert!(app.pick_key(&[], None).is_err());
    }

    #[test]
    fn test_hex_dump_rows() {
        let data: Vec<u8> = (0u8..40).collect();
        let rows = hex_dump(&data);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("     0: 000102"));
        assert_eq!(rows[1], format!("    32: {}", hex::encode(&data[32..])));
    }

    #[test]
    fn test_decode_metadata_rejects_garbage() {
        assert!(decode_metadata("1111").is_err());
    }
}
