//! Swap execution: build, sign, submit and confirm

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::solana_client::SolanaClient;
use crate::config::Config;
use crate::exchanges::common::token_utils::{token_symbol, WSOL_MINT};
use crate::exchanges::transaction_builder::TransactionBuilder;
use crate::exchanges::types::{PoolKeys, SwapAccounts, SwapDirection, SwapQuote};
use crate::exchanges::utils::{format_pool_address, lamports_to_sol, raw_to_ui, sol_to_lamports, ui_to_raw};
use crate::exchanges::DexAdapter;
use crate::math::{calculate_price_impact_bps, quote_swap};
use crate::shared::errors::ExecutionError;

/// Transaction execution configuration
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub skip_preflight: bool,
    pub simulate_only: bool,
    pub slippage_bps: u32,
    pub compute_units: u32,
    pub compute_unit_price: u64,
    pub max_retries: u32,
    pub retry_interval: Duration,
}

impl ExecutionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            skip_preflight: config.trade.skip_preflight,
            simulate_only: config.trade.simulate_only,
            slippage_bps: config.trade.slippage_bps,
            compute_units: config.trade.compute_unit_limit,
            compute_unit_price: config.trade.compute_unit_price,
            max_retries: config.confirm.max_retries,
            retry_interval: Duration::from_secs(config.confirm.retry_interval_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Confirmed,
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    Simulated {
        error: Option<String>,
        units_consumed: Option<u64>,
        logs: Vec<String>,
    },
    Submitted {
        signature: Signature,
        status: ConfirmationStatus,
    },
}

impl SwapOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            SwapOutcome::Simulated { error, .. } => error.is_none(),
            SwapOutcome::Submitted { status, .. } => *status == ConfirmationStatus::Confirmed,
        }
    }
}

pub struct SwapExecutor<'a> {
    client: SolanaClient,
    adapter: &'a dyn DexAdapter,
    builder: TransactionBuilder,
    config: ExecutionConfig,
}

impl<'a> SwapExecutor<'a> {
    pub fn new(client: SolanaClient, adapter: &'a dyn DexAdapter, config: ExecutionConfig) -> Self {
        Self {
            builder: TransactionBuilder::new(config.compute_units, config.compute_unit_price),
            client,
            adapter,
            config,
        }
    }

    /// Spend `amount_sol` SOL on the pool's token
    pub async fn make_buy_swap(&self, pool: &PoolKeys, amount_sol: f64) -> Result<SwapOutcome> {
        let amount_in = sol_to_lamports(amount_sol);
        if amount_in == 0 {
            return Err(ExecutionError::ZeroAmount.into());
        }
        let token_mint = pool.traded_mint(&WSOL_MINT)?;
        let owner = self.client.wallet_address();
        let quote = quote_swap(pool, &WSOL_MINT, amount_in, self.config.slippage_bps)?;
        log_quote(SwapDirection::Buy, pool, &quote);

        let token_program = pool
            .token_program_of(&token_mint)
            .ok_or(ExecutionError::MintNotInPool { pool: pool.address, mint: token_mint })?;
        let wsol_account = Keypair::new();
        let (destination, create_destination) = self.client.get_token_accounts(&token_mint, &token_program).await?;
        let swap = self.adapter.create_swap_instruction(
            pool,
            &SwapAccounts {
                owner,
                user_source: wsol_account.pubkey(),
                user_destination: destination,
                mint_in: WSOL_MINT,
            },
            amount_in,
            quote.min_amount_out,
        )?;
        let rent = self.client.min_balance_for_token_account().await?;
        let instructions = self.builder.buy_instructions(
            &owner,
            &wsol_account.pubkey(),
            rent,
            amount_in,
            create_destination,
            swap,
        )?;

        let blockhash = self.client.latest_blockhash().await?;
        let transaction = self
            .builder
            .compile(&owner, &instructions, blockhash, &[self.client.keypair(), &wsol_account])?;
        self.submit(transaction).await
    }

    /// Sell `amount_tokens` (UI units) of the pool's token for SOL
    pub async fn make_sell_swap(&self, pool: &PoolKeys, amount_tokens: f64) -> Result<SwapOutcome> {
        let token_mint = pool.traded_mint(&WSOL_MINT)?;
        let decimals = pool
            .decimals_of(&token_mint)
            .ok_or(ExecutionError::MintNotInPool { pool: pool.address, mint: token_mint })?;
        let amount_in = ui_to_raw(amount_tokens, decimals);
        if amount_in == 0 {
            return Err(ExecutionError::ZeroAmount.into());
        }
        let owner = self.client.wallet_address();
        let quote = quote_swap(pool, &token_mint, amount_in, self.config.slippage_bps)?;
        log_quote(SwapDirection::Sell, pool, &quote);

        let source = self.client.get_token_account(&token_mint).await?;
        let (wsol_account, create_wsol) = self.client.get_token_accounts(&WSOL_MINT, &spl_token::ID).await?;
        let swap = self.adapter.create_swap_instruction(
            pool,
            &SwapAccounts {
                owner,
                user_source: source,
                user_destination: wsol_account,
                mint_in: token_mint,
            },
            amount_in,
            quote.min_amount_out,
        )?;
        let instructions = self.builder.sell_instructions(&owner, &wsol_account, create_wsol, swap)?;

        let blockhash = self.client.latest_blockhash().await?;
        let transaction = self.builder.compile(&owner, &instructions, blockhash, &[self.client.keypair()])?;
        self.submit(transaction).await
    }

    async fn submit(&self, transaction: VersionedTransaction) -> Result<SwapOutcome> {
        if self.config.simulate_only {
            let result = self.client.simulate_transaction(&transaction).await?;
            let logs = result.logs.unwrap_or_default();
            for line in &logs {
                debug!("  {}", line);
            }
            let error = result.err.map(|e| e.to_string());
            match &error {
                None => info!("🧪 Simulation succeeded, {:?} compute units", result.units_consumed),
                Some(e) => warn!("🧪 Simulation failed: {}", e),
            }
            return Ok(SwapOutcome::Simulated {
                error,
                units_consumed: result.units_consumed,
                logs,
            });
        }

        let signature = self
            .client
            .send_transaction(&transaction, self.config.skip_preflight)
            .await
            .context("submitting swap transaction")?;
        info!("📤 Transaction sent: {}", signature);

        let status = self.confirm_txn(&signature).await;
        Ok(SwapOutcome::Submitted { signature, status })
    }

    /// Poll for the transaction until it lands or retries run out
    pub async fn confirm_txn(&self, signature: &Signature) -> ConfirmationStatus {
        for attempt in 1..=self.config.max_retries {
            match self.client.transaction_status(signature).await {
                Ok(None) => {
                    info!("✅ Transaction confirmed: {}", signature);
                    return ConfirmationStatus::Confirmed;
                }
                Ok(Some(err)) => {
                    error!("❌ Transaction failed: {} ({})", signature, err);
                    return ConfirmationStatus::Failed(err.to_string());
                }
                Err(e) => {
                    debug!("Awaiting confirmation {}/{}: {}", attempt, self.config.max_retries, e);
                }
            }
            if attempt < self.config.max_retries {
                tokio::time::sleep(self.config.retry_interval).await;
            }
        }
        warn!("⏰ Transaction {} not confirmed after {} attempts", signature, self.config.max_retries);
        ConfirmationStatus::TimedOut
    }
}

fn log_quote(direction: SwapDirection, pool: &PoolKeys, quote: &SwapQuote) {
    let ui = |mint: &Pubkey, amount: u64| raw_to_ui(amount, pool.decimals_of(mint).unwrap_or(9));
    let impact_bps = pool
        .side(&quote.mint_in)
        .map(|side| calculate_price_impact_bps(quote.amount_in, side.reserve_in, side.reserve_out))
        .unwrap_or(0.0);
    info!(
        "💱 {} on {}: {} {} -> {} {} (min {}, fee {}, impact {:.2} bps)",
        direction,
        format_pool_address(&pool.address),
        ui(&quote.mint_in, quote.amount_in),
        token_symbol(&quote.mint_in),
        ui(&quote.mint_out, quote.amount_out),
        token_symbol(&quote.mint_out),
        ui(&quote.mint_out, quote.min_amount_out),
        ui(&quote.mint_in, quote.fee_amount),
        impact_bps,
    );
    if direction == SwapDirection::Buy {
        debug!("Spending {} lamports ({} SOL)", quote.amount_in, lamports_to_sol(quote.amount_in));
    }
}
