use anyhow::{Context, Result};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::parser::{amm_authority, decode_amm_info, decode_market, AmmInfo, MarketStateV3};
use super::SWAP_BASE_IN_TAG;
use crate::exchanges::common::token_utils::{decode_token_account, token_symbol};
use crate::exchanges::types::{DexLabel, PoolAccounts, PoolFees, PoolKeys, RaydiumV4Accounts, SwapAccounts};
use crate::exchanges::DexAdapter;
use crate::infrastructure::blockchain::SolanaRpcClient;
use crate::shared::errors::{DecodeError, ExecutionError};

pub struct RaydiumV4Adapter {
    rpc_client: Arc<SolanaRpcClient>,
    program_id: Pubkey,
    /// Expected OpenBook program of the pool's market
    market_program: Pubkey,
}

impl RaydiumV4Adapter {
    pub fn new(rpc_client: Arc<SolanaRpcClient>, program_id: Pubkey, market_program: Pubkey) -> Self {
        Self {
            rpc_client,
            program_id,
            market_program,
        }
    }

    async fn fetch_pool_data(&self, pool_address: &Pubkey) -> Result<Vec<u8>> {
        info!("Fetching Raydium V4 pool data for: {}", pool_address);

        let account = self.rpc_client.get_account(pool_address).await?;
        if account.owner != self.program_id {
            error!("❌ Invalid pool owner. Expected: {}, Got: {}", self.program_id, account.owner);
            return Err(ExecutionError::UnsupportedPool(*pool_address, account.owner).into());
        }

        info!("✅ Fetched {} bytes from Raydium V4 pool", account.data.len());
        Ok(account.data)
    }
}

/// Build pool keys from decoded accounts and raw vault balances.
///
/// Reserves exclude the PnL the pool still owes to the protocol.
pub fn assemble_pool_keys(
    pool_address: &Pubkey,
    program_id: &Pubkey,
    info: &AmmInfo,
    market: &MarketStateV3,
    coin_vault_amount: u64,
    pc_vault_amount: u64,
) -> Result<PoolKeys> {
    let authority = amm_authority(program_id, info.nonce)?;
    let market_address = info.market();
    let market_program = info.market_program();
    let market_authority = market.vault_signer(&market_address, &market_program)?;

    let need_take_pnl_coin = info.out_put.need_take_pnl_coin;
    let need_take_pnl_pc = info.out_put.need_take_pnl_pc;
    let swap_fee_numerator = info.fees.swap_fee_numerator;
    let swap_fee_denominator = info.fees.swap_fee_denominator;
    let decimals_a = decimals("coin_decimals", info.coin_decimals)?;
    let decimals_b = decimals("pc_decimals", info.pc_decimals)?;

    Ok(PoolKeys {
        address: *pool_address,
        mint_a: info.coin_mint(),
        mint_b: info.pc_mint(),
        vault_a: info.coin_vault(),
        vault_b: info.pc_vault(),
        decimals_a,
        decimals_b,
        reserve_a: coin_vault_amount.saturating_sub(need_take_pnl_coin),
        reserve_b: pc_vault_amount.saturating_sub(need_take_pnl_pc),
        fees: PoolFees {
            numerator: swap_fee_numerator,
            denominator: swap_fee_denominator,
        },
        accounts: PoolAccounts::RaydiumV4(RaydiumV4Accounts {
            program_id: *program_id,
            authority,
            open_orders: info.open_orders(),
            target_orders: info.target_orders(),
            market_program,
            market: market_address,
            bids: market.bids(),
            asks: market.asks(),
            event_queue: market.event_queue(),
            market_base_vault: market.base_vault(),
            market_quote_vault: market.quote_vault(),
            market_authority,
        }),
    })
}

fn decimals(field: &'static str, value: u64) -> Result<u8, DecodeError> {
    u8::try_from(value).map_err(|_| DecodeError::OutOfRange { field, value })
}

/// `SwapBaseIn` data: tag, amount in, minimum amount out (little-endian)
pub fn swap_instruction_data(amount_in: u64, min_amount_out: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_IN_TAG);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());
    data
}

pub fn build_swap_instruction(
    keys: &RaydiumV4Accounts,
    pool: &PoolKeys,
    accounts: &SwapAccounts,
    amount_in: u64,
    min_amount_out: u64,
) -> Instruction {
    let metas = vec![
        AccountMeta::new_readonly(spl_token::ID, false),
        AccountMeta::new(pool.address, false),
        AccountMeta::new_readonly(keys.authority, false),
        AccountMeta::new(keys.open_orders, false),
        AccountMeta::new(keys.target_orders, false),
        AccountMeta::new(pool.vault_a, false),
        AccountMeta::new(pool.vault_b, false),
        AccountMeta::new_readonly(keys.market_program, false),
        AccountMeta::new(keys.market, false),
        AccountMeta::new(keys.bids, false),
        AccountMeta::new(keys.asks, false),
        AccountMeta::new(keys.event_queue, false),
        AccountMeta::new(keys.market_base_vault, false),
        AccountMeta::new(keys.market_quote_vault, false),
        AccountMeta::new_readonly(keys.market_authority, false),
        AccountMeta::new(accounts.user_source, false),
        AccountMeta::new(accounts.user_destination, false),
        AccountMeta::new_readonly(accounts.owner, true),
    ];

    Instruction {
        program_id: keys.program_id,
        accounts: metas,
        data: swap_instruction_data(amount_in, min_amount_out),
    }
}

#[async_trait::async_trait]
impl DexAdapter for RaydiumV4Adapter {
    fn get_label(&self) -> DexLabel {
        DexLabel::RaydiumV4
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    async fn load_pool(&self, pool_address: &Pubkey) -> Result<PoolKeys> {
        let data = self.fetch_pool_data(pool_address).await?;
        let info = decode_amm_info(&data).context("decoding AMM v4 pool")?;

        let market_address = info.market();
        if info.market_program() != self.market_program {
            warn!(
                "⚠️ Pool {} uses market program {}, expected {}",
                pool_address,
                info.market_program(),
                self.market_program
            );
        }
        let accounts = self
            .rpc_client
            .get_multiple_accounts(&[market_address, info.coin_vault(), info.pc_vault()])
            .await?;
        let market = decode_market(&accounts[0].data).context("decoding OpenBook market")?;
        let coin_vault = decode_token_account(&accounts[1].data)?;
        let pc_vault = decode_token_account(&accounts[2].data)?;

        let keys = assemble_pool_keys(pool_address, &self.program_id, &info, &market, coin_vault.amount, pc_vault.amount)?;

        info!(
            "💰 Reserves: {} {} ↔ {} {}",
            keys.reserve_a,
            token_symbol(&keys.mint_a),
            keys.reserve_b,
            token_symbol(&keys.mint_b)
        );
        debug!("Pool keys: {:?}", keys);
        Ok(keys)
    }

    fn create_swap_instruction(
        &self,
        pool: &PoolKeys,
        accounts: &SwapAccounts,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<Instruction> {
        let PoolAccounts::RaydiumV4(keys) = &pool.accounts else {
            return Err(ExecutionError::Instruction(format!("pool {} is not a Raydium V4 pool", pool.address)).into());
        };
        pool.side(&accounts.mint_in)?;
        Ok(build_swap_instruction(keys, pool, accounts, amount_in, min_amount_out))
    }
}
