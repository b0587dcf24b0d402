use anyhow::{Context, Result};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::parser::{decode_amm_config, decode_pool_state, pool_authority, CpmmConfig, CpmmPoolState};
use super::FEE_RATE_DENOMINATOR;
use crate::exchanges::common::token_utils::{decode_token_account, token_symbol};
use crate::exchanges::types::{DexLabel, PoolAccounts, PoolFees, PoolKeys, RaydiumCpmmAccounts, SwapAccounts};
use crate::exchanges::DexAdapter;
use crate::infrastructure::blockchain::SolanaRpcClient;
use crate::shared::errors::ExecutionError;

/// Anchor discriminator of `swap_base_input`
pub const SWAP_BASE_INPUT_DISCRIMINATOR: [u8; 8] = [143, 190, 90, 218, 196, 30, 51, 222];

pub struct RaydiumCpmmAdapter {
    rpc_client: Arc<SolanaRpcClient>,
    program_id: Pubkey,
}

impl RaydiumCpmmAdapter {
    pub fn new(rpc_client: Arc<SolanaRpcClient>, program_id: Pubkey) -> Self {
        Self { rpc_client, program_id }
    }
}

pub fn assemble_pool_keys(
    pool_address: &Pubkey,
    program_id: &Pubkey,
    state: &CpmmPoolState,
    config: &CpmmConfig,
    vault_0_amount: u64,
    vault_1_amount: u64,
) -> PoolKeys {
    let (reserve_a, reserve_b) = state.vault_reserves(vault_0_amount, vault_1_amount);
    let trade_fee_rate = config.trade_fee_rate;

    PoolKeys {
        address: *pool_address,
        mint_a: state.token_0_mint(),
        mint_b: state.token_1_mint(),
        vault_a: state.token_0_vault(),
        vault_b: state.token_1_vault(),
        decimals_a: state.mint_0_decimals,
        decimals_b: state.mint_1_decimals,
        reserve_a,
        reserve_b,
        fees: PoolFees {
            numerator: trade_fee_rate,
            denominator: FEE_RATE_DENOMINATOR,
        },
        accounts: PoolAccounts::RaydiumCpmm(RaydiumCpmmAccounts {
            program_id: *program_id,
            authority: pool_authority(program_id),
            amm_config: state.amm_config(),
            observation: state.observation_key(),
            token_program_a: state.token_0_program(),
            token_program_b: state.token_1_program(),
        }),
    }
}

/// Refuse pools whose status bit blocks swaps
pub fn ensure_swap_enabled(pool_address: &Pubkey, state: &CpmmPoolState) -> Result<(), ExecutionError> {
    if state.swap_enabled() {
        Ok(())
    } else {
        Err(ExecutionError::SwapDisabled(*pool_address))
    }
}

pub fn swap_instruction_data(amount_in: u64, min_amount_out: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(24);
    data.extend_from_slice(&SWAP_BASE_INPUT_DISCRIMINATOR);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());
    data
}

pub fn build_swap_instruction(
    keys: &RaydiumCpmmAccounts,
    pool: &PoolKeys,
    accounts: &SwapAccounts,
    amount_in: u64,
    min_amount_out: u64,
) -> Result<Instruction> {
    let side = pool.side(&accounts.mint_in)?;
    let (input_program, output_program) = if side.a_to_b {
        (keys.token_program_a, keys.token_program_b)
    } else {
        (keys.token_program_b, keys.token_program_a)
    };

    let metas = vec![
        AccountMeta::new_readonly(accounts.owner, true),
        AccountMeta::new_readonly(keys.authority, false),
        AccountMeta::new_readonly(keys.amm_config, false),
        AccountMeta::new(pool.address, false),
        AccountMeta::new(accounts.user_source, false),
        AccountMeta::new(accounts.user_destination, false),
        AccountMeta::new(side.vault_in, false),
        AccountMeta::new(side.vault_out, false),
        AccountMeta::new_readonly(input_program, false),
        AccountMeta::new_readonly(output_program, false),
        AccountMeta::new_readonly(side.mint_in, false),
        AccountMeta::new_readonly(side.mint_out, false),
        AccountMeta::new(keys.observation, false),
    ];

    Ok(Instruction {
        program_id: keys.program_id,
        accounts: metas,
        data: swap_instruction_data(amount_in, min_amount_out),
    })
}

#[async_trait::async_trait]
impl DexAdapter for RaydiumCpmmAdapter {
    fn get_label(&self) -> DexLabel {
        DexLabel::RaydiumCpmm
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    async fn load_pool(&self, pool_address: &Pubkey) -> Result<PoolKeys> {
        info!("Fetching Raydium CPMM pool data for: {}", pool_address);

        let account = self.rpc_client.get_account(pool_address).await?;
        if account.owner != self.program_id {
            error!("❌ Invalid pool owner. Expected: {}, Got: {}", self.program_id, account.owner);
            return Err(ExecutionError::UnsupportedPool(*pool_address, account.owner).into());
        }
        let state = decode_pool_state(&account.data).context("decoding CPMM pool state")?;
        if let Err(e) = ensure_swap_enabled(pool_address, &state) {
            warn!("⚠️ {}", e);
            return Err(e.into());
        }

        let accounts = self
            .rpc_client
            .get_multiple_accounts(&[state.amm_config(), state.token_0_vault(), state.token_1_vault()])
            .await?;
        let config = decode_amm_config(&accounts[0].data).context("decoding CPMM amm config")?;
        let vault_0 = decode_token_account(&accounts[1].data)?;
        let vault_1 = decode_token_account(&accounts[2].data)?;

        let keys = assemble_pool_keys(pool_address, &self.program_id, &state, &config, vault_0.amount, vault_1.amount);
        info!(
            "💰 Reserves: {} {} ↔ {} {} (fee {:.2} bps)",
            keys.reserve_a,
            token_symbol(&keys.mint_a),
            keys.reserve_b,
            token_symbol(&keys.mint_b),
            keys.fees.as_bps()
        );
        Ok(keys)
    }

    fn create_swap_instruction(
        &self,
        pool: &PoolKeys,
        accounts: &SwapAccounts,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<Instruction> {
        let PoolAccounts::RaydiumCpmm(keys) = &pool.accounts else {
            return Err(ExecutionError::Instruction(format!("pool {} is not a Raydium CPMM pool", pool.address)).into());
        };
        build_swap_instruction(keys, pool, accounts, amount_in, min_amount_out)
    }
}
