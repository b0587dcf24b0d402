pub mod common;
pub mod compute_budget;
pub mod raydium_cpmm;
pub mod raydium_v4;
pub mod transaction_builder;
pub mod types;
pub mod utils;

use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use std::sync::Arc;
use tracing::info;

use crate::config::ProgramIds;
use crate::exchanges::types::{DexLabel, PoolKeys, SwapAccounts};
use crate::infrastructure::blockchain::SolanaRpcClient;
use crate::shared::errors::ExecutionError;

#[async_trait]
pub trait DexAdapter: Send + Sync {
    fn get_label(&self) -> DexLabel;

    fn program_id(&self) -> Pubkey;

    /// Fetch and decode the pool with everything a swap needs
    async fn load_pool(&self, pool_address: &Pubkey) -> Result<PoolKeys>;

    fn create_swap_instruction(
        &self,
        pool: &PoolKeys,
        accounts: &SwapAccounts,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<Instruction>;
}

pub fn create_adapter(dex_label: DexLabel, rpc_client: Arc<SolanaRpcClient>, programs: &ProgramIds) -> Box<dyn DexAdapter> {
    match dex_label {
        DexLabel::RaydiumV4 => Box::new(raydium_v4::RaydiumV4Adapter::new(rpc_client, programs.raydium_v4, programs.openbook)),
        DexLabel::RaydiumCpmm => Box::new(raydium_cpmm::RaydiumCpmmAdapter::new(rpc_client, programs.raydium_cpmm)),
    }
}

/// Map an account owner program to the DEX that runs it
pub fn dex_for_owner(owner: &Pubkey, programs: &ProgramIds) -> Option<DexLabel> {
    if *owner == programs.raydium_v4 {
        Some(DexLabel::RaydiumV4)
    } else if *owner == programs.raydium_cpmm {
        Some(DexLabel::RaydiumCpmm)
    } else {
        None
    }
}

/// Pick the adapter by looking at who owns the pool account
pub async fn detect_adapter(
    pool_address: &Pubkey,
    rpc_client: Arc<SolanaRpcClient>,
    programs: &ProgramIds,
) -> Result<Box<dyn DexAdapter>> {
    let account = rpc_client.get_account(pool_address).await?;
    let label = dex_for_owner(&account.owner, programs)
        .ok_or(ExecutionError::UnsupportedPool(*pool_address, account.owner))?;
    info!("🔍 Pool {} is a {} pool", pool_address, label.as_str());
    Ok(create_adapter(label, rpc_client, programs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn programs() -> ProgramIds {
        ProgramIds {
            raydium_v4: Pubkey::new_unique(),
            raydium_cpmm: Pubkey::new_unique(),
            openbook: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_dex_for_owner() {
        let programs = programs();
        assert_eq!(dex_for_owner(&programs.raydium_v4, &programs), Some(DexLabel::RaydiumV4));
        assert_eq!(dex_for_owner(&programs.raydium_cpmm, &programs), Some(DexLabel::RaydiumCpmm));
        assert_eq!(dex_for_owner(&programs.openbook, &programs), None);
    }

    #[test]
    fn test_create_adapter_uses_configured_program() {
        let programs = programs();
        let rpc = Arc::new(SolanaRpcClient::new("http://127.0.0.1:8899".to_string()));
        let v4 = create_adapter(DexLabel::RaydiumV4, rpc.clone(), &programs);
        let cpmm = create_adapter(DexLabel::RaydiumCpmm, rpc, &programs);
        assert_eq!(v4.get_label(), DexLabel::RaydiumV4);
        assert_eq!(v4.program_id(), programs.raydium_v4);
        assert_eq!(cpmm.program_id(), programs.raydium_cpmm);
    }
}
