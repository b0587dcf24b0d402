//! Raydium CPMM (constant product) anchor account layouts

use bytemuck::{Pod, Zeroable};
use solana_sdk::pubkey::Pubkey;

use crate::exchanges::common::layout::{check_account_discriminator, read_pod};
use crate::shared::errors::DecodeError;

/// `PoolState` account including its 8-byte discriminator
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CpmmPoolState {
    pub discriminator: [u8; 8],
    pub amm_config: [u8; 32],
    pub pool_creator: [u8; 32],
    pub token_0_vault: [u8; 32],
    pub token_1_vault: [u8; 32],
    pub lp_mint: [u8; 32],
    pub token_0_mint: [u8; 32],
    pub token_1_mint: [u8; 32],
    pub token_0_program: [u8; 32],
    pub token_1_program: [u8; 32],
    pub observation_key: [u8; 32],
    pub auth_bump: u8,
    /// Bit flags: 1 disables deposit, 2 withdraw, 4 swap
    pub status: u8,
    pub lp_mint_decimals: u8,
    pub mint_0_decimals: u8,
    pub mint_1_decimals: u8,
    pub lp_supply: u64,
    pub protocol_fees_token_0: u64,
    pub protocol_fees_token_1: u64,
    pub fund_fees_token_0: u64,
    pub fund_fees_token_1: u64,
    pub open_time: u64,
    pub recent_epoch: u64,
    pub padding: [u64; 31],
}

impl CpmmPoolState {
    pub const LEN: usize = std::mem::size_of::<CpmmPoolState>();
    const SWAP_DISABLED: u8 = 1 << 2;

    pub fn amm_config(&self) -> Pubkey {
        Pubkey::new_from_array(self.amm_config)
    }

    pub fn token_0_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_0_vault)
    }

    pub fn token_1_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_1_vault)
    }

    pub fn token_0_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_0_mint)
    }

    pub fn token_1_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_1_mint)
    }

    pub fn token_0_program(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_0_program)
    }

    pub fn token_1_program(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_1_program)
    }

    pub fn observation_key(&self) -> Pubkey {
        Pubkey::new_from_array(self.observation_key)
    }

    pub fn swap_enabled(&self) -> bool {
        self.status & Self::SWAP_DISABLED == 0
    }

    /// Vault balances minus fees the pool holds for protocol and fund
    pub fn vault_reserves(&self, vault_0_amount: u64, vault_1_amount: u64) -> (u64, u64) {
        let fees_0 = self.protocol_fees_token_0.saturating_add(self.fund_fees_token_0);
        let fees_1 = self.protocol_fees_token_1.saturating_add(self.fund_fees_token_1);
        (vault_0_amount.saturating_sub(fees_0), vault_1_amount.saturating_sub(fees_1))
    }
}

/// `AmmConfig` account: fee rates shared by pools
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CpmmConfig {
    pub discriminator: [u8; 8],
    pub bump: u8,
    pub disable_create_pool: u8,
    pub index: u16,
    pub trade_fee_rate: u64,
    pub protocol_fee_rate: u64,
    pub fund_fee_rate: u64,
    pub create_pool_fee: u64,
    pub protocol_owner: [u8; 32],
    pub fund_owner: [u8; 32],
    pub padding: [u64; 16],
}

impl CpmmConfig {
    pub const LEN: usize = std::mem::size_of::<CpmmConfig>();
}

pub fn decode_pool_state(data: &[u8]) -> Result<CpmmPoolState, DecodeError> {
    check_account_discriminator("CpmmPoolState", "PoolState", data)?;
    read_pod("CpmmPoolState", data)
}

pub fn decode_amm_config(data: &[u8]) -> Result<CpmmConfig, DecodeError> {
    check_account_discriminator("CpmmConfig", "AmmConfig", data)?;
    read_pod("CpmmConfig", data)
}

/// Pool authority PDA shared by every CPMM pool
pub fn pool_authority(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[super::AUTH_SEED], program_id).0
}


#[cfg(test)]
mod tests {
    use super::test_data::*;
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(CpmmPoolState::LEN, 637);
        assert_eq!(CpmmConfig::LEN, 236);
        assert_eq!(std::mem::offset_of!(CpmmPoolState, token_0_vault), 72);
        assert_eq!(std::mem::offset_of!(CpmmPoolState, token_0_mint), 168);
        assert_eq!(std::mem::offset_of!(CpmmPoolState, observation_key), 296);
        assert_eq!(std::mem::offset_of!(CpmmPoolState, mint_0_decimals), 331);
        assert_eq!(std::mem::offset_of!(CpmmPoolState, protocol_fees_token_0), 341);
        assert_eq!(std::mem::offset_of!(CpmmConfig, trade_fee_rate), 12);
    }

    #[test]
    fn test_decode_pool_state() {
        let mint_0 = Pubkey::new_unique();
        let mint_1 = Pubkey::new_unique();
        let state = pool_state(mint_0, mint_1);
        let decoded = decode_pool_state(bytemuck::bytes_of(&state)).unwrap();

        assert_eq!(decoded.token_0_mint(), mint_0);
        assert_eq!(decoded.token_1_mint(), mint_1);
        assert_eq!(decoded.token_0_vault(), state.token_0_vault());
        assert_eq!(decoded.token_0_program(), spl_token::ID);
        assert!(decoded.swap_enabled());
        assert_eq!(decoded.vault_reserves(1_000, 5), (850, 0));
    }

    #[test]
    fn test_swap_status_bit() {
        let mut state = pool_state(Pubkey::new_unique(), Pubkey::new_unique());
        state.status = 4;
        assert!(!state.swap_enabled());
        state.status = 3;
        assert!(state.swap_enabled());
    }

    #[test]
    fn test_decode_rejects_wrong_discriminator() {
        let state = pool_state(Pubkey::new_unique(), Pubkey::new_unique());
        let mut data = bytemuck::bytes_of(&state).to_vec();
        data[0] ^= 0xff;
        assert!(matches!(decode_pool_state(&data), Err(DecodeError::Discriminator { .. })));

        let config = amm_config(2_500);
        assert!(matches!(
            decode_pool_state(bytemuck::bytes_of(&config)),
            Err(DecodeError::Discriminator { .. })
        ));
        assert!(matches!(
            decode_pool_state(&bytemuck::bytes_of(&state)[..600]),
            Err(DecodeError::TooShort { expected: 637, .. })
        ));
    }

    #[test]
    fn test_decode_amm_config() {
        let config = amm_config(2_500);
        let decoded = decode_amm_config(bytemuck::bytes_of(&config)).unwrap();
        let rate = decoded.trade_fee_rate;
        assert_eq!(rate, 2_500);
    }

    #[test]
    fn test_pool_authority_is_stable() {
        let program = Pubkey::new_unique();
        assert_eq!(pool_authority(&program), pool_authority(&program));
        assert_ne!(pool_authority(&program), pool_authority(&Pubkey::new_unique()));
    }
}
