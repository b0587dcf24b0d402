//! Raydium AMM v4 and OpenBook market account layouts

use bytemuck::{Pod, Zeroable};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::exchanges::common::read_pod;
use crate::shared::errors::DecodeError;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Fees {
    pub min_separate_numerator: u64,
    pub min_separate_denominator: u64,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub pnl_numerator: u64,
    pub pnl_denominator: u64,
    pub swap_fee_numerator: u64,
    pub swap_fee_denominator: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct OutPutData {
    pub need_take_pnl_coin: u64,
    pub need_take_pnl_pc: u64,
    pub total_pnl_pc: u64,
    pub total_pnl_coin: u64,
    pub pool_open_time: u64,
    pub punish_pc_amount: u64,
    pub punish_coin_amount: u64,
    pub orderbook_to_init_time: u64,
    pub swap_coin_in_amount: u128,
    pub swap_pc_out_amount: u128,
    pub swap_coin2pc_fee: u64,
    pub swap_pc_in_amount: u128,
    pub swap_coin_out_amount: u128,
    pub swap_pc2coin_fee: u64,
}

/// Raydium AMM v4 pool account (`AmmInfo`)
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct AmmInfo {
    pub status: u64,
    pub nonce: u64,
    pub order_num: u64,
    pub depth: u64,
    pub coin_decimals: u64,
    pub pc_decimals: u64,
    pub state: u64,
    pub reset_flag: u64,
    pub min_size: u64,
    pub vol_max_cut_ratio: u64,
    pub amount_wave_ratio: u64,
    pub coin_lot_size: u64,
    pub pc_lot_size: u64,
    pub min_price_multiplier: u64,
    pub max_price_multiplier: u64,
    pub system_decimals_value: u64,
    pub fees: Fees,
    pub out_put: OutPutData,
    pub pool_coin_token_account: [u8; 32],
    pub pool_pc_token_account: [u8; 32],
    pub coin_mint_address: [u8; 32],
    pub pc_mint_address: [u8; 32],
    pub lp_mint_address: [u8; 32],
    pub amm_open_orders: [u8; 32],
    pub serum_market: [u8; 32],
    pub serum_program_id: [u8; 32],
    pub amm_target_orders: [u8; 32],
    pub pool_withdraw_queue: [u8; 32],
    pub pool_temp_lp_token_account: [u8; 32],
    pub amm_owner: [u8; 32],
    pub lp_amount: u64,
    pub client_order_id: u64,
    pub padding: [u64; 2],
}

impl AmmInfo {
    pub const LEN: usize = std::mem::size_of::<AmmInfo>();

    pub fn coin_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.pool_coin_token_account)
    }

    pub fn pc_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.pool_pc_token_account)
    }

    pub fn coin_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.coin_mint_address)
    }

    pub fn pc_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.pc_mint_address)
    }

    pub fn lp_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.lp_mint_address)
    }

    pub fn open_orders(&self) -> Pubkey {
        Pubkey::new_from_array(self.amm_open_orders)
    }

    pub fn market(&self) -> Pubkey {
        Pubkey::new_from_array(self.serum_market)
    }

    pub fn market_program(&self) -> Pubkey {
        Pubkey::new_from_array(self.serum_program_id)
    }

    pub fn target_orders(&self) -> Pubkey {
        Pubkey::new_from_array(self.amm_target_orders)
    }
}

/// Decode an AMM v4 pool account. Uninitialised pools (status 0) are rejected.
pub fn decode_amm_info(data: &[u8]) -> Result<AmmInfo, DecodeError> {
    let info: AmmInfo = read_pod("AmmInfo", data)?;
    let status = info.status;
    if status == 0 {
        return Err(DecodeError::Uninitialized { layout: "AmmInfo" });
    }
    debug!("Decoded AmmInfo: status={} coin_mint={} pc_mint={}", status, info.coin_mint(), info.pc_mint());
    Ok(info)
}

/// Serum / OpenBook account flag bits, little-endian in the first word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountFlags {
    pub initialized: bool,
    pub market: bool,
    pub open_orders: bool,
    pub request_queue: bool,
    pub event_queue: bool,
    pub bids: bool,
    pub asks: bool,
}

impl AccountFlags {
    pub fn from_bits(bits: u64) -> Self {
        Self {
            initialized: bits & 1 != 0,
            market: bits & (1 << 1) != 0,
            open_orders: bits & (1 << 2) != 0,
            request_queue: bits & (1 << 3) != 0,
            event_queue: bits & (1 << 4) != 0,
            bids: bits & (1 << 5) != 0,
            asks: bits & (1 << 6) != 0,
        }
    }
}

/// OpenBook / Serum v3 market state
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MarketStateV3 {
    pub head_padding: [u8; 5],
    pub account_flags: u64,
    pub own_address: [u8; 32],
    pub vault_signer_nonce: u64,
    pub base_mint: [u8; 32],
    pub quote_mint: [u8; 32],
    pub base_vault: [u8; 32],
    pub base_deposits_total: u64,
    pub base_fees_accrued: u64,
    pub quote_vault: [u8; 32],
    pub quote_deposits_total: u64,
    pub quote_fees_accrued: u64,
    pub quote_dust_threshold: u64,
    pub request_queue: [u8; 32],
    pub event_queue: [u8; 32],
    pub bids: [u8; 32],
    pub asks: [u8; 32],
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,
    pub tail_padding: [u8; 7],
}

impl MarketStateV3 {
    pub const LEN: usize = std::mem::size_of::<MarketStateV3>();

    pub fn flags(&self) -> AccountFlags {
        AccountFlags::from_bits(self.account_flags)
    }

    pub fn own_address(&self) -> Pubkey {
        Pubkey::new_from_array(self.own_address)
    }

    pub fn base_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.base_vault)
    }

    pub fn quote_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.quote_vault)
    }

    pub fn event_queue(&self) -> Pubkey {
        Pubkey::new_from_array(self.event_queue)
    }

    pub fn bids(&self) -> Pubkey {
        Pubkey::new_from_array(self.bids)
    }

    pub fn asks(&self) -> Pubkey {
        Pubkey::new_from_array(self.asks)
    }

    /// Vault signer PDA: `[market, nonce_le]` under the market program
    pub fn vault_signer(&self, market: &Pubkey, market_program: &Pubkey) -> Result<Pubkey, DecodeError> {
        let nonce = self.vault_signer_nonce;
        Pubkey::create_program_address(&[market.as_ref(), &nonce.to_le_bytes()], market_program)
            .map_err(|_| DecodeError::Derivation { what: "market vault signer" })
    }
}

pub fn decode_market(data: &[u8]) -> Result<MarketStateV3, DecodeError> {
    let market: MarketStateV3 = read_pod("MarketStateV3", data)?;
    if !market.flags().initialized {
        return Err(DecodeError::Uninitialized { layout: "MarketStateV3" });
    }
    Ok(market)
}

/// AMM authority PDA: `["amm authority", nonce]` under the AMM program
pub fn amm_authority(program_id: &Pubkey, nonce: u64) -> Result<Pubkey, DecodeError> {
    let nonce = u8::try_from(nonce).map_err(|_| DecodeError::Derivation { what: "amm authority" })?;
    Pubkey::create_program_address(&[super::AUTHORITY_SEED, &[nonce]], program_id)
        .map_err(|_| DecodeError::Derivation { what: "amm authority" })
}

#[cfg(test)]
pub(crate) mod test_data {
    use super::*;

    pub struct AmmFixture {
        pub data: Vec<u8>,
        pub coin_mint: Pubkey,
        pub pc_mint: Pubkey,
        pub coin_vault: Pubkey,
        pub pc_vault: Pubkey,
        pub market: Pubkey,
        pub market_program: Pubkey,
        pub open_orders: Pubkey,
        pub target_orders: Pubkey,
    }

    pub fn amm_fixture(coin_mint: Pubkey, pc_mint: Pubkey) -> AmmFixture {
        let mut info = AmmInfo::zeroed();
        info.status = 6;
        info.nonce = 254;
        info.coin_decimals = 9;
        info.pc_decimals = 6;
        info.fees.swap_fee_numerator = 25;
        info.fees.swap_fee_denominator = 10_000;
        info.fees.trade_fee_numerator = 25;
        info.fees.trade_fee_denominator = 10_000;
        info.out_put.need_take_pnl_coin = 1_000;
        info.out_put.need_take_pnl_pc = 2_000;
        info.out_put.swap_coin_in_amount = u128::MAX - 1;

        let coin_vault = Pubkey::new_unique();
        let pc_vault = Pubkey::new_unique();
        let market = Pubkey::new_unique();
        let market_program = Pubkey::new_unique();
        let open_orders = Pubkey::new_unique();
        let target_orders = Pubkey::new_unique();
        info.pool_coin_token_account = coin_vault.to_bytes();
        info.pool_pc_token_account = pc_vault.to_bytes();
        info.coin_mint_address = coin_mint.to_bytes();
        info.pc_mint_address = pc_mint.to_bytes();
        info.serum_market = market.to_bytes();
        info.serum_program_id = market_program.to_bytes();
        info.amm_open_orders = open_orders.to_bytes();
        info.amm_target_orders = target_orders.to_bytes();

        AmmFixture {
            data: bytemuck::bytes_of(&info).to_vec(),
            coin_mint,
            pc_mint,
            coin_vault,
            pc_vault,
            market,
            market_program,
            open_orders,
            target_orders,
        }
    }

    /// Market account bytes with a vault signer nonce that derives a valid PDA
    pub fn market_fixture(market: &Pubkey, market_program: &Pubkey) -> (Vec<u8>, MarketStateV3) {
        let mut state = MarketStateV3::zeroed();
        state.head_padding = *b"serum";
        state.account_flags = 0b11;
        state.own_address = market.to_bytes();
        state.base_vault = Pubkey::new_unique().to_bytes();
        state.quote_vault = Pubkey::new_unique().to_bytes();
        state.event_queue = Pubkey::new_unique().to_bytes();
        state.bids = Pubkey::new_unique().to_bytes();
        state.asks = Pubkey::new_unique().to_bytes();
        state.tail_padding = *b"padding";

        let nonce = (0u64..256)
            .find(|n| {
                Pubkey::create_program_address(&[market.as_ref(), &n.to_le_bytes()], market_program).is_ok()
            })
            .unwrap();
        state.vault_signer_nonce = nonce;
        (bytemuck::bytes_of(&state).to_vec(), state)
    }
}
