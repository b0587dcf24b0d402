// src/math.rs
use rand::Rng;
use solana_sdk::pubkey::Pubkey;

use crate::exchanges::types::{PoolFees, PoolKeys, SwapDirection, SwapQuote};
use crate::shared::errors::ExecutionError;
use crate::shared::wallets::BalanceSnapshot;

/// Calculate minimum output amount with slippage protection (floored)
pub fn calculate_min_out(amount_out: u64, slippage_bps: u32) -> u64 {
    let slippage_bps = slippage_bps.min(10_000) as u128;
    (amount_out as u128 * (10_000 - slippage_bps) / 10_000) as u64
}

/// Fee charged on the input, rounded up
pub fn calculate_fee(amount_in: u64, fees: &PoolFees) -> u64 {
    if fees.denominator == 0 || fees.numerator == 0 {
        return 0;
    }
    let fee = (amount_in as u128 * fees.numerator as u128).div_ceil(fees.denominator as u128);
    fee.min(amount_in as u128) as u64
}

/// `x * y = k` output for an input that already had its fee removed
pub fn constant_product_out(amount_in: u64, reserve_in: u64, reserve_out: u64) -> u64 {
    let denominator = reserve_in as u128 + amount_in as u128;
    if denominator == 0 {
        return 0;
    }
    (reserve_out as u128 * amount_in as u128 / denominator) as u64
}

/// Quote a swap spending `amount_in` of `mint_in` against the pool's current reserves
pub fn quote_swap(pool: &PoolKeys, mint_in: &Pubkey, amount_in: u64, slippage_bps: u32) -> Result<SwapQuote, ExecutionError> {
    if amount_in == 0 {
        return Err(ExecutionError::ZeroAmount);
    }
    let side = pool.side(mint_in)?;
    let fee_amount = calculate_fee(amount_in, &pool.fees);
    let amount_out = constant_product_out(amount_in - fee_amount, side.reserve_in, side.reserve_out);

    Ok(SwapQuote {
        pool_address: pool.address,
        mint_in: side.mint_in,
        mint_out: side.mint_out,
        amount_in,
        amount_out,
        fee_amount,
        min_amount_out: calculate_min_out(amount_out, slippage_bps),
    })
}

/// Price impact of a trade in basis points
pub fn calculate_price_impact_bps(amount_in: u64, reserve_in: u64, reserve_out: u64) -> f64 {
    if reserve_in == 0 || reserve_out == 0 {
        return 0.0;
    }
    let k = reserve_in as f64 * reserve_out as f64;
    let new_reserve_out = k / (reserve_in as f64 + amount_in as f64);
    (reserve_out as f64 - new_reserve_out) / reserve_out as f64 * 10_000.0
}

pub fn has_min_holdings(balance: f64, supply: f64, fraction: f64) -> bool {
    balance >= fraction * supply
}

/// Share of the supply held, in percent
pub fn holding_percentage(balance: f64, supply: f64) -> f64 {
    if supply <= 0.0 {
        return 0.0;
    }
    balance / supply * 100.0
}

/// Random percentage of `holding` between the two bounds, in either order
pub fn trade_amount<R: Rng + ?Sized>(holding: f64, pct_start: f64, pct_end: f64, rng: &mut R) -> f64 {
    let (lo, hi) = if pct_start <= pct_end { (pct_start, pct_end) } else { (pct_end, pct_start) };
    let pct = if lo == hi { lo } else { rng.gen_range(lo..=hi) };
    holding * pct / 100.0
}

pub fn sell_amount<R: Rng + ?Sized>(holding: f64, pct_min: f64, pct_max: f64, rng: &mut R) -> f64 {
    trade_amount(holding, pct_min, pct_max, rng)
}

pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> SwapDirection {
    if rng.gen_bool(0.5) {
        SwapDirection::Buy
    } else {
        SwapDirection::Sell
    }
}

/// One wallet's slice of a proportional trade
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub wallet: String,
    pub private_key: String,
    /// Tokens for a sell, SOL for a buy
    pub amount: f64,
}

/// Split `total` across snapshot wallets in proportion to their balance.
///
/// Sells draw on token balances and skip empty wallets. Buys draw on SOL and
/// skip wallets at or below `min_sol_balance`. A wallet holding less than its
/// share trades everything it has.
pub fn allocate(direction: SwapDirection, snapshot: &BalanceSnapshot, total: f64, min_sol_balance: f64) -> Vec<Allocation> {
    let balance_of = |b: &crate::shared::wallets::WalletBalance| match direction {
        SwapDirection::Sell => b.token_balance,
        SwapDirection::Buy => b.sol_balance,
    };
    let pool_total: f64 = snapshot.wallets.values().map(balance_of).sum();
    if pool_total <= 0.0 || total <= 0.0 {
        return Vec::new();
    }

    let mut remaining = total;
    let mut out = Vec::new();
    for (address, wallet) in &snapshot.wallets {
        if remaining <= 0.0 {
            break;
        }
        let balance = balance_of(wallet);
        let skip = match direction {
            SwapDirection::Sell => balance <= 0.0,
            SwapDirection::Buy => balance <= min_sol_balance,
        };
        if skip {
            continue;
        }

        let share = balance / pool_total * total;
        let amount = if balance < share { balance } else { share };
        remaining -= amount;
        out.push(Allocation {
            wallet: address.clone(),
            private_key: wallet.private_key.clone(),
            amount,
        });
    }
    out
}
