use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Whole lamports, rounded down
pub fn sol_to_lamports(sol: f64) -> u64 {
    ui_to_raw(sol, 9)
}

/// Convert a UI amount to base units of a mint with `decimals`, rounded down.
/// Negative and non-finite inputs map to zero.
pub fn ui_to_raw(amount: f64, decimals: u8) -> u64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    let raw = (amount * 10f64.powi(decimals as i32)).floor();
    if raw >= u64::MAX as f64 {
        u64::MAX
    } else {
        raw as u64
    }
}

pub fn raw_to_ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

pub fn format_sol(sol: f64) -> String {
    format!("{:.9} SOL", sol)
}

pub fn format_pool_address(address: &Pubkey) -> String {
    let s = address.to_string();
    format!("{}...{}", &s[..8], &s[s.len() - 8..])
}
