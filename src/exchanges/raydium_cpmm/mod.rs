pub mod adapter;
pub mod parser;

pub use adapter::RaydiumCpmmAdapter;
pub use parser::{decode_amm_config, decode_pool_state, CpmmConfig, CpmmPoolState};

/// Seed of the vault and LP mint authority PDA
pub const AUTH_SEED: &[u8] = b"vault_and_lp_mint_auth_seed";

/// Fee rates are expressed in millionths
pub const FEE_RATE_DENOMINATOR: u64 = 1_000_000;
