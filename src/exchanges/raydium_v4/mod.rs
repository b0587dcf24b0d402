pub mod adapter;
pub mod parser;

pub use adapter::RaydiumV4Adapter;
pub use parser::{decode_amm_info, decode_market, AmmInfo, MarketStateV3};

/// Seed of the AMM authority PDA
pub const AUTHORITY_SEED: &[u8] = b"amm authority";

/// Instruction tag of `SwapBaseIn`
pub const SWAP_BASE_IN_TAG: u8 = 9;
