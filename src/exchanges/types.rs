use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::ExecutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DexLabel {
    RaydiumV4,
    RaydiumCpmm,
}

impl DexLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DexLabel::RaydiumV4 => "Raydium V4",
            DexLabel::RaydiumCpmm => "Raydium CPMM",
        }
    }
}

/// Which way a trade goes relative to wrapped SOL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// SOL in, token out
    Buy,
    /// Token in, SOL out
    Sell,
}

impl std::fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapDirection::Buy => write!(f, "BUY"),
            SwapDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// Fee charged on the input amount as `numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolFees {
    pub numerator: u64,
    pub denominator: u64,
}

impl PoolFees {
    pub fn as_bps(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 * 10_000.0 / self.denominator as f64
    }
}

/// Accounts an AMM v4 swap needs besides the pool vaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaydiumV4Accounts {
    pub program_id: Pubkey,
    pub authority: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub market_program: Pubkey,
    pub market: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub event_queue: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_authority: Pubkey,
}

/// Accounts a CPMM swap needs besides the pool vaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaydiumCpmmAccounts {
    pub program_id: Pubkey,
    pub authority: Pubkey,
    pub amm_config: Pubkey,
    pub observation: Pubkey,
    pub token_program_a: Pubkey,
    pub token_program_b: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolAccounts {
    RaydiumV4(RaydiumV4Accounts),
    RaydiumCpmm(RaydiumCpmmAccounts),
}

/// Decoded and hydrated pool: everything needed to quote and build a swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolKeys {
    pub address: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub decimals_a: u8,
    pub decimals_b: u8,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub fees: PoolFees,
    pub accounts: PoolAccounts,
}

/// One side of a pool seen from the trader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSide {
    pub mint_in: Pubkey,
    pub mint_out: Pubkey,
    pub vault_in: Pubkey,
    pub vault_out: Pubkey,
    pub reserve_in: u64,
    pub reserve_out: u64,
    pub decimals_in: u8,
    pub decimals_out: u8,
    /// True when the input is the pool's `a` side
    pub a_to_b: bool,
}

impl PoolKeys {
    pub fn dex_label(&self) -> DexLabel {
        match self.accounts {
            PoolAccounts::RaydiumV4(_) => DexLabel::RaydiumV4,
            PoolAccounts::RaydiumCpmm(_) => DexLabel::RaydiumCpmm,
        }
    }

    /// Orient the pool for a swap that spends `mint_in`
    pub fn side(&self, mint_in: &Pubkey) -> Result<SwapSide, ExecutionError> {
        if *mint_in == self.mint_a {
            Ok(SwapSide {
                mint_in: self.mint_a,
                mint_out: self.mint_b,
                vault_in: self.vault_a,
                vault_out: self.vault_b,
                reserve_in: self.reserve_a,
                reserve_out: self.reserve_b,
                decimals_in: self.decimals_a,
                decimals_out: self.decimals_b,
                a_to_b: true,
            })
        } else if *mint_in == self.mint_b {
            Ok(SwapSide {
                mint_in: self.mint_b,
                mint_out: self.mint_a,
                vault_in: self.vault_b,
                vault_out: self.vault_a,
                reserve_in: self.reserve_b,
                reserve_out: self.reserve_a,
                decimals_in: self.decimals_b,
                decimals_out: self.decimals_a,
                a_to_b: false,
            })
        } else {
            Err(ExecutionError::MintNotInPool {
                pool: self.address,
                mint: *mint_in,
            })
        }
    }

    /// The non-SOL mint of a SOL pair
    pub fn traded_mint(&self, wsol: &Pubkey) -> Result<Pubkey, ExecutionError> {
        if self.mint_a == *wsol {
            Ok(self.mint_b)
        } else if self.mint_b == *wsol {
            Ok(self.mint_a)
        } else {
            Err(ExecutionError::NoSolSide(self.address))
        }
    }

    /// Token program that owns `mint`. AMM v4 only trades legacy SPL tokens.
    pub fn token_program_of(&self, mint: &Pubkey) -> Option<Pubkey> {
        let (program_a, program_b) = match &self.accounts {
            PoolAccounts::RaydiumV4(_) => (spl_token::ID, spl_token::ID),
            PoolAccounts::RaydiumCpmm(keys) => (keys.token_program_a, keys.token_program_b),
        };
        if *mint == self.mint_a {
            Some(program_a)
        } else if *mint == self.mint_b {
            Some(program_b)
        } else {
            None
        }
    }

    pub fn decimals_of(&self, mint: &Pubkey) -> Option<u8> {
        if *mint == self.mint_a {
            Some(self.decimals_a)
        } else if *mint == self.mint_b {
            Some(self.decimals_b)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub pool_address: Pubkey,
    pub mint_in: Pubkey,
    pub mint_out: Pubkey,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
    pub min_amount_out: u64,
}

/// User-side accounts of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAccounts {
    pub owner: Pubkey,
    pub user_source: Pubkey,
    pub user_destination: Pubkey,
    pub mint_in: Pubkey,
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub fn v4_pool(mint_a: Pubkey, mint_b: Pubkey) -> PoolKeys {
        PoolKeys {
            address: Pubkey::new_unique(),
            mint_a,
            mint_b,
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            decimals_a: 9,
            decimals_b: 6,
            reserve_a: 1_000_000_000_000,
            reserve_b: 50_000_000_000_000,
            fees: PoolFees { numerator: 25, denominator: 10_000 },
            accounts: PoolAccounts::RaydiumV4(RaydiumV4Accounts {
                program_id: Pubkey::new_unique(),
                authority: Pubkey::new_unique(),
                open_orders: Pubkey::new_unique(),
                target_orders: Pubkey::new_unique(),
                market_program: Pubkey::new_unique(),
                market: Pubkey::new_unique(),
                bids: Pubkey::new_unique(),
                asks: Pubkey::new_unique(),
                event_queue: Pubkey::new_unique(),
                market_base_vault: Pubkey::new_unique(),
                market_quote_vault: Pubkey::new_unique(),
                market_authority: Pubkey::new_unique(),
            }),
        }
    }

    pub fn cpmm_pool(mint_a: Pubkey, mint_b: Pubkey) -> PoolKeys {
        PoolKeys {
            address: Pubkey::new_unique(),
            mint_a,
            mint_b,
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            decimals_a: 9,
            decimals_b: 9,
            reserve_a: 500_000_000_000,
            reserve_b: 2_000_000_000_000_000,
            fees: PoolFees { numerator: 2_500, denominator: 1_000_000 },
            accounts: PoolAccounts::RaydiumCpmm(RaydiumCpmmAccounts {
                program_id: Pubkey::new_unique(),
                authority: Pubkey::new_unique(),
                amm_config: Pubkey::new_unique(),
                observation: Pubkey::new_unique(),
                token_program_a: spl_token::ID,
                token_program_b: spl_token::ID,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::{cpmm_pool, v4_pool};
    use super::*;
    use crate::exchanges::common::WSOL_MINT;

    #[test]
    fn test_side_orientation() {
        let token = Pubkey::new_unique();
        let pool = v4_pool(WSOL_MINT, token);

        let buy = pool.side(&WSOL_MINT).unwrap();
        assert!(buy.a_to_b);
        assert_eq!(buy.vault_in, pool.vault_a);
        assert_eq!(buy.reserve_out, pool.reserve_b);

        let sell = pool.side(&token).unwrap();
        assert!(!sell.a_to_b);
        assert_eq!(sell.mint_out, WSOL_MINT);
        assert_eq!(sell.decimals_in, 6);

        assert!(matches!(
            pool.side(&Pubkey::new_unique()),
            Err(ExecutionError::MintNotInPool { .. })
        ));
    }

    #[test]
    fn test_traded_mint() {
        let token = Pubkey::new_unique();
        assert_eq!(v4_pool(token, WSOL_MINT).traded_mint(&WSOL_MINT).unwrap(), token);
        assert_eq!(v4_pool(WSOL_MINT, token).traded_mint(&WSOL_MINT).unwrap(), token);
        let no_sol = v4_pool(Pubkey::new_unique(), token);
        assert!(matches!(no_sol.traded_mint(&WSOL_MINT), Err(ExecutionError::NoSolSide(_))));
    }

    #[test]
    fn test_token_program_of() {
        let token = Pubkey::new_unique();
        let token_2022 = Pubkey::new_unique();
        let mut pool = cpmm_pool(WSOL_MINT, token);
        if let PoolAccounts::RaydiumCpmm(keys) = &mut pool.accounts {
            keys.token_program_b = token_2022;
        }
        assert_eq!(pool.token_program_of(&WSOL_MINT), Some(spl_token::ID));
        assert_eq!(pool.token_program_of(&token), Some(token_2022));
        assert_eq!(pool.token_program_of(&Pubkey::new_unique()), None);
        assert_eq!(v4_pool(token, WSOL_MINT).token_program_of(&token), Some(spl_token::ID));
    }

    #[test]
    fn test_labels_and_fees() {
        assert_eq!(DexLabel::RaydiumCpmm.as_str(), "Raydium CPMM");
        assert_eq!(PoolFees { numerator: 25, denominator: 10_000 }.as_bps(), 25.0);
    }
}
