use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_token::state::Account as TokenAccount;

use crate::shared::errors::DecodeError;

/// Wrapped SOL mint
pub const WSOL_MINT: Pubkey = spl_token::native_mint::ID;

pub const TOKEN_2022_PROGRAM: Pubkey = solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// True for the legacy token program and Token-2022
pub fn is_token_program(program: &Pubkey) -> bool {
    *program == spl_token::ID || *program == TOKEN_2022_PROGRAM
}

// Known tokens for nicer log output
const KNOWN_TOKENS: &[(&str, &str, u8)] = &[
    ("So11111111111111111111111111111111111111112", "SOL", 9),
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC", 6),
    ("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT", 6),
    ("4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R", "RAY", 6),
];

/// Look up symbol and decimals of a well-known mint
pub fn get_token_info(mint: &str) -> Option<(&'static str, u8)> {
    KNOWN_TOKENS
        .iter()
        .find(|(addr, _, _)| *addr == mint)
        .map(|(_, symbol, decimals)| (*symbol, *decimals))
}

pub fn token_symbol(mint: &Pubkey) -> String {
    get_token_info(&mint.to_string())
        .map(|(symbol, _)| symbol.to_string())
        .unwrap_or_else(|| {
            let s = mint.to_string();
            format!("{}..", &s[..6])
        })
}

/// Size of an SPL token account
pub fn token_account_len() -> usize {
    TokenAccount::LEN
}

/// Decode an SPL token account (mint, owner, raw amount, ...)
pub fn decode_token_account(data: &[u8]) -> Result<TokenAccount, DecodeError> {
    if data.len() < TokenAccount::LEN {
        return Err(DecodeError::TooShort {
            layout: "TokenAccount",
            expected: TokenAccount::LEN,
            actual: data.len(),
        });
    }
    TokenAccount::unpack_from_slice(&data[..TokenAccount::LEN]).map_err(|e| DecodeError::Unpack(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::program_option::COption;
    use spl_token::state::AccountState;

    #[test]
    fn test_known_tokens() {
        assert_eq!(get_token_info("So11111111111111111111111111111111111111112"), Some(("SOL", 9)));
        assert_eq!(get_token_info("unknown"), None);
        assert_eq!(token_symbol(&WSOL_MINT), "SOL");
    }

    #[test]
    fn test_token_programs() {
        assert!(is_token_program(&spl_token::ID));
        assert!(is_token_program(&TOKEN_2022_PROGRAM));
        assert!(!is_token_program(&Pubkey::new_unique()));
    }

    #[test]
    fn test_decode_token_account() {
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let account = TokenAccount {
            mint,
            owner,
            amount: 123_456,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(account, &mut data).unwrap();
        assert_eq!(u64::from_le_bytes(data[64..72].try_into().unwrap()), 123_456);

        let decoded = decode_token_account(&data).unwrap();
        assert_eq!(decoded.mint, mint);
        assert_eq!(decoded.owner, owner);
        assert_eq!(decoded.amount, 123_456);
        assert_eq!(token_account_len(), 165);
    }
}
