//! Error handling for the application

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Account-layout decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{layout} data too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        layout: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{layout} discriminator mismatch")]
    Discriminator { layout: &'static str },

    #[error("{layout} is not initialized")]
    Uninitialized { layout: &'static str },

    #[error("Failed to derive {what} address")]
    Derivation { what: &'static str },

    #[error("Invalid base58 input: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("Borsh decoding failed: {0}")]
    Borsh(#[from] std::io::Error),

    #[error("SPL account unpack failed: {0}")]
    Unpack(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid pubkey in {field}: {value}")]
    InvalidPubkey { field: &'static str, value: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Wallet key file errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Failed to read key file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Key file {0} contains no keys")]
    Empty(String),

    #[error("Invalid secret key on line {line}: {reason}")]
    InvalidKey { line: usize, reason: String },
}

/// Swap execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Pool {0} is not owned by a supported AMM program (owner {1})")]
    UnsupportedPool(Pubkey, Pubkey),

    #[error("Pool {pool} does not trade {mint}")]
    MintNotInPool { pool: Pubkey, mint: Pubkey },

    #[error("Pool {0} pairs no wrapped SOL side")]
    NoSolSide(Pubkey),

    #[error("Account {0} is not a token mint (owner {1})")]
    NotAMint(Pubkey, Pubkey),

    #[error("No token account for mint {0}")]
    MissingTokenAccount(Pubkey),

    #[error("Swaps are disabled on pool {0}")]
    SwapDisabled(Pubkey),

    #[error("Account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("Swap amount must be greater than zero")]
    ZeroAmount,

    #[error("Transaction too large: {0} bytes")]
    TransactionTooLarge(usize),

    #[error("Transaction simulation failed: {0}")]
    Simulation(String),

    #[error("Failed to build instruction: {0}")]
    Instruction(String),

    #[error("Failed to sign transaction: {0}")]
    Signing(String),
}
