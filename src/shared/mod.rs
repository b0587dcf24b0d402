//! Shared components - errors and wallet key handling

pub mod errors;
pub mod wallets;
