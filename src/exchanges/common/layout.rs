//! Helpers for fixed-size on-chain account layouts

use bytemuck::Pod;
use sha2::{Digest, Sha256};

use crate::shared::errors::DecodeError;

/// Read a packed little-endian record from the start of `data`.
///
/// Accounts are allowed to be longer than the record; trailing bytes are ignored.
pub fn read_pod<T: Pod>(layout: &'static str, data: &[u8]) -> Result<T, DecodeError> {
    let expected = std::mem::size_of::<T>();
    if data.len() < expected {
        return Err(DecodeError::TooShort {
            layout,
            expected,
            actual: data.len(),
        });
    }
    Ok(bytemuck::pod_read_unaligned(&data[..expected]))
}

/// Anchor discriminator: first 8 bytes of `sha256("<namespace>:<name>")`
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Check an anchor account discriminator before decoding the body
pub fn check_account_discriminator(
    layout: &'static str,
    account_name: &str,
    data: &[u8],
) -> Result<(), DecodeError> {
    if data.len() < 8 {
        return Err(DecodeError::TooShort {
            layout,
            expected: 8,
            actual: data.len(),
        });
    }
    if data[..8] != anchor_discriminator("account", account_name) {
        return Err(DecodeError::Discriminator { layout });
    }
    Ok(())
}
