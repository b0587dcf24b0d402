//! Wallet key file loading and balance snapshots

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::shared::errors::WalletError;

/// A validated wallet secret key
#[derive(Clone)]
pub struct WalletKey {
    secret: [u8; 64],
    pubkey: Pubkey,
}

impl std::fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKey").field("pubkey", &self.pubkey).finish()
    }
}

impl WalletKey {
    /// Parse a base58 encoded 64-byte secret key. `line` is only used for error reporting.
    pub fn from_base58(encoded: &str, line: usize) -> Result<Self, WalletError> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKey { line, reason: e.to_string() })?;
        Self::from_bytes(&bytes, line)
    }

    fn from_bytes(bytes: &[u8], line: usize) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKey { line, reason: e.to_string() })?;
        let mut secret = [0u8; 64];
        secret.copy_from_slice(&keypair.to_bytes());
        Ok(Self {
            secret,
            pubkey: keypair.pubkey(),
        })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.secret).into_string()
    }

    pub fn keypair(&self) -> Result<Keypair, WalletError> {
        Keypair::try_from(&self.secret[..])
            .map_err(|e| WalletError::InvalidKey { line: 0, reason: e.to_string() })
    }
}

/// Read wallet keys from `path`.
///
/// Plain text files hold one base58 secret key per line. A `.json` path is read
/// as a single Solana CLI keypair file.
pub fn read_private_keys<P: AsRef<Path>>(path: P) -> Result<Vec<WalletKey>, WalletError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    if path.extension().is_some_and(|ext| ext == "json") {
        let keypair = read_keypair_file(path)
            .map_err(|e| WalletError::InvalidKey { line: 1, reason: e.to_string() })?;
        return Ok(vec![WalletKey::from_bytes(&keypair.to_bytes(), 1)?]);
    }

    let contents = fs::read_to_string(path).map_err(|source| WalletError::Read {
        path: display.clone(),
        source,
    })?;
    parse_private_keys(&contents, &display)
}

fn parse_private_keys(contents: &str, source_name: &str) -> Result<Vec<WalletKey>, WalletError> {
    let keys = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| WalletKey::from_base58(line, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;

    if keys.is_empty() {
        return Err(WalletError::Empty(source_name.to_string()));
    }
    Ok(keys)
}

/// Pick one wallet uniformly at random
pub fn choose_random<'a, R: Rng + ?Sized>(keys: &'a [WalletKey], rng: &mut R) -> Option<&'a WalletKey> {
    keys.choose(rng)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub private_key: String,
    pub sol_balance: f64,
    #[serde(rename = "tokenBal")]
    pub token_balance: f64,
}

/// Point-in-time balances of every wallet, keyed by wallet address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub taken_at: DateTime<Utc>,
    pub wallets: BTreeMap<String, WalletBalance>,
}

impl BalanceSnapshot {
    pub fn new(wallets: BTreeMap<String, WalletBalance>) -> Self {
        Self {
            taken_at: Utc::now(),
            wallets,
        }
    }

    pub fn total_sol(&self) -> f64 {
        self.wallets.values().map(|w| w.sol_balance).sum()
    }

    pub fn total_tokens(&self) -> f64 {
        self.wallets.values().map(|w| w.token_balance).sum()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn encoded_key() -> (String, Pubkey) {
        let keypair = Keypair::new();
        (keypair.to_base58_string(), keypair.pubkey())
    }

    #[test]
    fn test_reads_keys_skipping_blank_lines() {
        let (first, first_pk) = encoded_key();
        let (second, second_pk) = encoded_key();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}\n\n   {}  \n", first, second).unwrap();

        let keys = read_private_keys(file.path()).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].pubkey(), first_pk);
        assert_eq!(keys[1].pubkey(), second_pk);
        assert_eq!(keys[0].to_base58(), first);
    }

    #[test]
    fn test_empty_key_file_is_rejected() {
        let err = parse_private_keys("\n  \n", "Wallets.txt").unwrap_err();
        assert!(matches!(err, WalletError::Empty(_)));
    }

    #[test]
    fn test_bad_key_reports_line() {
        let (good, _) = encoded_key();
        let contents = format!("{}\nnot-a-key\n", good);
        match parse_private_keys(&contents, "Wallets.txt") {
            Err(WalletError::InvalidKey { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_secret_key_is_rejected() {
        let (good, _) = encoded_key();
        let short = bs58::encode([7u8; 32]).into_string();
        let contents = format!("{}\n{}\n", good, short);
        match parse_private_keys(&contents, "Wallets.txt") {
            Err(WalletError::InvalidKey { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
        let key = WalletKey::from_base58(&good, 1).unwrap();
        assert_eq!(key.keypair().unwrap().pubkey(), key.pubkey());
    }

    #[test]
    fn test_reads_json_keypair_file() {
        let keypair = Keypair::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        fs::write(&path, serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        let keys = read_private_keys(&path).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].pubkey(), keypair.pubkey());
        assert_eq!(keys[0].keypair().unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_choose_random_is_member() {
        let keys: Vec<WalletKey> = (0..4)
            .map(|i| WalletKey::from_base58(&encoded_key().0, i).unwrap())
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        let chosen = choose_random(&keys, &mut rng).unwrap();
        assert!(keys.iter().any(|k| k.pubkey() == chosen.pubkey()));
        assert!(choose_random(&[], &mut rng).is_none());
    }

    #[test]
    fn test_snapshot_round_trips_through_file() {
        let mut wallets = BTreeMap::new();
        wallets.insert(
            "wallet-a".to_string(),
            WalletBalance { private_key: "secret-a".into(), sol_balance: 1.5, token_balance: 200.0 },
        );
        wallets.insert(
            "wallet-b".to_string(),
            WalletBalance { private_key: "secret-b".into(), sol_balance: 0.5, token_balance: 0.0 },
        );
        let snapshot = BalanceSnapshot::new(wallets);
        assert_eq!(snapshot.total_sol(), 2.0);
        assert_eq!(snapshot.total_tokens(), 200.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.json");
        snapshot.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"tokenBal\""));
        assert!(raw.contains("\"privateKey\""));

        let loaded = BalanceSnapshot::load(&path).unwrap();
        assert_eq!(loaded.wallets, snapshot.wallets);
    }
}
