//! Solana RPC client for direct blockchain reading and submission

use solana_account_decoder::parse_token::UiTokenAmount;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_client::rpc_response::RpcSimulateTransactionResult;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{TransactionError, VersionedTransaction};
use solana_transaction_status::UiTransactionEncoding;
use tracing::{debug, warn};

use crate::exchanges::common::token_utils::{is_token_program, token_account_len};
use crate::shared::errors::ExecutionError;

/// Errors surfaced by the RPC layer
#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("RPC {op} failed: {source}")]
    Client {
        op: &'static str,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Transaction {0} has no status metadata yet")]
    MissingMeta(Signature),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

fn client_err(op: &'static str) -> impl FnOnce(ClientError) -> RpcError {
    move |e| RpcError::Client { op, source: Box::new(e) }
}

/// Solana RPC client wrapper
pub struct SolanaRpcClient {
    client: RpcClient,
}

impl SolanaRpcClient {
    /// Create new RPC client with `confirmed` commitment
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
        }
    }

    /// Client answering from canned responses. `url` is `"succeeds"` or `"fails"`.
    #[cfg(test)]
    pub(crate) fn new_mock(
        url: &str,
        mocks: std::collections::HashMap<solana_client::rpc_request::RpcRequest, serde_json::Value>,
    ) -> Self {
        Self {
            client: RpcClient::new_mock_with_mocks(url.to_string(), mocks),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// True when the node answers `getHealth`
    pub async fn check_health(&self) -> bool {
        match self.client.get_health().await {
            Ok(()) => true,
            Err(e) => {
                warn!("RPC health check failed: {}", e);
                false
            }
        }
    }

    pub async fn get_balance(&self, owner: &Pubkey) -> Result<u64, RpcError> {
        self.client.get_balance(owner).await.map_err(client_err("getBalance"))
    }

    /// Get account data and owner program by address
    pub async fn get_account(&self, address: &Pubkey) -> Result<Account, RpcError> {
        self.client.get_account(address).await.map_err(client_err("getAccountInfo"))
    }

    pub async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, RpcError> {
        Ok(self.get_account(address).await?.data)
    }

    /// Get multiple accounts; every requested account must exist
    pub async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Account>, RpcError> {
        let accounts = self
            .client
            .get_multiple_accounts(addresses)
            .await
            .map_err(client_err("getMultipleAccounts"))?;

        addresses
            .iter()
            .zip(accounts)
            .map(|(address, account)| account.ok_or(ExecutionError::AccountNotFound(*address).into()))
            .collect()
    }

    /// Token program owning `mint` (legacy SPL or Token-2022)
    pub async fn get_mint_program(&self, mint: &Pubkey) -> Result<Pubkey, RpcError> {
        let owner = self.get_account(mint).await?.owner;
        if !is_token_program(&owner) {
            return Err(ExecutionError::NotAMint(*mint, owner).into());
        }
        Ok(owner)
    }

    pub async fn get_token_amount(&self, token_account: &Pubkey) -> Result<UiTokenAmount, RpcError> {
        self.client
            .get_token_account_balance(token_account)
            .await
            .map_err(client_err("getTokenAccountBalance"))
    }

    /// Token accounts owned by `owner` for `mint`
    pub async fn get_token_accounts_by_owner(&self, owner: &Pubkey, mint: &Pubkey) -> Result<Vec<Pubkey>, RpcError> {
        use solana_client::rpc_request::TokenAccountsFilter;

        let accounts = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
            .await
            .map_err(client_err("getTokenAccountsByOwner"))?;

        Ok(accounts
            .into_iter()
            .filter_map(|keyed| keyed.pubkey.parse::<Pubkey>().ok())
            .collect())
    }

    /// Rent-exempt minimum for an SPL token account
    pub async fn min_balance_for_token_account(&self) -> Result<u64, RpcError> {
        self.client
            .get_minimum_balance_for_rent_exemption(token_account_len())
            .await
            .map_err(client_err("getMinimumBalanceForRentExemption"))
    }

    pub async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.client.get_latest_blockhash().await.map_err(client_err("getLatestBlockhash"))
    }

    pub async fn send_transaction(&self, transaction: &VersionedTransaction, skip_preflight: bool) -> Result<Signature, RpcError> {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            ..Default::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(client_err("sendTransaction"))
    }

    pub async fn simulate_transaction(&self, transaction: &VersionedTransaction) -> Result<RpcSimulateTransactionResult, RpcError> {
        Ok(self
            .client
            .simulate_transaction(transaction)
            .await
            .map_err(client_err("simulateTransaction"))?
            .value)
    }

    /// Look up a landed transaction.
    ///
    /// `Ok(None)` means it executed successfully, `Ok(Some(err))` that it landed
    /// and failed. Any `Err` means it is not visible yet.
    pub async fn transaction_error(&self, signature: &Signature) -> Result<Option<TransactionError>, RpcError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let tx = self
            .client
            .get_transaction_with_config(signature, config)
            .await
            .map_err(client_err("getTransaction"))?;

        let meta = tx.transaction.meta.ok_or(RpcError::MissingMeta(*signature))?;
        debug!("Transaction {} fee={} lamports", signature, meta.fee);
        Ok(meta.err)
    }
}
