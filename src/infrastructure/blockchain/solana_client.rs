//! Wallet-bound view over [`SolanaRpcClient`]

use solana_client::rpc_response::RpcSimulateTransactionResult;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{TransactionError, VersionedTransaction},
};
use spl_associated_token_account::{get_associated_token_address_with_program_id, instruction::create_associated_token_account};
use std::sync::Arc;
use tracing::debug;

use super::rpc_client::{RpcError, SolanaRpcClient};
use crate::exchanges::utils::lamports_to_sol;
use crate::shared::errors::{ExecutionError, WalletError};
use crate::shared::wallets::WalletKey;

pub struct SolanaClient {
    rpc: Arc<SolanaRpcClient>,
    keypair: Keypair,
}

impl SolanaClient {
    pub fn new(rpc: Arc<SolanaRpcClient>, keypair: Keypair) -> Self {
        Self { rpc, keypair }
    }

    pub fn from_key(rpc: Arc<SolanaRpcClient>, key: &WalletKey) -> Result<Self, WalletError> {
        Ok(Self::new(rpc, key.keypair()?))
    }

    pub fn rpc(&self) -> &Arc<SolanaRpcClient> {
        &self.rpc
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn wallet_address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub async fn check_health(&self) -> bool {
        self.rpc.check_health().await
    }

    pub async fn lamports(&self) -> Result<u64, RpcError> {
        self.rpc.get_balance(&self.wallet_address()).await
    }

    /// SOL balance of the wallet
    pub async fn balance(&self) -> Result<f64, RpcError> {
        Ok(lamports_to_sol(self.lamports().await?))
    }

    pub fn associated_token_address(&self, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(&self.wallet_address(), mint, token_program)
    }

    /// UI balance of the wallet's associated token account; `0.0` when it does not exist
    pub async fn check_token_balance(&self, mint: &Pubkey, token_program: &Pubkey) -> f64 {
        let ata = self.associated_token_address(mint, token_program);
        match self.rpc.get_token_amount(&ata).await {
            Ok(amount) => amount.ui_amount.unwrap_or(0.0),
            Err(e) => {
                debug!("No token balance for {} ({}): {}", mint, ata, e);
                0.0
            }
        }
    }

    /// First token account the wallet owns for `mint`, or its ATA plus the
    /// instruction that creates it under `token_program`
    pub async fn get_token_accounts(
        &self,
        mint: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<(Pubkey, Option<Instruction>), RpcError> {
        let owner = self.wallet_address();
        let existing = self.rpc.get_token_accounts_by_owner(&owner, mint).await?;
        Ok(match existing.first() {
            Some(account) => (*account, None),
            None => (
                self.associated_token_address(mint, token_program),
                Some(create_associated_token_account(&owner, &owner, mint, token_program)),
            ),
        })
    }

    pub async fn get_token_account(&self, mint: &Pubkey) -> Result<Pubkey, RpcError> {
        let existing = self.rpc.get_token_accounts_by_owner(&self.wallet_address(), mint).await?;
        existing
            .first()
            .copied()
            .ok_or(ExecutionError::MissingTokenAccount(*mint).into())
    }

    pub async fn min_balance_for_token_account(&self) -> Result<u64, RpcError> {
        self.rpc.min_balance_for_token_account().await
    }

    pub async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.rpc.get_latest_blockhash().await
    }

    pub async fn send_transaction(&self, transaction: &VersionedTransaction, skip_preflight: bool) -> Result<Signature, RpcError> {
        self.rpc.send_transaction(transaction, skip_preflight).await
    }

    pub async fn simulate_transaction(&self, transaction: &VersionedTransaction) -> Result<RpcSimulateTransactionResult, RpcError> {
        self.rpc.simulate_transaction(transaction).await
    }

    pub async fn transaction_status(&self, signature: &Signature) -> Result<Option<TransactionError>, RpcError> {
        self.rpc.transaction_error(signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::common::TOKEN_2022_PROGRAM;
    use serde_json::json;
    use solana_client::rpc_request::RpcRequest;
    use std::collections::HashMap;

    fn mock_client(url: &str, mocks: HashMap<RpcRequest, serde_json::Value>) -> SolanaClient {
        SolanaClient::new(Arc::new(SolanaRpcClient::new_mock(url, mocks)), Keypair::new())
    }

    #[test]
    fn test_wallet_address_from_key() {
        let keypair = Keypair::new();
        let key = WalletKey::from_base58(&keypair.to_base58_string(), 1).unwrap();
        let rpc = Arc::new(SolanaRpcClient::new("http://127.0.0.1:8899".to_string()));
        let client = SolanaClient::from_key(rpc, &key).unwrap();
        assert_eq!(client.wallet_address(), keypair.pubkey());
        assert_eq!(client.rpc().url(), "http://127.0.0.1:8899");
    }

    #[tokio::test]
    async fn test_missing_token_account_reads_as_zero() {
        let client = mock_client("fails", HashMap::new());
        assert_eq!(client.check_token_balance(&Pubkey::new_unique(), &spl_token::ID).await, 0.0);
    }

    #[tokio::test]
    async fn test_token_balance_in_ui_units() {
        let balance = json!({
            "context": { "slot": 1 },
            "value": { "amount": "1500000", "decimals": 6, "uiAmount": 1.5, "uiAmountString": "1.5" }
        });
        let client = mock_client("succeeds", HashMap::from([(RpcRequest::GetTokenAccountBalance, balance)]));
        assert_eq!(client.check_token_balance(&Pubkey::new_unique(), &spl_token::ID).await, 1.5);
    }

    #[tokio::test]
    async fn test_get_token_accounts_creates_ata_under_mint_program() {
        let empty = json!({ "context": { "slot": 1 }, "value": [] });
        let client = mock_client("succeeds", HashMap::from([(RpcRequest::GetTokenAccountsByOwner, empty)]));
        let mint = Pubkey::new_unique();

        let (account, create) = client.get_token_accounts(&mint, &TOKEN_2022_PROGRAM).await.unwrap();
        let expected = get_associated_token_address_with_program_id(&client.wallet_address(), &mint, &TOKEN_2022_PROGRAM);
        assert_eq!(account, expected);
        assert_ne!(account, client.associated_token_address(&mint, &spl_token::ID));

        let create = create.expect("missing account needs a create instruction");
        assert_eq!(create.program_id, spl_associated_token_account::ID);
        assert_eq!(create.accounts[1].pubkey, expected);
        assert_eq!(create.accounts[3].pubkey, mint);
        assert_eq!(create.accounts[5].pubkey, TOKEN_2022_PROGRAM);
    }

    #[tokio::test]
    async fn test_get_token_account_requires_existing() {
        let empty = json!({ "context": { "slot": 1 }, "value": [] });
        let client = mock_client("succeeds", HashMap::from([(RpcRequest::GetTokenAccountsByOwner, empty)]));
        let err = client.get_token_account(&Pubkey::new_unique()).await.unwrap_err();
        assert!(matches!(err, RpcError::Execution(ExecutionError::MissingTokenAccount(_))));
    }
}
