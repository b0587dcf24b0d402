//! Direct blockchain access for Solana

pub mod rpc_client;
pub mod solana_client;
pub mod transaction_executor;

pub use rpc_client::{RpcError, SolanaRpcClient};
pub use solana_client::SolanaClient;
pub use transaction_executor::{ConfirmationStatus, ExecutionConfig, SwapExecutor, SwapOutcome};
