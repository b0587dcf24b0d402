use anyhow::{Context, Result};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Keypair,
    system_instruction,
    transaction::VersionedTransaction,
};
use tracing::{debug, info, warn};

use crate::exchanges::common::token_utils::{token_account_len, WSOL_MINT};
use crate::exchanges::compute_budget::{create_compute_budget_instructions, max_priority_fee_lamports};
use crate::exchanges::utils::{format_sol, lamports_to_sol};
use crate::shared::errors::ExecutionError;

/// Solana packet limit for a serialized transaction
pub const MAX_TRANSACTION_SIZE: usize = 1232;

pub struct TransactionBuilder {
    pub compute_units: u32,
    /// Micro-lamports per compute unit
    pub compute_unit_price: u64,
}

impl TransactionBuilder {
    pub fn new(compute_units: u32, compute_unit_price: u64) -> Self {
        Self {
            compute_units,
            compute_unit_price,
        }
    }

    fn with_compute_budget(&self) -> Vec<Instruction> {
        let instructions = create_compute_budget_instructions(self.compute_units, self.compute_unit_price);
        debug!(
            "ComputeBudget: {} CU, up to {} priority fee",
            self.compute_units,
            format_sol(lamports_to_sol(max_priority_fee_lamports(self.compute_units, self.compute_unit_price)))
        );
        instructions
    }

    /// SOL -> token. Wraps `amount_in` lamports in a fresh token account, swaps, then closes it.
    pub fn buy_instructions(
        &self,
        owner: &Pubkey,
        wsol_account: &Pubkey,
        rent_lamports: u64,
        amount_in: u64,
        create_output_account: Option<Instruction>,
        swap: Instruction,
    ) -> Result<Vec<Instruction>> {
        let mut instructions = self.with_compute_budget();

        instructions.push(system_instruction::create_account(
            owner,
            wsol_account,
            rent_lamports.saturating_add(amount_in),
            token_account_len() as u64,
            &spl_token::ID,
        ));
        instructions.push(
            spl_token::instruction::initialize_account(&spl_token::ID, wsol_account, &WSOL_MINT, owner)
                .context("building wSOL initialize_account")?,
        );
        if let Some(create) = create_output_account {
            instructions.push(create);
        }
        instructions.push(swap);
        instructions.push(close_account(wsol_account, owner)?);

        info!("🔨 Built BUY with {} instructions ({} in)", instructions.len(), format_sol(lamports_to_sol(amount_in)));
        Ok(instructions)
    }

    /// Token -> SOL. Output lands in the wSOL account, which is closed to unwrap it.
    pub fn sell_instructions(
        &self,
        owner: &Pubkey,
        wsol_account: &Pubkey,
        create_wsol_account: Option<Instruction>,
        swap: Instruction,
    ) -> Result<Vec<Instruction>> {
        let mut instructions = self.with_compute_budget();
        if let Some(create) = create_wsol_account {
            instructions.push(create);
        }
        instructions.push(swap);
        instructions.push(close_account(wsol_account, owner)?);

        info!("🔨 Built SELL with {} instructions", instructions.len());
        Ok(instructions)
    }

    /// Compile a v0 message without lookup tables, sign and size-check it
    pub fn compile(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: Hash,
        signers: &[&Keypair],
    ) -> Result<VersionedTransaction> {
        let message = v0::Message::try_compile(payer, instructions, &[], recent_blockhash)
            .map_err(|e| ExecutionError::Instruction(e.to_string()))?;
        let transaction = VersionedTransaction::try_new(VersionedMessage::V0(message), signers)
            .map_err(|e| ExecutionError::Signing(e.to_string()))?;
        self.validate_transaction(&transaction)?;
        Ok(transaction)
    }

    /// Validate transaction before execution
    pub fn validate_transaction(&self, transaction: &VersionedTransaction) -> Result<usize> {
        let instruction_count = transaction.message.instructions().len();
        if instruction_count == 0 {
            return Err(ExecutionError::Instruction("transaction has no instructions".to_string()).into());
        }
        if instruction_count < 3 {
            warn!("⚠️ Transaction has fewer than 3 instructions (expected: ComputeBudget + swap)");
        }

        let tx_size = bincode::serialize(transaction).context("serializing transaction")?.len();
        if tx_size > MAX_TRANSACTION_SIZE {
            return Err(ExecutionError::TransactionTooLarge(tx_size).into());
        }

        info!("✅ Transaction validation passed: {} instructions, {} bytes", instruction_count, tx_size);
        Ok(tx_size)
    }
}

fn close_account(account: &Pubkey, owner: &Pubkey) -> Result<Instruction> {
    spl_token::instruction::close_account(&spl_token::ID, account, owner, owner, &[]).context("building close_account")
}
