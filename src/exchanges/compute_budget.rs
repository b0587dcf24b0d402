use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Create ComputeBudget instruction to set the price per compute unit (micro-lamports)
pub fn create_priority_fee_instruction(micro_lamports_per_cu: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(micro_lamports_per_cu)
}

/// Create ComputeBudget instruction to set compute unit limit
pub fn create_compute_unit_limit_instruction(compute_units: u32) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_limit(compute_units)
}

/// Limit first, then price. Both lead every swap transaction.
pub fn create_compute_budget_instructions(compute_units: u32, micro_lamports_per_cu: u64) -> Vec<Instruction> {
    vec![
        create_compute_unit_limit_instruction(compute_units),
        create_priority_fee_instruction(micro_lamports_per_cu),
    ]
}

/// Worst-case priority fee in lamports for a limit and price
pub fn max_priority_fee_lamports(compute_units: u32, micro_lamports_per_cu: u64) -> u64 {
    let micro = compute_units as u128 * micro_lamports_per_cu as u128;
    micro.div_ceil(1_000_000).min(u64::MAX as u128) as u64
}
