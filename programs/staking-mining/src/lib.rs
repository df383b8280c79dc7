//! Multi-pool staking mining program
//!
//! A farm emits one reward asset at a fixed rate per second across a set of
//! weighted staking pools, for as long as it has been funded.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program_error::PrintProgramError,
    pubkey::Pubkey,
};

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instruction;
pub mod math;
pub mod pda;
pub mod processor;
pub mod state;
pub mod transfer;
pub mod views;

use crate::{error::StakingMiningError, processor::Processor};

solana_program::declare_id!("StakeMining11111111111111111111111111111111");

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process);

pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    msg!("Staking Mining Program entrypoint");
    if let Err(error) = Processor::process(program_id, accounts, instruction_data) {
        error.print::<StakingMiningError>();
        return Err(error);
    }
    Ok(())
}
