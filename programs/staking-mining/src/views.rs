//! Read-only helpers over raw account data, for clients and tests

use solana_program::{clock::UnixTimestamp, program_error::ProgramError};

use crate::{
    engine::StakeLedger,
    state::{GlobalState, Pool, StakeAccount},
};

/// Snapshot of one pool as stored, without syncing
pub fn pool_info(farm_data: &[u8], pool_index: u32) -> Result<Pool, ProgramError> {
    let state = GlobalState::unpack(farm_data)?;
    state.pool(pool_index).cloned()
}

pub fn pool_count(farm_data: &[u8]) -> Result<usize, ProgramError> {
    Ok(GlobalState::unpack(farm_data)?.pool_count())
}

/// Recorded stake of a position
pub fn stake_of(stake_data: &[u8]) -> Result<u64, ProgramError> {
    Ok(StakeAccount::unpack(stake_data)?.amount)
}

/// Reward a position would receive if settled at `now`
pub fn pending_reward(
    farm_data: &[u8],
    stake_data: &[u8],
    now: UnixTimestamp,
) -> Result<u64, ProgramError> {
    let state = GlobalState::unpack(farm_data)?;
    let stake = StakeAccount::unpack(stake_data)?;
    StakeLedger::pending_reward(&state, &stake, stake.pool_index, now)
}

/// Emitted but unpaid reward across the farm
pub fn total_pending(farm_data: &[u8], now: UnixTimestamp) -> Result<u128, ProgramError> {
    let state = GlobalState::unpack(farm_data)?;
    Ok(StakeLedger::total_pending(&state, now))
}
