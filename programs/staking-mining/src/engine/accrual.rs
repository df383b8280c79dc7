//! Pool accrual
//!
//! Brings a pool's reward-per-share accumulator up to date with the emission
//! that fell inside the funded window since its last sync.

use solana_program::{clock::UnixTimestamp, entrypoint::ProgramResult, msg, program_error::ProgramError};

use crate::{
    math::FixedPointAccumulator,
    state::{EmissionWindow, GlobalState, Pool},
};

pub struct AccrualEngine;

impl AccrualEngine {
    /// Sync one pool of the farm to `now`
    pub fn sync_pool(state: &mut GlobalState, pool_index: u32, now: UnixTimestamp) -> ProgramResult {
        let emission = state.emission;
        let total_alloc_weight = state.registry.total_alloc_weight;
        let pool = state.registry.get_mut(pool_index)?;
        Self::advance(pool, &emission, total_alloc_weight, now)
    }

    /// Sync every pool of the farm to `now`
    pub fn mass_sync(state: &mut GlobalState, now: UnixTimestamp) -> ProgramResult {
        let emission = state.emission;
        let total_alloc_weight = state.registry.total_alloc_weight;

        for pool in state.registry.iter_mut() {
            Self::advance(pool, &emission, total_alloc_weight, now)?;
        }

        msg!("Synced {} pools to {}", state.registry.len(), now);
        Ok(())
    }

    /// Copy of `pool` as it would look after a sync to `now`
    pub fn simulate(
        pool: &Pool,
        emission: &EmissionWindow,
        total_alloc_weight: u64,
        now: UnixTimestamp,
    ) -> Result<Pool, ProgramError> {
        let mut pool = pool.clone();
        Self::advance(&mut pool, emission, total_alloc_weight, now)?;
        Ok(pool)
    }

    /// Core sync step. A timestamp at or before the last sync is a no-op, so
    /// `last_synced_timestamp` never moves backwards.
    pub fn advance(
        pool: &mut Pool,
        emission: &EmissionWindow,
        total_alloc_weight: u64,
        now: UnixTimestamp,
    ) -> ProgramResult {
        if now <= pool.last_synced_timestamp {
            return Ok(());
        }

        let elapsed = emission.eligible_elapsed(pool.last_synced_timestamp, now);

        // Nothing to distribute, or nobody to distribute it to
        if elapsed == 0 || pool.total_deposits == 0 || pool.alloc_weight == 0 {
            pool.last_synced_timestamp = now;
            return Ok(());
        }

        let reward = FixedPointAccumulator::pool_reward(
            elapsed,
            emission.reward_rate_per_second,
            pool.alloc_weight,
            total_alloc_weight,
        )?;
        let increment = FixedPointAccumulator::reward_per_share(reward, pool.total_deposits)?;

        pool.acc_reward_per_share =
            FixedPointAccumulator::advance(&pool.acc_reward_per_share, &increment)?;
        pool.last_synced_timestamp = now;

        Ok(())
    }
}
