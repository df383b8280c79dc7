use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, program_error::ProgramError, pubkey::Pubkey};

use crate::{constants::MAX_POOLS, error::StakingMiningError, math::U256};

/// One staking pool
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub stake_mint: Pubkey,
    pub alloc_weight: u64,
    pub last_synced_timestamp: UnixTimestamp,
    pub acc_reward_per_share: U256,     // Scaled by PRECISION
    pub total_deposits: u64,
}

impl Pool {
    pub const LEN: usize = 32 + 8 + 8 + 32 + 8;

    pub fn new(stake_mint: Pubkey, alloc_weight: u64, last_synced_timestamp: UnixTimestamp) -> Self {
        Self {
            stake_mint,
            alloc_weight,
            last_synced_timestamp,
            acc_reward_per_share: U256::ZERO,
            total_deposits: 0,
        }
    }
}

/// Ordered, append-only list of pools plus the sum of their weights.
/// A pool's index is its position and never changes.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolRegistry {
    pub total_alloc_weight: u64,
    pools: Vec<Pool>,
}

impl PoolRegistry {
    pub const BASE_LEN: usize = 8 + 4;
    pub const MAX_LEN: usize = Self::BASE_LEN + MAX_POOLS * Pool::LEN;

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Index the next registered pool will receive
    pub fn next_index(&self) -> u32 {
        self.pools.len() as u32
    }

    pub fn get(&self, index: u32) -> Result<&Pool, ProgramError> {
        self.pools
            .get(index as usize)
            .ok_or_else(|| StakingMiningError::UnknownPool.into())
    }

    pub fn get_mut(&mut self, index: u32) -> Result<&mut Pool, ProgramError> {
        self.pools
            .get_mut(index as usize)
            .ok_or_else(|| StakingMiningError::UnknownPool.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pool> {
        self.pools.iter_mut()
    }

    /// Append a pool and return its index
    pub fn register(&mut self, pool: Pool) -> Result<u32, ProgramError> {
        if self.pools.len() >= MAX_POOLS {
            return Err(StakingMiningError::PoolLimitReached.into());
        }

        self.total_alloc_weight = self
            .total_alloc_weight
            .checked_add(pool.alloc_weight)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;

        let index = self.next_index();
        self.pools.push(pool);
        Ok(index)
    }

    /// Replace a pool's weight and return the previous one
    pub fn set_weight(&mut self, index: u32, alloc_weight: u64) -> Result<u64, ProgramError> {
        let previous = self.get(index)?.alloc_weight;

        let total = self
            .total_alloc_weight
            .checked_sub(previous)
            .ok_or(StakingMiningError::ArithmeticOverflow)?
            .checked_add(alloc_weight)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;

        self.total_alloc_weight = total;
        self.get_mut(index)?.alloc_weight = alloc_weight;
        Ok(previous)
    }
}
