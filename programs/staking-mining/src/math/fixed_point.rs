use solana_program::program_error::ProgramError;

use crate::{constants::PRECISION, error::StakingMiningError, math::U256};

/// Scaling contract shared by the accrual engine and the stake ledger.
///
/// Reward per share is kept as `reward * PRECISION / deposits` in a 256-bit
/// accumulator. Every division floors, the recorded debt included. Drift is a
/// few base units per settlement and is never corrected.
pub struct FixedPointAccumulator;

impl FixedPointAccumulator {
    pub const PRECISION: u128 = PRECISION;

    /// Reward emitted to one pool over `elapsed` seconds:
    /// `elapsed * rate * alloc_weight / total_alloc_weight`, floored once.
    pub fn pool_reward(
        elapsed: u64,
        rate_per_second: u64,
        alloc_weight: u64,
        total_alloc_weight: u64,
    ) -> Result<u128, ProgramError> {
        if total_alloc_weight == 0 {
            return Err(StakingMiningError::DivideByZero.into());
        }

        // u64 * u64 always fits in u128
        let emitted = elapsed as u128 * rate_per_second as u128;

        U256::from_u128(emitted)
            .checked_mul_u128(alloc_weight as u128)
            .ok_or(StakingMiningError::ArithmeticOverflow)?
            .checked_div_u128(total_alloc_weight as u128)
            .ok_or(StakingMiningError::DivideByZero)?
            .to_u128()
            .ok_or_else(|| StakingMiningError::ArithmeticOverflow.into())
    }

    /// Accumulator increment for a pool reward: `pool_reward * PRECISION / total_deposits`
    pub fn reward_per_share(pool_reward: u128, total_deposits: u64) -> Result<U256, ProgramError> {
        if total_deposits == 0 {
            return Err(StakingMiningError::DivideByZero.into());
        }

        U256::widening_mul(pool_reward, PRECISION)
            .checked_div_u128(total_deposits as u128)
            .ok_or_else(|| StakingMiningError::DivideByZero.into())
    }

    pub fn advance(acc: &U256, increment: &U256) -> Result<U256, ProgramError> {
        acc.checked_add(increment)
            .ok_or_else(|| StakingMiningError::ArithmeticOverflow.into())
    }

    /// Reward priced into `amount` at accumulator `acc`: `amount * acc / PRECISION`
    pub fn accrued(amount: u64, acc: &U256) -> Result<u128, ProgramError> {
        acc.checked_mul_u128(amount as u128)
            .ok_or(StakingMiningError::ArithmeticOverflow)?
            .checked_div_u128(PRECISION)
            .ok_or(StakingMiningError::DivideByZero)?
            .to_u128()
            .ok_or_else(|| StakingMiningError::ArithmeticOverflow.into())
    }

    /// Debt recorded at a settlement: `amount * acc / PRECISION`, floored
    pub fn reward_debt(amount: u64, acc: &U256) -> Result<u128, ProgramError> {
        Self::accrued(amount, acc)
    }

    /// Reward owed since the last settlement, floored at zero
    pub fn pending(amount: u64, acc: &U256, reward_debt: u128) -> Result<u128, ProgramError> {
        Ok(Self::accrued(amount, acc)?.saturating_sub(reward_debt))
    }

    pub fn to_token_amount(value: u128) -> Result<u64, ProgramError> {
        u64::try_from(value).map_err(|_| StakingMiningError::ArithmeticOverflow.into())
    }
}
