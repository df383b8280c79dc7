//! Stake ledger operations
//!
//! Every operation stages its state changes on copies, settles the resulting
//! transfers through [`settle`], and only writes the staged state back once
//! all transfers went through. A rejected operation leaves state untouched.

use solana_program::{
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    engine::AccrualEngine,
    error::StakingMiningError,
    events::{
        AdministratorChanged, Deposited, EmergencyWithdrawn, Funded, PoolRegistered,
        PoolWeightUpdated, RewardPaid, StakeReceipt, Withdrawn,
    },
    state::{GlobalState, Pool, StakeAccount},
    transfer::{settle, AssetLedger, Party, Transfer},
};

pub struct StakeLedger;

impl StakeLedger {
    /// Append a pool. It starts accruing at `max(now, start_timestamp)`.
    pub fn register_pool(
        state: &mut GlobalState,
        caller: &Pubkey,
        alloc_weight: u64,
        stake_mint: Pubkey,
        with_mass_sync: bool,
        now: UnixTimestamp,
    ) -> Result<PoolRegistered, ProgramError> {
        state.require_administrator(caller)?;

        let mut staged = state.clone();
        if with_mass_sync {
            AccrualEngine::mass_sync(&mut staged, now)?;
        }

        let last_synced = now.max(staged.emission.start_timestamp);
        let index = staged
            .registry
            .register(Pool::new(stake_mint, alloc_weight, last_synced))?;

        *state = staged;
        msg!("Registered pool {} with weight {}", index, alloc_weight);

        Ok(PoolRegistered {
            index,
            alloc_weight,
            stake_mint,
        })
    }

    /// Change a pool's weight after syncing it (or every pool) at the old weights
    pub fn set_pool_weight(
        state: &mut GlobalState,
        caller: &Pubkey,
        pool_index: u32,
        alloc_weight: u64,
        with_mass_sync: bool,
        now: UnixTimestamp,
    ) -> Result<PoolWeightUpdated, ProgramError> {
        state.require_administrator(caller)?;

        let mut staged = state.clone();
        if with_mass_sync {
            AccrualEngine::mass_sync(&mut staged, now)?;
        } else {
            AccrualEngine::sync_pool(&mut staged, pool_index, now)?;
        }

        let previous_alloc_weight = staged.registry.set_weight(pool_index, alloc_weight)?;

        *state = staged;
        msg!(
            "Pool {} weight {} -> {}",
            pool_index,
            previous_alloc_weight,
            alloc_weight
        );

        Ok(PoolWeightUpdated {
            index: pool_index,
            previous_alloc_weight,
            alloc_weight,
        })
    }

    /// Move `amount` of the reward asset from `funder` into custody and extend
    /// the emission window. Refused once the window has closed.
    pub fn fund<L: AssetLedger + ?Sized>(
        state: &mut GlobalState,
        funder: &Pubkey,
        amount: u64,
        now: UnixTimestamp,
        ledger: &mut L,
    ) -> Result<Funded, ProgramError> {
        if state.emission.is_closed(now) {
            msg!("Emission ended at {}, now {}", state.emission.end_timestamp, now);
            return Err(StakingMiningError::EmissionClosed.into());
        }

        let mut emission = state.emission;
        let new_end_timestamp = emission.record_funding(amount)?;

        settle(
            ledger,
            &[Transfer {
                asset: state.reward_mint,
                from: Party::Account(*funder),
                to: Party::RewardVault,
                amount,
            }],
        )?;

        state.emission = emission;
        msg!("Funded {}, emission ends at {}", amount, new_end_timestamp);

        Ok(Funded {
            amount,
            new_end_timestamp,
        })
    }

    /// Settle pending reward, then add `amount` to the position
    pub fn deposit<L: AssetLedger + ?Sized>(
        state: &mut GlobalState,
        stake: &mut StakeAccount,
        owner: &Pubkey,
        pool_index: u32,
        amount: u64,
        now: UnixTimestamp,
        ledger: &mut L,
    ) -> Result<StakeReceipt<Deposited>, ProgramError> {
        state.pool(pool_index)?;
        stake.require_key(pool_index, owner)?;

        let mut staged = state.clone();
        let mut position = stake.clone();
        AccrualEngine::sync_pool(&mut staged, pool_index, now)?;

        let pool = staged.registry.get_mut(pool_index)?;
        let pending = position.pending(&pool.acc_reward_per_share)?;

        position.amount = position
            .amount
            .checked_add(amount)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;
        pool.total_deposits = pool
            .total_deposits
            .checked_add(amount)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;
        position.checkpoint(&pool.acc_reward_per_share)?;
        let stake_mint = pool.stake_mint;

        Self::record_payout(&mut staged, pending)?;

        settle(
            ledger,
            &[
                Self::payout(&staged, owner, pending),
                Transfer {
                    asset: stake_mint,
                    from: Party::Account(*owner),
                    to: Party::PoolVault(pool_index),
                    amount,
                },
            ],
        )?;

        *state = staged;
        *stake = position;
        msg!("Deposited {} into pool {}, paid {}", amount, pool_index, pending);

        Ok(StakeReceipt {
            reward: Self::reward_event(owner, pool_index, pending),
            event: Deposited {
                owner: *owner,
                index: pool_index,
                amount,
            },
        })
    }

    /// Settle pending reward, then return `amount` of the stake asset
    pub fn withdraw<L: AssetLedger + ?Sized>(
        state: &mut GlobalState,
        stake: &mut StakeAccount,
        owner: &Pubkey,
        pool_index: u32,
        amount: u64,
        now: UnixTimestamp,
        ledger: &mut L,
    ) -> Result<StakeReceipt<Withdrawn>, ProgramError> {
        state.pool(pool_index)?;
        stake.require_key(pool_index, owner)?;

        if amount > stake.amount {
            msg!("Withdraw {} exceeds stake {}", amount, stake.amount);
            return Err(StakingMiningError::InsufficientStake.into());
        }

        let mut staged = state.clone();
        let mut position = stake.clone();
        AccrualEngine::sync_pool(&mut staged, pool_index, now)?;

        let pool = staged.registry.get_mut(pool_index)?;
        let pending = position.pending(&pool.acc_reward_per_share)?;

        position.amount -= amount;
        pool.total_deposits = pool
            .total_deposits
            .checked_sub(amount)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;
        position.checkpoint(&pool.acc_reward_per_share)?;
        let stake_mint = pool.stake_mint;

        Self::record_payout(&mut staged, pending)?;

        settle(
            ledger,
            &[
                Self::payout(&staged, owner, pending),
                Transfer {
                    asset: stake_mint,
                    from: Party::PoolVault(pool_index),
                    to: Party::Account(*owner),
                    amount,
                },
            ],
        )?;

        *state = staged;
        *stake = position;
        msg!("Withdrew {} from pool {}, paid {}", amount, pool_index, pending);

        Ok(StakeReceipt {
            reward: Self::reward_event(owner, pool_index, pending),
            event: Withdrawn {
                owner: *owner,
                index: pool_index,
                amount,
            },
        })
    }

    /// Return the whole stake and forfeit any pending reward
    pub fn emergency_withdraw<L: AssetLedger + ?Sized>(
        state: &mut GlobalState,
        stake: &mut StakeAccount,
        owner: &Pubkey,
        pool_index: u32,
        now: UnixTimestamp,
        ledger: &mut L,
    ) -> Result<EmergencyWithdrawn, ProgramError> {
        state.pool(pool_index)?;
        stake.require_key(pool_index, owner)?;

        let mut staged = state.clone();
        let mut position = stake.clone();

        // Remaining depositors must be priced with this stake still counted
        AccrualEngine::sync_pool(&mut staged, pool_index, now)?;

        let amount = position.amount;
        let pool = staged.registry.get_mut(pool_index)?;
        pool.total_deposits = pool
            .total_deposits
            .checked_sub(amount)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;
        let stake_mint = pool.stake_mint;

        position.amount = 0;
        position.reward_debt = 0;

        settle(
            ledger,
            &[Transfer {
                asset: stake_mint,
                from: Party::PoolVault(pool_index),
                to: Party::Account(*owner),
                amount,
            }],
        )?;

        *state = staged;
        *stake = position;
        msg!("Emergency withdrew {} from pool {}", amount, pool_index);

        Ok(EmergencyWithdrawn {
            owner: *owner,
            index: pool_index,
            amount,
        })
    }

    pub fn set_administrator(
        state: &mut GlobalState,
        caller: &Pubkey,
        new_administrator: Pubkey,
    ) -> Result<AdministratorChanged, ProgramError> {
        state.require_administrator(caller)?;

        let previous = state.administrator;
        state.administrator = new_administrator;
        msg!("Administrator changed to {}", new_administrator);

        Ok(AdministratorChanged {
            previous,
            current: new_administrator,
        })
    }

    /// Reward `stake` would receive if settled at `now`. Never mutates state.
    pub fn pending_reward(
        state: &GlobalState,
        stake: &StakeAccount,
        pool_index: u32,
        now: UnixTimestamp,
    ) -> Result<u64, ProgramError> {
        let pool = state.pool(pool_index)?;
        if stake.pool_index != pool_index {
            return Err(StakingMiningError::InvalidStakeAccount.into());
        }

        let pool = AccrualEngine::simulate(pool, &state.emission, state.total_alloc_weight(), now)?;
        stake.pending(&pool.acc_reward_per_share)
    }

    /// Reward emitted up to `now` that has not been paid out yet
    pub fn total_pending(state: &GlobalState, now: UnixTimestamp) -> u128 {
        state
            .emission
            .emitted_until(now)
            .saturating_sub(state.total_paid_out as u128)
    }

    fn record_payout(state: &mut GlobalState, pending: u64) -> Result<(), ProgramError> {
        state.total_paid_out = state
            .total_paid_out
            .checked_add(pending)
            .ok_or(StakingMiningError::ArithmeticOverflow)?;
        Ok(())
    }

    fn payout(state: &GlobalState, owner: &Pubkey, amount: u64) -> Transfer {
        Transfer {
            asset: state.reward_mint,
            from: Party::RewardVault,
            to: Party::Account(*owner),
            amount,
        }
    }

    fn reward_event(owner: &Pubkey, pool_index: u32, amount: u64) -> Option<RewardPaid> {
        (amount > 0).then(|| RewardPaid {
            owner: *owner,
            index: pool_index,
            amount,
        })
    }
}
