mod common;

use common::{Farm, ONE_TOKEN, START};
use proptest::prelude::*;
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use staking_mining::{engine::StakeLedger, error::StakingMiningError, math::U256, transfer::Party};

const USERS: usize = 3;
const POOLS: u32 = 2;

/// Floored debts can overpay one base unit per settlement. The vault starts
/// with enough dust to cover every settlement a run can make.
const DUST_RESERVE: u64 = 64;

#[derive(Debug, Clone)]
enum Op {
    Advance(i64),
    Fund(u64),
    Deposit { user: usize, pool: u32, amount: u64 },
    Withdraw { user: usize, pool: u32, percent: u64 },
    Claim { user: usize, pool: u32, via_deposit: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..600).prop_map(Op::Advance),
        (1u64..2_000).prop_map(|tokens| Op::Fund(tokens * ONE_TOKEN)),
        (0..USERS, 0..POOLS, 1u64..1_000_000_000_000)
            .prop_map(|(user, pool, amount)| Op::Deposit { user, pool, amount }),
        (0..USERS, 0..POOLS, 0u64..=100)
            .prop_map(|(user, pool, percent)| Op::Withdraw { user, pool, percent }),
        (0..USERS, 0..POOLS, any::<bool>())
            .prop_map(|(user, pool, via_deposit)| Op::Claim { user, pool, via_deposit }),
    ]
}

struct Run {
    farm: Farm,
    users: Vec<Pubkey>,
    now: UnixTimestamp,
    settlements: u64,
}

impl Run {
    fn new(weights: (u64, u64)) -> Self {
        let mut farm = Farm::standard();
        farm.add_pool(weights.0, START);
        farm.add_pool(weights.1, START);
        let reward_mint = farm.reward_mint;
        farm.ledger.mint(reward_mint, Party::RewardVault, DUST_RESERVE);

        Self {
            farm,
            users: (0..USERS).map(|_| Pubkey::new_unique()).collect(),
            now: START - 100,
            settlements: 0,
        }
    }

    fn apply(&mut self, op: &Op) {
        let now = self.now;
        match *op {
            Op::Advance(seconds) => self.now += seconds,
            Op::Fund(amount) => {
                let closed = now > self.farm.state.end_timestamp();
                let result = self.farm.fund(amount, now);
                if closed {
                    assert_eq!(result, Err(StakingMiningError::EmissionClosed.into()));
                } else {
                    result.unwrap();
                }
            }
            Op::Deposit { user, pool, amount } => {
                let user = self.users[user];
                self.farm.give_stake_tokens(&user, pool, amount);
                self.farm.deposit(&user, pool, amount, now).unwrap();
                self.settlements += 1;
            }
            Op::Withdraw { user, pool, percent } => {
                let user = self.users[user];
                let amount = self.farm.staked(&user, pool) * percent / 100;
                self.farm.withdraw(&user, pool, amount, now).unwrap();
                self.settlements += 1;
            }
            Op::Claim { user, pool, via_deposit } => {
                let user = self.users[user];
                let expected = self.farm.pending(&user, pool, now);
                let staked = self.farm.staked(&user, pool);
                let paid = if via_deposit {
                    self.farm.deposit(&user, pool, 0, now).unwrap().reward_amount()
                } else {
                    self.farm.withdraw(&user, pool, 0, now).unwrap().reward_amount()
                };
                assert_eq!(paid, expected);
                assert_eq!(self.farm.staked(&user, pool), staked);
                self.settlements += 1;
            }
        }
    }

    fn accumulators(&self) -> Vec<(U256, UnixTimestamp)> {
        (0..POOLS)
            .map(|index| {
                let pool = self.farm.state.pool(index).unwrap();
                (pool.acc_reward_per_share, pool.last_synced_timestamp)
            })
            .collect()
    }

    fn paid(&self) -> u64 {
        self.users.iter().map(|user| self.farm.reward_balance(user)).sum()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_rewards_conserved(
        weights in (0u64..500, 1u64..500),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut run = Run::new(weights);

        for op in &ops {
            run.apply(op);

            let paid = run.paid();
            let funded = run.farm.state.total_funded_rewards();

            prop_assert_eq!(run.farm.state.total_paid_out, paid);
            prop_assert!(paid <= funded + run.settlements);
            prop_assert_eq!(run.farm.reward_vault_balance(), funded + DUST_RESERVE - paid);
        }
    }

    #[test]
    fn test_stake_custody_matches_ledger(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut run = Run::new((100, 100));

        for op in &ops {
            run.apply(op);
        }

        for index in 0..POOLS {
            let staked: u64 = run.users.iter().map(|user| run.farm.staked(user, index)).sum();
            let pool = run.farm.state.pool(index).unwrap();

            prop_assert_eq!(pool.total_deposits, staked);
            prop_assert_eq!(run.farm.pool_vault_balance(index), staked);
        }
    }

    #[test]
    fn test_accumulator_monotonic(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut run = Run::new((100, 300));
        let mut previous = run.accumulators();

        for op in &ops {
            run.apply(op);
            let current = run.accumulators();

            for ((acc_before, synced_before), (acc_after, synced_after)) in previous.iter().zip(&current) {
                prop_assert!(acc_after >= acc_before);
                prop_assert!(synced_after >= synced_before);
            }
            previous = current;
        }
    }

    #[test]
    fn test_pending_covered_by_vault(
        ops in prop::collection::vec(op_strategy(), 1..40),
        horizon in 0i64..10_000,
    ) {
        let mut run = Run::new((100, 300));
        for op in &ops {
            run.apply(op);
        }

        let later = run.now + horizon;
        let mut owed: u128 = 0;
        for user in &run.users {
            for index in 0..POOLS {
                owed += run.farm.pending(user, index, later) as u128;
            }
        }

        let drift = (run.settlements + USERS as u64 * POOLS as u64) as u128;
        prop_assert!(owed <= StakeLedger::total_pending(&run.farm.state, later) + drift);
        prop_assert!(owed <= run.farm.reward_vault_balance() as u128);
    }

    #[test]
    fn test_no_accrual_outside_window(
        deposit in 1u64..1_000_000_000_000,
        before_start in 1i64..1_000,
        funded_seconds in 1u64..1_000,
        after_end in 0i64..10_000,
    ) {
        let mut farm = Farm::standard();
        let (index, _) = farm.add_pool(100, START - before_start);
        let user = Pubkey::new_unique();
        farm.stake(&user, index, deposit, START - before_start);

        prop_assert_eq!(farm.pending(&user, index, START), 0);

        farm.fund(funded_seconds * ONE_TOKEN, START).unwrap();
        let end = START + funded_seconds as i64;

        let at_end = farm.pending(&user, index, end);
        prop_assert!(at_end <= funded_seconds * ONE_TOKEN);
        prop_assert_eq!(farm.pending(&user, index, end + after_end), at_end);
    }
}
