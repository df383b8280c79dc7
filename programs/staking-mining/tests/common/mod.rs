//! In-memory farm harness shared by the ledger and property tests
#![allow(dead_code)]

use std::collections::HashMap;

use solana_program::{
    clock::UnixTimestamp, entrypoint::ProgramResult, program_error::ProgramError, pubkey::Pubkey,
};
use staking_mining::{
    engine::StakeLedger,
    error::StakingMiningError,
    events::{Deposited, EmergencyWithdrawn, Funded, PoolRegistered, StakeReceipt, Withdrawn},
    state::{GlobalState, StakeAccount},
    transfer::{AssetLedger, Party, Transfer},
};

pub const ONE_TOKEN: u64 = 1_000_000_000;
pub const START: UnixTimestamp = 1_700_000_000;

/// Balances per (asset, party). Overdrafts fail with `TransferFailed`.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    balances: HashMap<(Pubkey, Party), u64>,
    rejected: Option<Party>,
}

impl MemoryLedger {
    pub fn mint(&mut self, asset: Pubkey, party: Party, amount: u64) {
        *self.balances.entry((asset, party)).or_default() += amount;
    }

    pub fn balance(&self, asset: &Pubkey, party: Party) -> u64 {
        self.balances.get(&(*asset, party)).copied().unwrap_or(0)
    }

    /// Make every transfer into `party` fail
    pub fn reject_transfers_to(&mut self, party: Party) {
        self.rejected = Some(party);
    }

    pub fn accept_all(&mut self) {
        self.rejected = None;
    }

    fn apply(&mut self, transfer: &Transfer) -> ProgramResult {
        let source = self.balance(&transfer.asset, transfer.from);
        let remaining = source
            .checked_sub(transfer.amount)
            .ok_or(StakingMiningError::TransferFailed)?;

        self.balances.insert((transfer.asset, transfer.from), remaining);
        self.mint(transfer.asset, transfer.to, transfer.amount);
        Ok(())
    }
}

impl AssetLedger for MemoryLedger {
    fn transfer(&mut self, transfer: &Transfer) -> ProgramResult {
        if self.rejected == Some(transfer.to) {
            return Err(StakingMiningError::TransferFailed.into());
        }
        self.apply(transfer)
    }

    fn revert(&mut self, transfer: &Transfer) -> ProgramResult {
        self.apply(&transfer.reversed())
    }
}

/// A farm with its custody, driven directly through the ledger operations
pub struct Farm {
    pub state: GlobalState,
    pub ledger: MemoryLedger,
    pub admin: Pubkey,
    pub reward_mint: Pubkey,
    pub stakes: HashMap<(u32, Pubkey), StakeAccount>,
}

impl Farm {
    pub fn new(reward_rate_per_second: u64, start_timestamp: UnixTimestamp) -> Self {
        let admin = Pubkey::new_unique();
        let reward_mint = Pubkey::new_unique();
        let state =
            GlobalState::new(admin, reward_mint, reward_rate_per_second, start_timestamp, 255, 255)
                .unwrap();

        Self {
            state,
            ledger: MemoryLedger::default(),
            admin,
            reward_mint,
            stakes: HashMap::new(),
        }
    }

    /// 1 token per second from `START`
    pub fn standard() -> Self {
        Self::new(ONE_TOKEN, START)
    }

    /// Register a pool with a fresh stake mint
    pub fn add_pool(&mut self, alloc_weight: u64, now: UnixTimestamp) -> (u32, Pubkey) {
        let stake_mint = Pubkey::new_unique();
        let event = self.register(alloc_weight, stake_mint, false, now).unwrap();
        (event.index, stake_mint)
    }

    pub fn register(
        &mut self,
        alloc_weight: u64,
        stake_mint: Pubkey,
        with_mass_sync: bool,
        now: UnixTimestamp,
    ) -> Result<PoolRegistered, ProgramError> {
        let admin = self.admin;
        StakeLedger::register_pool(&mut self.state, &admin, alloc_weight, stake_mint, with_mass_sync, now)
    }

    /// Mint `amount` of reward to the administrator and fund with it
    pub fn fund(&mut self, amount: u64, now: UnixTimestamp) -> Result<Funded, ProgramError> {
        let admin = self.admin;
        self.ledger.mint(self.reward_mint, Party::Account(admin), amount);
        StakeLedger::fund(&mut self.state, &admin, amount, now, &mut self.ledger)
    }

    /// Give `user` stake tokens of pool `index`
    pub fn give_stake_tokens(&mut self, user: &Pubkey, index: u32, amount: u64) {
        let stake_mint = self.state.pool(index).unwrap().stake_mint;
        self.ledger.mint(stake_mint, Party::Account(*user), amount);
    }

    pub fn deposit(
        &mut self,
        user: &Pubkey,
        index: u32,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<StakeReceipt<Deposited>, ProgramError> {
        let stake = self
            .stakes
            .entry((index, *user))
            .or_insert_with(|| StakeAccount::new(Pubkey::default(), index, *user, 255));
        StakeLedger::deposit(&mut self.state, stake, user, index, amount, now, &mut self.ledger)
    }

    /// Give the user the tokens, then deposit them
    pub fn stake(&mut self, user: &Pubkey, index: u32, amount: u64, now: UnixTimestamp) {
        self.give_stake_tokens(user, index, amount);
        self.deposit(user, index, amount, now).unwrap();
    }

    pub fn withdraw(
        &mut self,
        user: &Pubkey,
        index: u32,
        amount: u64,
        now: UnixTimestamp,
    ) -> Result<StakeReceipt<Withdrawn>, ProgramError> {
        let stake = self
            .stakes
            .entry((index, *user))
            .or_insert_with(|| StakeAccount::new(Pubkey::default(), index, *user, 255));
        StakeLedger::withdraw(&mut self.state, stake, user, index, amount, now, &mut self.ledger)
    }

    pub fn emergency_withdraw(
        &mut self,
        user: &Pubkey,
        index: u32,
        now: UnixTimestamp,
    ) -> Result<EmergencyWithdrawn, ProgramError> {
        let stake = self
            .stakes
            .entry((index, *user))
            .or_insert_with(|| StakeAccount::new(Pubkey::default(), index, *user, 255));
        StakeLedger::emergency_withdraw(&mut self.state, stake, user, index, now, &mut self.ledger)
    }

    pub fn pending(&self, user: &Pubkey, index: u32, now: UnixTimestamp) -> u64 {
        match self.stakes.get(&(index, *user)) {
            Some(stake) => StakeLedger::pending_reward(&self.state, stake, index, now).unwrap(),
            None => 0,
        }
    }

    pub fn staked(&self, user: &Pubkey, index: u32) -> u64 {
        self.stakes.get(&(index, *user)).map_or(0, |stake| stake.amount)
    }

    pub fn reward_balance(&self, user: &Pubkey) -> u64 {
        self.ledger.balance(&self.reward_mint, Party::Account(*user))
    }

    pub fn reward_vault_balance(&self) -> u64 {
        self.ledger.balance(&self.reward_mint, Party::RewardVault)
    }

    pub fn pool_vault_balance(&self, index: u32) -> u64 {
        let stake_mint = self.state.pool(index).unwrap().stake_mint;
        self.ledger.balance(&stake_mint, Party::PoolVault(index))
    }
}

/// `actual` is at most `tolerance` base units below `expected`, never above
pub fn assert_floored(actual: u64, expected: u64, tolerance: u64) {
    assert!(actual <= expected, "{} exceeds {}", actual, expected);
    assert!(
        expected - actual <= tolerance,
        "{} more than {} below {}",
        actual,
        tolerance,
        expected
    );
}
