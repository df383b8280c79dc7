use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    constants::LAYOUT_VERSION,
    error::StakingMiningError,
    state::{EmissionWindow, Pool, PoolRegistry},
};

/// Farm-wide state: administrator, reward asset, emission window and the pool registry
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobalState {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub version: u8,
    pub administrator: Pubkey,
    pub reward_mint: Pubkey,
    pub emission: EmissionWindow,
    pub total_paid_out: u64,            // Cumulative reward paid to depositors
    pub registry: PoolRegistry,
    pub bump: u8,
    pub reward_vault_bump: u8,
}

impl GlobalState {
    pub const DISCRIMINATOR: [u8; 8] = *b"STKMFARM";

    pub const BASE_LEN: usize = 8 + 1 + 1 + 32 + 32 + EmissionWindow::LEN + 8 + 1 + 1;

    /// Account size with room for a full registry, padded for future fields
    pub const LEN: usize = Self::BASE_LEN + PoolRegistry::MAX_LEN + 64;

    pub fn new(
        administrator: Pubkey,
        reward_mint: Pubkey,
        reward_rate_per_second: u64,
        start_timestamp: UnixTimestamp,
        bump: u8,
        reward_vault_bump: u8,
    ) -> Result<Self, ProgramError> {
        Ok(Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            version: LAYOUT_VERSION,
            administrator,
            reward_mint,
            emission: EmissionWindow::new(reward_rate_per_second, start_timestamp)?,
            total_paid_out: 0,
            registry: PoolRegistry::default(),
            bump,
            reward_vault_bump,
        })
    }

    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let mut cursor = data;
        let state = Self::deserialize(&mut cursor)
            .map_err(|_| ProgramError::InvalidAccountData)?;

        if state.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        if !state.is_initialized {
            return Err(StakingMiningError::NotInitialized.into());
        }

        Ok(state)
    }

    pub fn pack(&self, dst: &mut [u8]) -> ProgramResult {
        let mut cursor = dst;
        self.serialize(&mut cursor)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    pub fn is_administrator(&self, caller: &Pubkey) -> bool {
        self.administrator == *caller
    }

    pub fn require_administrator(&self, caller: &Pubkey) -> ProgramResult {
        if !self.is_administrator(caller) {
            return Err(StakingMiningError::NotAuthorized.into());
        }
        Ok(())
    }

    pub fn pool_count(&self) -> usize {
        self.registry.len()
    }

    pub fn pool(&self, index: u32) -> Result<&Pool, ProgramError> {
        self.registry.get(index)
    }

    pub fn total_alloc_weight(&self) -> u64 {
        self.registry.total_alloc_weight
    }

    pub fn reward_rate_per_second(&self) -> u64 {
        self.emission.reward_rate_per_second
    }

    pub fn start_timestamp(&self) -> UnixTimestamp {
        self.emission.start_timestamp
    }

    pub fn end_timestamp(&self) -> UnixTimestamp {
        self.emission.end_timestamp
    }

    pub fn total_funded_rewards(&self) -> u64 {
        self.emission.total_funded_rewards
    }
}
