use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::pda::{FarmPDA, PoolVaultPDA, RewardVaultPDA, StakeAccountPDA};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum StakingMiningInstruction {
    /// Create the farm for a reward mint
    /// Accounts:
    /// 0. `[signer, writable]` Administrator (payer)
    /// 1. `[writable]` Farm PDA
    /// 2. `[writable]` Reward vault PDA
    /// 3. `[]` Reward mint
    /// 4. `[]` Token program
    /// 5. `[]` System program
    Initialize {
        reward_rate_per_second: u64,
        start_timestamp: UnixTimestamp,
    },

    /// Register a new pool at the next index
    /// Accounts:
    /// 0. `[signer, writable]` Administrator (payer)
    /// 1. `[writable]` Farm PDA
    /// 2. `[writable]` Pool vault PDA for the next index
    /// 3. `[]` Stake mint
    /// 4. `[]` Token program
    /// 5. `[]` System program
    RegisterPool {
        alloc_weight: u64,
        with_mass_sync: bool,
    },

    /// Change a pool's allocation weight
    /// Accounts:
    /// 0. `[signer]` Administrator
    /// 1. `[writable]` Farm PDA
    SetPoolWeight {
        pool_index: u32,
        alloc_weight: u64,
        with_mass_sync: bool,
    },

    /// Add reward to the farm and extend the emission window
    /// Accounts:
    /// 0. `[signer]` Funder
    /// 1. `[writable]` Farm PDA
    /// 2. `[writable]` Funder reward token account
    /// 3. `[writable]` Reward vault PDA
    /// 4. `[]` Token program
    Fund {
        amount: u64,
    },

    /// Stake into a pool, paying out pending reward
    /// Accounts:
    /// 0. `[signer, writable]` Owner (payer for the stake account)
    /// 1. `[writable]` Farm PDA
    /// 2. `[writable]` Stake account PDA (created on first deposit)
    /// 3. `[writable]` Owner stake token account
    /// 4. `[writable]` Pool vault PDA
    /// 5. `[writable]` Owner reward token account
    /// 6. `[writable]` Reward vault PDA
    /// 7. `[]` Token program
    /// 8. `[]` System program
    Deposit {
        pool_index: u32,
        amount: u64,
    },

    /// Unstake from a pool, paying out pending reward
    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Farm PDA
    /// 2. `[writable]` Stake account PDA
    /// 3. `[writable]` Owner stake token account
    /// 4. `[writable]` Pool vault PDA
    /// 5. `[writable]` Owner reward token account
    /// 6. `[writable]` Reward vault PDA
    /// 7. `[]` Token program
    Withdraw {
        pool_index: u32,
        amount: u64,
    },

    /// Unstake everything and forfeit pending reward
    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Farm PDA
    /// 2. `[writable]` Stake account PDA
    /// 3. `[writable]` Owner stake token account
    /// 4. `[writable]` Pool vault PDA
    /// 5. `[]` Token program
    EmergencyWithdraw {
        pool_index: u32,
    },

    /// Hand the farm over to a new administrator
    /// Accounts:
    /// 0. `[signer]` Administrator
    /// 1. `[writable]` Farm PDA
    SetAdministrator {
        new_administrator: Pubkey,
    },
}

impl StakingMiningInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)
    }
}

// Helper functions to create instructions
pub fn initialize(
    program_id: &Pubkey,
    administrator: &Pubkey,
    reward_mint: &Pubkey,
    reward_rate_per_second: u64,
    start_timestamp: UnixTimestamp,
) -> Result<Instruction, ProgramError> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);
    let (reward_vault, _) = RewardVaultPDA::derive(program_id, &farm);

    let accounts = vec![
        AccountMeta::new(*administrator, true),
        AccountMeta::new(farm, false),
        AccountMeta::new(reward_vault, false),
        AccountMeta::new_readonly(*reward_mint, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    let data = StakingMiningInstruction::Initialize {
        reward_rate_per_second,
        start_timestamp,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// `pool_index` must be the farm's next index
pub fn register_pool(
    program_id: &Pubkey,
    administrator: &Pubkey,
    reward_mint: &Pubkey,
    stake_mint: &Pubkey,
    pool_index: u32,
    alloc_weight: u64,
    with_mass_sync: bool,
) -> Result<Instruction, ProgramError> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);
    let (pool_vault, _) = PoolVaultPDA::derive(program_id, &farm, pool_index);

    let accounts = vec![
        AccountMeta::new(*administrator, true),
        AccountMeta::new(farm, false),
        AccountMeta::new(pool_vault, false),
        AccountMeta::new_readonly(*stake_mint, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    let data = StakingMiningInstruction::RegisterPool {
        alloc_weight,
        with_mass_sync,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn set_pool_weight(
    program_id: &Pubkey,
    administrator: &Pubkey,
    reward_mint: &Pubkey,
    pool_index: u32,
    alloc_weight: u64,
    with_mass_sync: bool,
) -> Result<Instruction, ProgramError> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);

    let accounts = vec![
        AccountMeta::new_readonly(*administrator, true),
        AccountMeta::new(farm, false),
    ];

    let data = StakingMiningInstruction::SetPoolWeight {
        pool_index,
        alloc_weight,
        with_mass_sync,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn fund(
    program_id: &Pubkey,
    funder: &Pubkey,
    funder_token: &Pubkey,
    reward_mint: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);
    let (reward_vault, _) = RewardVaultPDA::derive(program_id, &farm);

    let accounts = vec![
        AccountMeta::new_readonly(*funder, true),
        AccountMeta::new(farm, false),
        AccountMeta::new(*funder_token, false),
        AccountMeta::new(reward_vault, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    let data = StakingMiningInstruction::Fund { amount }.pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Accounts shared by deposit and withdraw, in instruction order
fn stake_accounts(
    program_id: &Pubkey,
    owner: &Pubkey,
    reward_mint: &Pubkey,
    owner_stake_token: &Pubkey,
    owner_reward_token: &Pubkey,
    pool_index: u32,
) -> Vec<AccountMeta> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);
    let (stake_account, _) = StakeAccountPDA::derive(program_id, &farm, pool_index, owner);
    let (pool_vault, _) = PoolVaultPDA::derive(program_id, &farm, pool_index);
    let (reward_vault, _) = RewardVaultPDA::derive(program_id, &farm);

    vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(farm, false),
        AccountMeta::new(stake_account, false),
        AccountMeta::new(*owner_stake_token, false),
        AccountMeta::new(pool_vault, false),
        AccountMeta::new(*owner_reward_token, false),
        AccountMeta::new(reward_vault, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ]
}

pub fn deposit(
    program_id: &Pubkey,
    owner: &Pubkey,
    reward_mint: &Pubkey,
    owner_stake_token: &Pubkey,
    owner_reward_token: &Pubkey,
    pool_index: u32,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let mut accounts = stake_accounts(
        program_id,
        owner,
        reward_mint,
        owner_stake_token,
        owner_reward_token,
        pool_index,
    );
    accounts.push(AccountMeta::new_readonly(system_program::id(), false));

    let data = StakingMiningInstruction::Deposit { pool_index, amount }.pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn withdraw(
    program_id: &Pubkey,
    owner: &Pubkey,
    reward_mint: &Pubkey,
    owner_stake_token: &Pubkey,
    owner_reward_token: &Pubkey,
    pool_index: u32,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let accounts = stake_accounts(
        program_id,
        owner,
        reward_mint,
        owner_stake_token,
        owner_reward_token,
        pool_index,
    );

    let data = StakingMiningInstruction::Withdraw { pool_index, amount }.pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn emergency_withdraw(
    program_id: &Pubkey,
    owner: &Pubkey,
    reward_mint: &Pubkey,
    owner_stake_token: &Pubkey,
    pool_index: u32,
) -> Result<Instruction, ProgramError> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);
    let (stake_account, _) = StakeAccountPDA::derive(program_id, &farm, pool_index, owner);
    let (pool_vault, _) = PoolVaultPDA::derive(program_id, &farm, pool_index);

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(farm, false),
        AccountMeta::new(stake_account, false),
        AccountMeta::new(*owner_stake_token, false),
        AccountMeta::new(pool_vault, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    let data = StakingMiningInstruction::EmergencyWithdraw { pool_index }.pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn set_administrator(
    program_id: &Pubkey,
    administrator: &Pubkey,
    reward_mint: &Pubkey,
    new_administrator: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (farm, _) = FarmPDA::derive(program_id, reward_mint);

    let accounts = vec![
        AccountMeta::new_readonly(*administrator, true),
        AccountMeta::new(farm, false),
    ];

    let data = StakingMiningInstruction::SetAdministrator {
        new_administrator: *new_administrator,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
