use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::{Clock, UnixTimestamp},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};
use spl_token::{instruction as token_instruction, state::Account as TokenAccount};

use crate::{
    constants::{FARM_SEED, POOL_VAULT_SEED, REWARD_VAULT_SEED, STAKE_ACCOUNT_SEED},
    engine::StakeLedger,
    error::StakingMiningError,
    events::Event,
    instruction::StakingMiningInstruction,
    pda::{FarmPDA, PoolVaultPDA, RewardVaultPDA, StakeAccountPDA},
    state::{GlobalState, StakeAccount},
    transfer::SplTokenLedger,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = StakingMiningInstruction::unpack(instruction_data)?;

        match instruction {
            StakingMiningInstruction::Initialize {
                reward_rate_per_second,
                start_timestamp,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, program_id, reward_rate_per_second, start_timestamp)
            }
            StakingMiningInstruction::RegisterPool {
                alloc_weight,
                with_mass_sync,
            } => {
                msg!("Instruction: RegisterPool");
                Self::process_register_pool(accounts, program_id, alloc_weight, with_mass_sync)
            }
            StakingMiningInstruction::SetPoolWeight {
                pool_index,
                alloc_weight,
                with_mass_sync,
            } => {
                msg!("Instruction: SetPoolWeight");
                Self::process_set_pool_weight(
                    accounts,
                    program_id,
                    pool_index,
                    alloc_weight,
                    with_mass_sync,
                )
            }
            StakingMiningInstruction::Fund { amount } => {
                msg!("Instruction: Fund");
                Self::process_fund(accounts, program_id, amount)
            }
            StakingMiningInstruction::Deposit { pool_index, amount } => {
                msg!("Instruction: Deposit");
                Self::process_deposit(accounts, program_id, pool_index, amount)
            }
            StakingMiningInstruction::Withdraw { pool_index, amount } => {
                msg!("Instruction: Withdraw");
                Self::process_withdraw(accounts, program_id, pool_index, amount)
            }
            StakingMiningInstruction::EmergencyWithdraw { pool_index } => {
                msg!("Instruction: EmergencyWithdraw");
                Self::process_emergency_withdraw(accounts, program_id, pool_index)
            }
            StakingMiningInstruction::SetAdministrator { new_administrator } => {
                msg!("Instruction: SetAdministrator");
                Self::process_set_administrator(accounts, program_id, new_administrator)
            }
        }
    }

    fn process_initialize(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        reward_rate_per_second: u64,
        start_timestamp: UnixTimestamp,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let administrator_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;
        let reward_vault_info = next_account_info(account_info_iter)?;
        let reward_mint_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;

        if !administrator_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_token_program(token_program)?;

        let (farm_pubkey, farm_bump) = FarmPDA::derive(program_id, reward_mint_info.key);
        if farm_pubkey != *farm_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }
        if !farm_info.data_is_empty() {
            return Err(StakingMiningError::AlreadyInitialized.into());
        }

        let (vault_pubkey, vault_bump) = RewardVaultPDA::derive(program_id, farm_info.key);
        if vault_pubkey != *reward_vault_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }

        // Validates the rate before any account is created
        let state = GlobalState::new(
            *administrator_info.key,
            *reward_mint_info.key,
            reward_rate_per_second,
            start_timestamp,
            farm_bump,
            vault_bump,
        )?;

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                administrator_info.key,
                farm_info.key,
                rent.minimum_balance(GlobalState::LEN),
                GlobalState::LEN as u64,
                program_id,
            ),
            &[
                administrator_info.clone(),
                farm_info.clone(),
                system_program.clone(),
            ],
            &[&[FARM_SEED, reward_mint_info.key.as_ref(), &[farm_bump]]],
        )?;

        Self::create_vault(
            administrator_info,
            reward_vault_info,
            reward_mint_info,
            farm_info,
            token_program,
            system_program,
            &rent,
            &[REWARD_VAULT_SEED, farm_info.key.as_ref(), &[vault_bump]],
        )?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;

        msg!(
            "Farm initialized: rate {} per second from {}",
            reward_rate_per_second,
            start_timestamp
        );
        Ok(())
    }

    fn process_register_pool(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        alloc_weight: u64,
        with_mass_sync: bool,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let administrator_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;
        let pool_vault_info = next_account_info(account_info_iter)?;
        let stake_mint_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;

        if !administrator_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_token_program(token_program)?;

        let mut state = Self::load_farm(farm_info, program_id)?;
        let pool_index = state.registry.next_index();

        let (vault_pubkey, vault_bump) = PoolVaultPDA::derive(program_id, farm_info.key, pool_index);
        if vault_pubkey != *pool_vault_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }

        let event = StakeLedger::register_pool(
            &mut state,
            administrator_info.key,
            alloc_weight,
            *stake_mint_info.key,
            with_mass_sync,
            Self::now()?,
        )?;

        let rent = Rent::get()?;
        let index_bytes = pool_index.to_le_bytes();
        Self::create_vault(
            administrator_info,
            pool_vault_info,
            stake_mint_info,
            farm_info,
            token_program,
            system_program,
            &rent,
            &[POOL_VAULT_SEED, farm_info.key.as_ref(), &index_bytes, &[vault_bump]],
        )?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn process_set_pool_weight(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        pool_index: u32,
        alloc_weight: u64,
        with_mass_sync: bool,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let administrator_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;

        if !administrator_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut state = Self::load_farm(farm_info, program_id)?;
        let event = StakeLedger::set_pool_weight(
            &mut state,
            administrator_info.key,
            pool_index,
            alloc_weight,
            with_mass_sync,
            Self::now()?,
        )?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn process_fund(accounts: &[AccountInfo], program_id: &Pubkey, amount: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;
        let funder_token_info = next_account_info(account_info_iter)?;
        let reward_vault_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !funder_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_token_program(token_program)?;

        let mut state = Self::load_farm(farm_info, program_id)?;
        Self::check_reward_vault(&state, farm_info, reward_vault_info, program_id)?;

        let mut ledger = SplTokenLedger::new(
            token_program,
            funder_info,
            farm_info,
            state.reward_mint,
            state.bump,
        )
        .with_reward_route(funder_token_info, reward_vault_info);

        let event = StakeLedger::fund(&mut state, funder_info.key, amount, Self::now()?, &mut ledger)?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn process_deposit(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        pool_index: u32,
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;
        let stake_account_info = next_account_info(account_info_iter)?;
        let owner_stake_token_info = next_account_info(account_info_iter)?;
        let pool_vault_info = next_account_info(account_info_iter)?;
        let owner_reward_token_info = next_account_info(account_info_iter)?;
        let reward_vault_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_token_program(token_program)?;

        let mut state = Self::load_farm(farm_info, program_id)?;
        state.pool(pool_index)?;
        Self::check_reward_vault(&state, farm_info, reward_vault_info, program_id)?;
        Self::check_pool_vault(farm_info, pool_vault_info, pool_index, program_id)?;

        let (stake_pubkey, stake_bump) =
            StakeAccountPDA::derive(program_id, farm_info.key, pool_index, owner_info.key);
        if stake_pubkey != *stake_account_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }

        let mut stake = if stake_account_info.data_is_empty() {
            let rent = Rent::get()?;
            invoke_signed(
                &system_instruction::create_account(
                    owner_info.key,
                    stake_account_info.key,
                    rent.minimum_balance(StakeAccount::LEN),
                    StakeAccount::LEN as u64,
                    program_id,
                ),
                &[
                    owner_info.clone(),
                    stake_account_info.clone(),
                    system_program.clone(),
                ],
                &[&[
                    STAKE_ACCOUNT_SEED,
                    farm_info.key.as_ref(),
                    &pool_index.to_le_bytes(),
                    owner_info.key.as_ref(),
                    &[stake_bump],
                ]],
            )?;
            StakeAccount::new(*farm_info.key, pool_index, *owner_info.key, stake_bump)
        } else {
            Self::load_stake_account(stake_account_info, program_id)?
        };

        let mut ledger = SplTokenLedger::new(
            token_program,
            owner_info,
            farm_info,
            state.reward_mint,
            state.bump,
        )
        .with_reward_route(owner_reward_token_info, reward_vault_info)
        .with_stake_route(pool_index, owner_stake_token_info, pool_vault_info);

        let receipt = StakeLedger::deposit(
            &mut state,
            &mut stake,
            owner_info.key,
            pool_index,
            amount,
            Self::now()?,
            &mut ledger,
        )?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        stake.pack(&mut stake_account_info.try_borrow_mut_data()?)?;
        receipt.emit();
        Ok(())
    }

    fn process_withdraw(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        pool_index: u32,
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;
        let stake_account_info = next_account_info(account_info_iter)?;
        let owner_stake_token_info = next_account_info(account_info_iter)?;
        let pool_vault_info = next_account_info(account_info_iter)?;
        let owner_reward_token_info = next_account_info(account_info_iter)?;
        let reward_vault_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_token_program(token_program)?;

        let mut state = Self::load_farm(farm_info, program_id)?;
        state.pool(pool_index)?;
        Self::check_reward_vault(&state, farm_info, reward_vault_info, program_id)?;
        Self::check_pool_vault(farm_info, pool_vault_info, pool_index, program_id)?;

        let mut stake = Self::load_stake_account(stake_account_info, program_id)?;
        if stake.farm != *farm_info.key {
            return Err(StakingMiningError::InvalidStakeAccount.into());
        }

        let mut ledger = SplTokenLedger::new(
            token_program,
            owner_info,
            farm_info,
            state.reward_mint,
            state.bump,
        )
        .with_reward_route(owner_reward_token_info, reward_vault_info)
        .with_stake_route(pool_index, owner_stake_token_info, pool_vault_info);

        let receipt = StakeLedger::withdraw(
            &mut state,
            &mut stake,
            owner_info.key,
            pool_index,
            amount,
            Self::now()?,
            &mut ledger,
        )?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        stake.pack(&mut stake_account_info.try_borrow_mut_data()?)?;
        receipt.emit();
        Ok(())
    }

    fn process_emergency_withdraw(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        pool_index: u32,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;
        let stake_account_info = next_account_info(account_info_iter)?;
        let owner_stake_token_info = next_account_info(account_info_iter)?;
        let pool_vault_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_token_program(token_program)?;

        let mut state = Self::load_farm(farm_info, program_id)?;
        state.pool(pool_index)?;
        Self::check_pool_vault(farm_info, pool_vault_info, pool_index, program_id)?;

        let mut stake = Self::load_stake_account(stake_account_info, program_id)?;
        if stake.farm != *farm_info.key {
            return Err(StakingMiningError::InvalidStakeAccount.into());
        }

        let mut ledger = SplTokenLedger::new(
            token_program,
            owner_info,
            farm_info,
            state.reward_mint,
            state.bump,
        )
        .with_stake_route(pool_index, owner_stake_token_info, pool_vault_info);

        let event = StakeLedger::emergency_withdraw(
            &mut state,
            &mut stake,
            owner_info.key,
            pool_index,
            Self::now()?,
            &mut ledger,
        )?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        stake.pack(&mut stake_account_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn process_set_administrator(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        new_administrator: Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let administrator_info = next_account_info(account_info_iter)?;
        let farm_info = next_account_info(account_info_iter)?;

        if !administrator_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut state = Self::load_farm(farm_info, program_id)?;
        let event =
            StakeLedger::set_administrator(&mut state, administrator_info.key, new_administrator)?;

        state.pack(&mut farm_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn now() -> Result<UnixTimestamp, ProgramError> {
        Ok(Clock::get()?.unix_timestamp)
    }

    fn check_token_program(token_program: &AccountInfo) -> ProgramResult {
        if *token_program.key != spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    /// Load the farm and check it sits at its canonical address
    fn load_farm(farm_info: &AccountInfo, program_id: &Pubkey) -> Result<GlobalState, ProgramError> {
        if farm_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        if !farm_info.is_writable {
            return Err(ProgramError::InvalidAccountData);
        }

        let state = GlobalState::unpack(&farm_info.try_borrow_data()?)?;

        let expected = Pubkey::create_program_address(
            &[FARM_SEED, state.reward_mint.as_ref(), &[state.bump]],
            program_id,
        )
        .map_err(|_| StakingMiningError::InvalidPda)?;
        if expected != *farm_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }

        Ok(state)
    }

    fn load_stake_account(
        stake_account_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<StakeAccount, ProgramError> {
        if stake_account_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        StakeAccount::unpack(&stake_account_info.try_borrow_data()?)
    }

    fn check_reward_vault(
        state: &GlobalState,
        farm_info: &AccountInfo,
        reward_vault_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let expected = Pubkey::create_program_address(
            &[REWARD_VAULT_SEED, farm_info.key.as_ref(), &[state.reward_vault_bump]],
            program_id,
        )
        .map_err(|_| StakingMiningError::InvalidPda)?;
        if expected != *reward_vault_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }
        Ok(())
    }

    fn check_pool_vault(
        farm_info: &AccountInfo,
        pool_vault_info: &AccountInfo,
        pool_index: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let (expected, _) = PoolVaultPDA::derive(program_id, farm_info.key, pool_index);
        if expected != *pool_vault_info.key {
            return Err(StakingMiningError::InvalidPda.into());
        }
        Ok(())
    }

    /// Create a PDA token account for `mint` owned by the farm
    #[allow(clippy::too_many_arguments)]
    fn create_vault<'a>(
        payer: &AccountInfo<'a>,
        vault: &AccountInfo<'a>,
        mint: &AccountInfo<'a>,
        farm: &AccountInfo<'a>,
        token_program: &AccountInfo<'a>,
        system_program: &AccountInfo<'a>,
        rent: &Rent,
        vault_seeds: &[&[u8]],
    ) -> ProgramResult {
        invoke_signed(
            &system_instruction::create_account(
                payer.key,
                vault.key,
                rent.minimum_balance(TokenAccount::LEN),
                TokenAccount::LEN as u64,
                &spl_token::id(),
            ),
            &[payer.clone(), vault.clone(), system_program.clone()],
            &[vault_seeds],
        )?;

        invoke(
            &token_instruction::initialize_account3(
                &spl_token::id(),
                vault.key,
                mint.key,
                farm.key,
            )?,
            &[vault.clone(), mint.clone(), token_program.clone()],
        )
    }
}
