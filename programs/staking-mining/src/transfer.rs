//! Asset movements between depositors and farm custody
//!
//! Operations describe the transfers they need as [`Transfer`] legs and hand
//! them to an [`AssetLedger`] through [`settle`]. If any leg fails, the legs
//! already completed are reverted in reverse order before the error is
//! returned, so a failed operation never leaves partial movements behind.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
};
use spl_token::instruction as token_instruction;

use crate::{constants::FARM_SEED, error::StakingMiningError};

/// Holder of an asset balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    /// Farm custody of the reward asset
    RewardVault,
    /// Farm custody of one pool's stake asset
    PoolVault(u32),
    /// A depositor or funder
    Account(Pubkey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub asset: Pubkey,
    pub from: Party,
    pub to: Party,
    pub amount: u64,
}

impl Transfer {
    pub fn reversed(&self) -> Self {
        Self {
            asset: self.asset,
            from: self.to,
            to: self.from,
            amount: self.amount,
        }
    }
}

/// Moves assets between parties
pub trait AssetLedger {
    fn transfer(&mut self, transfer: &Transfer) -> ProgramResult;

    /// Undo a completed transfer
    fn revert(&mut self, transfer: &Transfer) -> ProgramResult {
        self.transfer(&transfer.reversed())
    }
}

/// Execute `transfers` in order, all or nothing. Zero-amount legs are skipped.
pub fn settle<L: AssetLedger + ?Sized>(ledger: &mut L, transfers: &[Transfer]) -> ProgramResult {
    let mut completed: Vec<&Transfer> = Vec::with_capacity(transfers.len());

    for transfer in transfers.iter().filter(|transfer| transfer.amount > 0) {
        if let Err(err) = ledger.transfer(transfer) {
            msg!("Transfer of {} failed: {}", transfer.amount, err);

            while let Some(done) = completed.pop() {
                if let Err(revert_err) = ledger.revert(done) {
                    msg!("Failed to revert transfer of {}: {}", done.amount, revert_err);
                }
            }
            return Err(err);
        }
        completed.push(transfer);
    }

    Ok(())
}

/// Token accounts on both sides of one custody route
#[derive(Clone, Copy)]
pub struct TokenRoute<'a, 'b> {
    pub user_token: &'b AccountInfo<'a>,
    pub vault: &'b AccountInfo<'a>,
}

/// [`AssetLedger`] backed by SPL token CPIs.
///
/// Outbound legs are signed by the farm PDA, which owns every vault. Inbound
/// legs are signed by the instruction's user signer.
pub struct SplTokenLedger<'a, 'b> {
    token_program: &'b AccountInfo<'a>,
    user: &'b AccountInfo<'a>,
    farm: &'b AccountInfo<'a>,
    reward_mint: Pubkey,
    farm_bump: u8,
    reward: Option<TokenRoute<'a, 'b>>,
    stake: Option<(u32, TokenRoute<'a, 'b>)>,
}

impl<'a, 'b> SplTokenLedger<'a, 'b> {
    pub fn new(
        token_program: &'b AccountInfo<'a>,
        user: &'b AccountInfo<'a>,
        farm: &'b AccountInfo<'a>,
        reward_mint: Pubkey,
        farm_bump: u8,
    ) -> Self {
        Self {
            token_program,
            user,
            farm,
            reward_mint,
            farm_bump,
            reward: None,
            stake: None,
        }
    }

    pub fn with_reward_route(
        mut self,
        user_token: &'b AccountInfo<'a>,
        vault: &'b AccountInfo<'a>,
    ) -> Self {
        self.reward = Some(TokenRoute { user_token, vault });
        self
    }

    pub fn with_stake_route(
        mut self,
        pool_index: u32,
        user_token: &'b AccountInfo<'a>,
        vault: &'b AccountInfo<'a>,
    ) -> Self {
        self.stake = Some((pool_index, TokenRoute { user_token, vault }));
        self
    }

    fn reward_route(&self, asset: &Pubkey) -> Result<TokenRoute<'a, 'b>, ProgramError> {
        if *asset != self.reward_mint {
            msg!("Reward leg for unexpected mint {}", asset);
            return Err(ProgramError::InvalidArgument);
        }
        self.reward.ok_or(ProgramError::NotEnoughAccountKeys)
    }

    fn stake_route(&self, pool_index: u32) -> Result<TokenRoute<'a, 'b>, ProgramError> {
        match self.stake {
            Some((index, route)) if index == pool_index => Ok(route),
            _ => Err(ProgramError::NotEnoughAccountKeys),
        }
    }

    /// Source and destination token accounts, and whether custody is the source
    fn resolve(
        &self,
        transfer: &Transfer,
    ) -> Result<(&'b AccountInfo<'a>, &'b AccountInfo<'a>, bool), ProgramError> {
        match (transfer.from, transfer.to) {
            (Party::RewardVault, Party::Account(_)) => {
                let route = self.reward_route(&transfer.asset)?;
                Ok((route.vault, route.user_token, true))
            }
            (Party::Account(_), Party::RewardVault) => {
                let route = self.reward_route(&transfer.asset)?;
                Ok((route.user_token, route.vault, false))
            }
            (Party::PoolVault(index), Party::Account(_)) => {
                let route = self.stake_route(index)?;
                Ok((route.vault, route.user_token, true))
            }
            (Party::Account(_), Party::PoolVault(index)) => {
                let route = self.stake_route(index)?;
                Ok((route.user_token, route.vault, false))
            }
            _ => Err(ProgramError::InvalidArgument),
        }
    }
}

impl AssetLedger for SplTokenLedger<'_, '_> {
    fn transfer(&mut self, transfer: &Transfer) -> ProgramResult {
        let (source, destination, from_custody) = self.resolve(transfer)?;

        if from_custody {
            let ix = token_instruction::transfer(
                self.token_program.key,
                source.key,
                destination.key,
                self.farm.key,
                &[],
                transfer.amount,
            )?;
            let bump = [self.farm_bump];
            invoke_signed(
                &ix,
                &[
                    source.clone(),
                    destination.clone(),
                    self.farm.clone(),
                    self.token_program.clone(),
                ],
                &[&[FARM_SEED, self.reward_mint.as_ref(), &bump]],
            )
        } else {
            if transfer.from != Party::Account(*self.user.key) {
                msg!("Inbound leg must come from the signer");
                return Err(StakingMiningError::TransferFailed.into());
            }
            let ix = token_instruction::transfer(
                self.token_program.key,
                source.key,
                destination.key,
                self.user.key,
                &[],
                transfer.amount,
            )?;
            invoke(
                &ix,
                &[
                    source.clone(),
                    destination.clone(),
                    self.user.clone(),
                    self.token_program.clone(),
                ],
            )
        }
    }

    /// A failed instruction discards every account write, CPIs included
    fn revert(&mut self, _transfer: &Transfer) -> ProgramResult {
        Ok(())
    }
}
