use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{entrypoint::ProgramResult, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    constants::LAYOUT_VERSION,
    error::StakingMiningError,
    math::{FixedPointAccumulator, U256},
};

/// One depositor's position in one pool
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct StakeAccount {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub version: u8,
    pub farm: Pubkey,
    pub pool_index: u32,
    pub owner: Pubkey,
    pub amount: u64,
    pub reward_debt: u128,              // amount * acc_reward_per_share / PRECISION at last settlement
    pub bump: u8,
}

impl StakeAccount {
    pub const DISCRIMINATOR: [u8; 8] = *b"STKMSTAK";

    /// Padded for future expansion
    pub const LEN: usize = 128;

    pub fn new(farm: Pubkey, pool_index: u32, owner: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            version: LAYOUT_VERSION,
            farm,
            pool_index,
            owner,
            amount: 0,
            reward_debt: 0,
            bump,
        }
    }

    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let mut cursor = data;
        let account = Self::deserialize(&mut cursor)
            .map_err(|_| ProgramError::InvalidAccountData)?;

        if account.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        if !account.is_initialized {
            return Err(StakingMiningError::NotInitialized.into());
        }

        Ok(account)
    }

    pub fn pack(&self, dst: &mut [u8]) -> ProgramResult {
        let mut cursor = dst;
        self.serialize(&mut cursor)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// The position must belong to `owner` in pool `pool_index`
    pub fn require_key(&self, pool_index: u32, owner: &Pubkey) -> ProgramResult {
        if self.pool_index != pool_index || self.owner != *owner {
            return Err(StakingMiningError::InvalidStakeAccount.into());
        }
        Ok(())
    }

    /// Reward owed at accumulator `acc`
    pub fn pending(&self, acc: &U256) -> Result<u64, ProgramError> {
        let pending = FixedPointAccumulator::pending(self.amount, acc, self.reward_debt)?;
        FixedPointAccumulator::to_token_amount(pending)
    }

    /// Reset the debt so nothing is owed at accumulator `acc`
    pub fn checkpoint(&mut self, acc: &U256) -> ProgramResult {
        self.reward_debt = FixedPointAccumulator::reward_debt(self.amount, acc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRECISION;

    #[test]
    fn test_serialized_size_fits() {
        let account = StakeAccount::new(Pubkey::new_unique(), 3, Pubkey::new_unique(), 255);
        let data = account.try_to_vec().unwrap();
        assert!(data.len() <= StakeAccount::LEN);

        let mut buffer = vec![0u8; StakeAccount::LEN];
        account.pack(&mut buffer).unwrap();
        assert_eq!(StakeAccount::unpack(&buffer).unwrap(), account);
    }

    #[test]
    fn test_require_key() {
        let owner = Pubkey::new_unique();
        let account = StakeAccount::new(Pubkey::new_unique(), 1, owner, 255);

        assert!(account.require_key(1, &owner).is_ok());
        assert_eq!(
            account.require_key(0, &owner),
            Err(StakingMiningError::InvalidStakeAccount.into())
        );
        assert_eq!(
            account.require_key(1, &Pubkey::new_unique()),
            Err(StakingMiningError::InvalidStakeAccount.into())
        );
    }

    #[test]
    fn test_pending_and_checkpoint() {
        let mut account = StakeAccount::new(Pubkey::new_unique(), 0, Pubkey::new_unique(), 255);
        account.amount = 40;

        // 2.5 reward per share
        let acc = U256::from_u128(PRECISION * 5 / 2);
        assert_eq!(account.pending(&acc).unwrap(), 100);

        account.checkpoint(&acc).unwrap();
        assert_eq!(account.reward_debt, 100);
        assert_eq!(account.pending(&acc).unwrap(), 0);
    }
}
