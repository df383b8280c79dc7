//! Program Derived Address (PDA) derivation functions

use solana_program::pubkey::Pubkey;

use crate::constants::{FARM_SEED, POOL_VAULT_SEED, REWARD_VAULT_SEED, STAKE_ACCOUNT_SEED};

/// Farm state, one per reward mint. Also the authority of every vault.
pub struct FarmPDA;
impl FarmPDA {
    pub fn derive(program_id: &Pubkey, reward_mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[FARM_SEED, reward_mint.as_ref()], program_id)
    }
}

/// Token account holding the funded reward asset
pub struct RewardVaultPDA;
impl RewardVaultPDA {
    pub fn derive(program_id: &Pubkey, farm: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[REWARD_VAULT_SEED, farm.as_ref()], program_id)
    }
}

/// Token account holding one pool's stake asset
pub struct PoolVaultPDA;
impl PoolVaultPDA {
    pub fn derive(program_id: &Pubkey, farm: &Pubkey, pool_index: u32) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[POOL_VAULT_SEED, farm.as_ref(), &pool_index.to_le_bytes()],
            program_id,
        )
    }
}

/// One depositor's position in one pool
pub struct StakeAccountPDA;
impl StakeAccountPDA {
    pub fn derive(
        program_id: &Pubkey,
        farm: &Pubkey,
        pool_index: u32,
        owner: &Pubkey,
    ) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[
                STAKE_ACCOUNT_SEED,
                farm.as_ref(),
                &pool_index.to_le_bytes(),
                owner.as_ref(),
            ],
            program_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_vaults_are_distinct() {
        let program_id = Pubkey::new_unique();
        let farm = Pubkey::new_unique();

        let (first, _) = PoolVaultPDA::derive(&program_id, &farm, 0);
        let (second, _) = PoolVaultPDA::derive(&program_id, &farm, 1);
        let (reward, _) = RewardVaultPDA::derive(&program_id, &farm);

        assert_ne!(first, second);
        assert_ne!(first, reward);
    }

    #[test]
    fn test_stake_accounts_keyed_by_pool_and_owner() {
        let program_id = Pubkey::new_unique();
        let farm = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        let (a, _) = StakeAccountPDA::derive(&program_id, &farm, 0, &owner);
        let (b, _) = StakeAccountPDA::derive(&program_id, &farm, 1, &owner);
        let (c, _) = StakeAccountPDA::derive(&program_id, &farm, 0, &Pubkey::new_unique());

        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
