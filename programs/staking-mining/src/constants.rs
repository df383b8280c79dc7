//! Staking mining constants
//!
//! PDA seeds, the fixed-point scale and the bounds of the persisted layout.

/// Scale of `acc_reward_per_share` (1e36)
pub const PRECISION: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;

/// Maximum number of pools a farm can register
pub const MAX_POOLS: usize = 32;

/// Current persisted layout version of the farm and stake accounts
pub const LAYOUT_VERSION: u8 = 1;

/// Seeds for PDAs
pub const FARM_SEED: &[u8] = b"staking_mining";
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";
pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";
pub const STAKE_ACCOUNT_SEED: &[u8] = b"stake";
