//! Event logging for the staking mining program
//!
//! Each event is logged as a marker line, its type and the base58 encoded
//! borsh payload so indexers can decode it from the transaction logs.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Registry events
    PoolRegistered = 1,
    PoolWeightUpdated = 2,

    // Funding events
    Funded = 10,

    // Stake events
    Deposited = 20,
    Withdrawn = 21,
    EmergencyWithdrawn = 22,
    RewardPaid = 23,

    // Admin events
    AdministratorChanged = 30,
}

pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    fn emit(&self) {
        msg!("STAKING_MINING_EVENT");
        msg!("TYPE:{:?}", Self::event_type());

        if let Ok(data) = self.try_to_vec() {
            msg!("DATA:{}", bs58::encode(&data).into_string());
        }
    }
}

/// Macro for event definition: define_event!(EventName { field: type, ... })
#[macro_export]
macro_rules! define_event {
    ($name:ident { $($field:ident: $type:ty),* $(,)? }) => {
        #[derive(::borsh::BorshSerialize, ::borsh::BorshDeserialize, Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $type,)*
        }

        impl $crate::events::Event for $name {
            fn event_type() -> $crate::events::EventType {
                $crate::events::EventType::$name
            }
        }
    };
}

define_event!(PoolRegistered {
    index: u32,
    alloc_weight: u64,
    stake_mint: Pubkey,
});

define_event!(PoolWeightUpdated {
    index: u32,
    previous_alloc_weight: u64,
    alloc_weight: u64,
});

define_event!(Funded {
    amount: u64,
    new_end_timestamp: UnixTimestamp,
});

define_event!(Deposited {
    owner: Pubkey,
    index: u32,
    amount: u64,
});

define_event!(Withdrawn {
    owner: Pubkey,
    index: u32,
    amount: u64,
});

define_event!(EmergencyWithdrawn {
    owner: Pubkey,
    index: u32,
    amount: u64,
});

define_event!(RewardPaid {
    owner: Pubkey,
    index: u32,
    amount: u64,
});

define_event!(AdministratorChanged {
    previous: Pubkey,
    current: Pubkey,
});

/// Outcome of a stake operation: the operation's own event and the reward
/// settled along with it, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeReceipt<E: Event> {
    pub reward: Option<RewardPaid>,
    pub event: E,
}

impl<E: Event> StakeReceipt<E> {
    pub fn reward_amount(&self) -> u64 {
        self.reward.as_ref().map_or(0, |paid| paid.amount)
    }

    /// Log the reward payment first, then the operation event
    pub fn emit(&self) {
        if let Some(paid) = &self.reward {
            paid.emit();
        }
        self.event.emit();
    }
}
