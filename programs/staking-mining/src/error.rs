use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum StakingMiningError {
    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Caller is not the administrator")]
    NotAuthorized = 1,

    #[error("Unknown pool index")]
    UnknownPool = 2,

    #[error("Emission window already closed")]
    EmissionClosed = 3,

    #[error("Withdraw amount exceeds recorded stake")]
    InsufficientStake = 4,

    #[error("Asset transfer failed")]
    TransferFailed = 5,

    #[error("Already initialized")]
    AlreadyInitialized = 6,

    #[error("Not initialized")]
    NotInitialized = 7,

    #[error("Invalid PDA")]
    InvalidPda = 8,

    #[error("Reward rate must be positive")]
    InvalidRewardRate = 9,

    #[error("Pool registry is full")]
    PoolLimitReached = 10,

    #[error("Stake account does not match pool or owner")]
    InvalidStakeAccount = 11,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 12,

    #[error("Divide by zero")]
    DivideByZero = 13,
}

impl PrintProgramError for StakingMiningError {
    fn print<E>(&self) {
        use solana_program::msg;
        msg!("StakingMiningError: {}", self);
    }
}

impl From<StakingMiningError> for ProgramError {
    fn from(e: StakingMiningError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for StakingMiningError {
    fn type_of() -> &'static str {
        "StakingMiningError"
    }
}
