pub mod accrual;
pub mod ledger;

pub use accrual::*;
pub use ledger::*;
