pub mod emission_window;
pub mod global_state;
pub mod pool;
pub mod stake_account;

pub use emission_window::*;
pub use global_state::*;
pub use pool::*;
pub use stake_account::*;
