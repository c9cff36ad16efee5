pub mod collateral;
pub mod engine_config;
pub mod engine_state;
pub mod ledger;

pub use collateral::*;
pub use engine_config::*;
pub use engine_state::*;
pub use ledger::*;
