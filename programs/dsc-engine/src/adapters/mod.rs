//! On-chain implementations of the collaborator traits

pub mod price_account;
pub mod spl;

pub use price_account::*;
pub use spl::*;
