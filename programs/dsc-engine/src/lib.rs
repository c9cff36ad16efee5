// Over-collateralized stable unit issuance engine
// Native Solana implementation - NO ANCHOR

#[cfg(not(feature = "no-entrypoint"))]
use solana_program::entrypoint;

pub mod adapters;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod oracle;
pub mod processor;
pub mod security;
pub mod settlement;
pub mod state;
pub mod token;

use processor::process_instruction;

// Declare program ID
solana_program::declare_id!("DscEng1neStab1eUn1t111111111111111111111111");

#[cfg(not(feature = "no-entrypoint"))]
entrypoint!(process_instruction);
