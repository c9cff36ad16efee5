use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    constants::{CUSTODY_SEED, ENGINE_STATE_SEED, GUARD_SEED, POSITION_SEED},
    state::EngineConfig,
};

/// Every mutation shares one account prefix:
/// 0. `[signer, writable]` Caller (pays for a new position account)
/// 1. `[writable]` Engine state PDA
/// 2. `[writable]` Reentrancy guard PDA
/// 3. `[writable]` Caller position PDA
/// 4. `[]` Custody authority PDA
/// 5. `[writable]` Stable unit mint
/// 6. `[]` SPL token program
/// 7. `[]` System program
///
/// followed by instruction specific accounts, then every token account and
/// price account the call touches, in any order.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum DscInstruction {
    /// Create the engine
    /// Accounts:
    /// 0. `[signer, writable]` Payer
    /// 1. `[writable]` Engine state PDA
    /// 2. `[writable]` Reentrancy guard PDA
    /// 3. `[]` Custody authority PDA, must be the stable mint authority
    /// 4. `[]` Stable unit mint
    /// 5. `[]` System program
    Initialize {
        collateral_tokens: Vec<Pubkey>,
        price_feeds: Vec<Pubkey>,
        /// Owner program of the price accounts
        oracle_program: Pubkey,
        config: EngineConfig,
    },

    /// Common prefix; token accounts: caller's and custody's for `token`
    DepositCollateral { token: Pubkey, amount: u64 },

    /// Common prefix; caller's stable account, price accounts of every deposited type
    MintDsc { amount: u64 },

    DepositCollateralAndMintDsc {
        token: Pubkey,
        collateral_amount: u64,
        mint_amount: u64,
    },

    RedeemCollateral { token: Pubkey, amount: u64 },

    /// Common prefix; caller's stable account and the custody stable vault
    BurnDsc { amount: u64 },

    RedeemCollateralAndBurnDsc {
        token: Pubkey,
        collateral_amount: u64,
        burn_amount: u64,
    },

    /// Common prefix, then
    /// 8. `[writable]` Debtor position PDA
    Liquidate {
        collateral_token: Pubkey,
        debtor: Pubkey,
        debt_to_cover: u64,
    },
}

impl DscInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }
}

pub fn engine_state_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ENGINE_STATE_SEED], program_id)
}

pub fn guard_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[GUARD_SEED], program_id)
}

pub fn custody_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CUSTODY_SEED], program_id)
}

pub fn position_address(program_id: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POSITION_SEED, owner.as_ref()], program_id)
}

// Helper functions to create instructions

pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    stable_mint: &Pubkey,
    collateral_tokens: Vec<Pubkey>,
    price_feeds: Vec<Pubkey>,
    oracle_program: Pubkey,
    config: EngineConfig,
) -> Result<Instruction, ProgramError> {
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(engine_state_address(program_id).0, false),
        AccountMeta::new(guard_address(program_id).0, false),
        AccountMeta::new_readonly(custody_address(program_id).0, false),
        AccountMeta::new_readonly(*stable_mint, false),
        AccountMeta::new_readonly(solana_program::system_program::id(), false),
    ];

    let data = DscInstruction::Initialize {
        collateral_tokens,
        price_feeds,
        oracle_program,
        config,
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: data.try_to_vec()?,
    })
}

/// Build any mutation. `debtor` is required for `Liquidate` and ignored
/// otherwise; `extra` carries the token and price accounts.
pub fn mutation(
    program_id: &Pubkey,
    caller: &Pubkey,
    stable_mint: &Pubkey,
    instruction: DscInstruction,
    extra: &[AccountMeta],
) -> Result<Instruction, ProgramError> {
    let mut accounts = vec![
        AccountMeta::new(*caller, true),
        AccountMeta::new(engine_state_address(program_id).0, false),
        AccountMeta::new(guard_address(program_id).0, false),
        AccountMeta::new(position_address(program_id, caller).0, false),
        AccountMeta::new_readonly(custody_address(program_id).0, false),
        AccountMeta::new(*stable_mint, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(solana_program::system_program::id(), false),
    ];

    match &instruction {
        DscInstruction::Initialize { .. } => return Err(ProgramError::InvalidArgument),
        DscInstruction::Liquidate { debtor, .. } => {
            accounts.push(AccountMeta::new(position_address(program_id, debtor).0, false));
        }
        _ => {}
    }
    accounts.extend_from_slice(extra);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction.try_to_vec()?,
    })
}
