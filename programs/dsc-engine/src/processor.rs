use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::invoke_signed,
    program_error::ProgramError,
    program_option::COption,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};
use spl_token::state::Mint;

use crate::{
    adapters::{AccountPriceFeed, SplTokenGateway, TOKEN_PROGRAM_ID},
    constants::{ENGINE_STATE_SEED, GUARD_SEED, POSITION_SEED},
    engine::DscEngine,
    error::DscEngineError,
    instructions::{custody_address, engine_state_address, guard_address, position_address, DscInstruction},
    oracle::OracleGateway,
    security::{ReentrancyContext, ReentrancyGuard},
    state::{CollateralRegistry, EngineConfig, EngineState, PositionAccount, UserPosition},
    token::TokenGateway,
};

pub fn process_instruction<'a>(
    program_id: &Pubkey,
    accounts: &[AccountInfo<'a>],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = DscInstruction::unpack(instruction_data)?;

    match instruction {
        DscInstruction::Initialize {
            collateral_tokens,
            price_feeds,
            oracle_program,
            config,
        } => {
            msg!("Instruction: Initialize");
            process_initialize(
                program_id,
                accounts,
                &collateral_tokens,
                &price_feeds,
                oracle_program,
                config,
            )
        }

        DscInstruction::DepositCollateral { token, amount } => {
            msg!("Instruction: DepositCollateral");
            with_engine(program_id, accounts, None, |engine, _, gateway, caller| {
                engine.deposit_collateral(gateway, caller, &token, amount as u128)
            })
        }

        DscInstruction::MintDsc { amount } => {
            msg!("Instruction: MintDsc");
            with_engine(program_id, accounts, None, |engine, oracle, gateway, caller| {
                engine.mint_dsc(oracle, gateway, caller, amount as u128)
            })
        }

        DscInstruction::DepositCollateralAndMintDsc {
            token,
            collateral_amount,
            mint_amount,
        } => {
            msg!("Instruction: DepositCollateralAndMintDsc");
            with_engine(program_id, accounts, None, |engine, oracle, gateway, caller| {
                engine.deposit_collateral_and_mint_dsc(
                    oracle,
                    gateway,
                    caller,
                    &token,
                    collateral_amount as u128,
                    mint_amount as u128,
                )
            })
        }

        DscInstruction::RedeemCollateral { token, amount } => {
            msg!("Instruction: RedeemCollateral");
            with_engine(program_id, accounts, None, |engine, oracle, gateway, caller| {
                engine.redeem_collateral(oracle, gateway, caller, &token, amount as u128)
            })
        }

        DscInstruction::BurnDsc { amount } => {
            msg!("Instruction: BurnDsc");
            with_engine(program_id, accounts, None, |engine, _, gateway, caller| {
                engine.burn_dsc(gateway, caller, amount as u128)
            })
        }

        DscInstruction::RedeemCollateralAndBurnDsc {
            token,
            collateral_amount,
            burn_amount,
        } => {
            msg!("Instruction: RedeemCollateralAndBurnDsc");
            with_engine(program_id, accounts, None, |engine, oracle, gateway, caller| {
                engine.redeem_collateral_and_burn_dsc(
                    oracle,
                    gateway,
                    caller,
                    &token,
                    collateral_amount as u128,
                    burn_amount as u128,
                )
            })
        }

        DscInstruction::Liquidate {
            collateral_token,
            debtor,
            debt_to_cover,
        } => {
            msg!("Instruction: Liquidate");
            with_engine(program_id, accounts, Some(debtor), |engine, oracle, gateway, caller| {
                engine.liquidate(oracle, gateway, caller, &collateral_token, &debtor, debt_to_cover as u128)
            })
        }
    }
}

/// Create the engine state and guard accounts
fn process_initialize<'a>(
    program_id: &Pubkey,
    accounts: &[AccountInfo<'a>],
    collateral_tokens: &[Pubkey],
    price_feeds: &[Pubkey],
    oracle_program: Pubkey,
    config: EngineConfig,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let payer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let guard_info = next_account_info(account_info_iter)?;
    let custody_info = next_account_info(account_info_iter)?;
    let mint_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    if !payer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if !state_info.data_is_empty() {
        return Err(DscEngineError::AccountAlreadyInitialized.into());
    }

    config.validate()?;
    let registry = CollateralRegistry::new(collateral_tokens, price_feeds)?;

    let (state_key, state_bump) = engine_state_address(program_id);
    let (guard_key, guard_bump) = guard_address(program_id);
    let (custody_key, custody_bump) = custody_address(program_id);
    if *state_info.key != state_key || *guard_info.key != guard_key {
        return Err(DscEngineError::InvalidAccountAddress.into());
    }
    if *custody_info.key != custody_key {
        return Err(DscEngineError::InvalidCustody.into());
    }

    // Only the custody PDA may issue stable units
    if mint_info.owner != &TOKEN_PROGRAM_ID {
        return Err(ProgramError::IncorrectProgramId);
    }
    let mint = Mint::unpack(&mint_info.data.borrow())?;
    if mint.mint_authority != COption::Some(custody_key) {
        msg!("Stable mint authority must be the custody PDA {}", custody_key);
        return Err(DscEngineError::InvalidCustody.into());
    }

    create_pda(
        program_id,
        payer_info,
        state_info,
        system_program,
        EngineState::LEN,
        &[ENGINE_STATE_SEED, &[state_bump]],
    )?;
    create_pda(
        program_id,
        payer_info,
        guard_info,
        system_program,
        ReentrancyGuard::LEN,
        &[GUARD_SEED, &[guard_bump]],
    )?;

    let state = EngineState::new(
        config,
        registry,
        *mint_info.key,
        custody_key,
        custody_bump,
        oracle_program,
    );
    state.serialize(&mut &mut state_info.data.borrow_mut()[..])?;
    ReentrancyGuard::new().serialize(&mut &mut guard_info.data.borrow_mut()[..])?;

    msg!(
        "Engine initialized: {} collateral types, stable mint {}",
        collateral_tokens.len(),
        mint_info.key
    );

    Ok(())
}

/// Load the engine, run one mutation under the account guard, write it back
fn with_engine<'a, F>(
    program_id: &Pubkey,
    accounts: &[AccountInfo<'a>],
    debtor: Option<Pubkey>,
    run: F,
) -> ProgramResult
where
    F: FnOnce(&mut DscEngine, &OracleGateway, &mut dyn TokenGateway, &Pubkey) -> Result<(), DscEngineError>,
{
    let account_info_iter = &mut accounts.iter();

    let caller_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let guard_info = next_account_info(account_info_iter)?;
    let position_info = next_account_info(account_info_iter)?;
    let custody_info = next_account_info(account_info_iter)?;
    let mint_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;
    let debtor_info = match debtor {
        Some(_) => Some(next_account_info(account_info_iter)?),
        None => None,
    };
    let remaining = account_info_iter.as_slice();

    if !caller_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if state_info.owner != program_id || guard_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    if *guard_info.key != guard_address(program_id).0 {
        return Err(DscEngineError::InvalidAccountAddress.into());
    }

    let guard = ReentrancyContext::enter(guard_info)?;

    let mut state = EngineState::deserialize(&mut &state_info.data.borrow()[..])?;
    state.validate()?;
    if *custody_info.key != state.custody {
        return Err(DscEngineError::InvalidCustody.into());
    }
    if *mint_info.key != state.stable_token {
        return Err(ProgramError::InvalidArgument);
    }
    if *token_program.key != TOKEN_PROGRAM_ID {
        return Err(ProgramError::IncorrectProgramId);
    }

    let mut position_infos: BTreeMap<Pubkey, &AccountInfo<'a>> = BTreeMap::new();
    let mut positions: Vec<(Pubkey, UserPosition)> = Vec::new();

    let caller_position = load_position(program_id, caller_info.key, position_info, Some((caller_info, system_program)))?;
    position_infos.insert(*caller_info.key, position_info);
    positions.push((*caller_info.key, caller_position));

    if let (Some(debtor), Some(debtor_info)) = (debtor, debtor_info) {
        if debtor != *caller_info.key {
            let debtor_position = load_position(program_id, &debtor, debtor_info, None)?;
            position_infos.insert(debtor, debtor_info);
            positions.push((debtor, debtor_position));
        }
    }

    let mut engine = DscEngine::restore(&state, positions);
    let clock = Clock::get()?;
    let feed = AccountPriceFeed::new(remaining, &state.oracle_program);
    let oracle = OracleGateway::new(&feed, clock.unix_timestamp, state.config.max_price_age);
    let mut gateway = SplTokenGateway::new(
        caller_info,
        custody_info,
        state.custody_bump,
        mint_info,
        token_program,
        remaining,
    );

    run(&mut engine, &oracle, &mut gateway, caller_info.key)?;

    let (totals, positions) = engine.into_parts();
    state.totals = totals;
    state.serialize(&mut &mut state_info.data.borrow_mut()[..])?;

    for (owner, position) in positions {
        let Some(info) = position_infos.get(&owner) else {
            msg!("Position of {} changed without its account", owner);
            return Err(ProgramError::NotEnoughAccountKeys);
        };
        let mut account = PositionAccount::deserialize(&mut &info.data.borrow()[..])?;
        account.position = position;
        account.serialize(&mut &mut info.data.borrow_mut()[..])?;
    }

    guard.exit()
}

/// Read `owner`'s position. A missing account is created when a payer is
/// given; otherwise the position must already exist.
fn load_position<'a>(
    program_id: &Pubkey,
    owner: &Pubkey,
    position_info: &AccountInfo<'a>,
    payer: Option<(&AccountInfo<'a>, &AccountInfo<'a>)>,
) -> Result<UserPosition, ProgramError> {
    let (expected, bump) = position_address(program_id, owner);
    if *position_info.key != expected {
        return Err(DscEngineError::InvalidAccountAddress.into());
    }

    if position_info.data_is_empty() {
        let Some((payer_info, system_program)) = payer else {
            return Err(DscEngineError::AccountNotInitialized.into());
        };
        create_pda(
            program_id,
            payer_info,
            position_info,
            system_program,
            PositionAccount::LEN,
            &[POSITION_SEED, owner.as_ref(), &[bump]],
        )?;
        let account = PositionAccount::new(*owner);
        account.serialize(&mut &mut position_info.data.borrow_mut()[..])?;
        msg!("Position account created for {}", owner);
        return Ok(account.position);
    }

    if position_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let account = PositionAccount::deserialize(&mut &position_info.data.borrow()[..])?;
    account.validate(owner)?;
    Ok(account.position)
}

fn create_pda<'a>(
    program_id: &Pubkey,
    payer_info: &AccountInfo<'a>,
    new_account_info: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    space: usize,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let required_lamports = rent.minimum_balance(space);

    invoke_signed(
        &system_instruction::create_account(
            payer_info.key,
            new_account_info.key,
            required_lamports,
            space as u64,
            program_id,
        ),
        &[
            payer_info.clone(),
            new_account_info.clone(),
            system_program.clone(),
        ],
        &[seeds],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_entered_guard_rejects_nested_call() {
        let program_id = crate::id();
        let caller = Pubkey::new_unique();
        let guard_key = guard_address(&program_id).0;
        let keys: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();

        let mut guard = ReentrancyGuard::new();
        guard.enter().unwrap();
        let mut guard_data = guard.try_to_vec().unwrap();
        let mut state_data = vec![0u8; 8];
        let mut empty: Vec<Vec<u8>> = (0..6).map(|_| Vec::new()).collect();
        let mut lamports = [0u64; 8];
        let [l0, l1, l2, rest @ ..] = &mut lamports;

        let (first, others) = empty.split_at_mut(1);

        let mut accounts = vec![
            AccountInfo::new(&caller, true, true, l0, &mut first[0], &program_id, false, 0),
            AccountInfo::new(&keys[0], false, true, l1, &mut state_data, &program_id, false, 0),
            AccountInfo::new(&guard_key, false, true, l2, &mut guard_data, &program_id, false, 0),
        ];
        for ((key, data), lamports) in keys[1..].iter().zip(others.iter_mut()).zip(rest.iter_mut()) {
            accounts.push(AccountInfo::new(key, false, false, lamports, data, &program_id, false, 0));
        }

        let data = DscInstruction::BurnDsc { amount: 1 }.try_to_vec().unwrap();
        assert_eq!(
            process_instruction(&program_id, &accounts, &data),
            Err(ProgramError::Custom(ErrorCode::ReentrancyDetected as u32))
        );
    }

    #[test]
    fn test_unknown_instruction() {
        assert_eq!(
            process_instruction(&crate::id(), &[], &[99]),
            Err(ProgramError::InvalidInstructionData)
        );
    }
}
