//! Deposit, redeem, mint and burn
//!
//! Public entry points take the guard through `atomically`. The private steps
//! below only touch the ledger and queue interactions, so the combined entry
//! points can chain them under one guard and one health check.

use solana_program::{msg, pubkey::Pubkey};

use super::{require_non_zero, DscEngine, Operation};
use crate::{
    error::DscEngineError,
    events::{CollateralDeposited, CollateralRedeemed, EngineEvent},
    oracle::OracleGateway,
    token::TokenGateway,
};

impl DscEngine {
    /// Lock `amount` of a registered collateral token
    pub fn deposit_collateral(
        &mut self,
        gateway: &mut dyn TokenGateway,
        caller: &Pubkey,
        token: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| engine.deposit(op, caller, token, amount))
    }

    /// Issue `amount` stable units against the caller's collateral
    pub fn mint_dsc(
        &mut self,
        oracle: &OracleGateway,
        gateway: &mut dyn TokenGateway,
        caller: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| {
            engine.mint(op, caller, amount)?;
            engine.assert_healthy(oracle, caller)
        })
    }

    pub fn deposit_collateral_and_mint_dsc(
        &mut self,
        oracle: &OracleGateway,
        gateway: &mut dyn TokenGateway,
        caller: &Pubkey,
        token: &Pubkey,
        collateral_amount: u128,
        mint_amount: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| {
            engine.deposit(op, caller, token, collateral_amount)?;
            engine.mint(op, caller, mint_amount)?;
            engine.assert_healthy(oracle, caller)
        })
    }

    /// Withdraw collateral; the position must stay healthy
    pub fn redeem_collateral(
        &mut self,
        oracle: &OracleGateway,
        gateway: &mut dyn TokenGateway,
        caller: &Pubkey,
        token: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| {
            engine.redeem(op, caller, caller, token, amount)?;
            engine.assert_healthy(oracle, caller)
        })
    }

    /// Repay debt with the caller's own stable units
    pub fn burn_dsc(
        &mut self,
        gateway: &mut dyn TokenGateway,
        caller: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| engine.burn(op, caller, caller, amount))
    }

    /// Burn first, then redeem, with a single health check at the end
    pub fn redeem_collateral_and_burn_dsc(
        &mut self,
        oracle: &OracleGateway,
        gateway: &mut dyn TokenGateway,
        caller: &Pubkey,
        token: &Pubkey,
        collateral_amount: u128,
        burn_amount: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| {
            engine.burn(op, caller, caller, burn_amount)?;
            engine.redeem(op, caller, caller, token, collateral_amount)?;
            engine.assert_healthy(oracle, caller)
        })
    }

    pub(super) fn deposit(
        &mut self,
        op: &mut Operation,
        user: &Pubkey,
        token: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        require_non_zero(amount)?;
        if !self.registry.is_registered(token) {
            return Err(DscEngineError::TokenNotAllowed);
        }

        self.ledger.credit_collateral(user, token, amount)?;
        op.settlement.pull(*token, *user, amount);
        op.events.push(EngineEvent::CollateralDeposited(CollateralDeposited {
            user: *user,
            token: *token,
            amount,
        }));

        msg!("Deposit {} of {} by {}", amount, token, user);
        Ok(())
    }

    /// Debit `from`'s collateral and pay it out to `to`
    pub(super) fn redeem(
        &mut self,
        op: &mut Operation,
        from: &Pubkey,
        to: &Pubkey,
        token: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        require_non_zero(amount)?;
        if !self.registry.is_registered(token) {
            return Err(DscEngineError::TokenNotAllowed);
        }

        self.ledger.debit_collateral(from, token, amount)?;
        op.settlement.push(*token, *to, amount);
        op.events.push(EngineEvent::CollateralRedeemed(CollateralRedeemed {
            from: *from,
            to: *to,
            token: *token,
            amount,
        }));

        msg!("Redeem {} of {} from {} to {}", amount, token, from, to);
        Ok(())
    }

    /// Record new debt; the caller checks health before anything settles
    pub(super) fn mint(&mut self, op: &mut Operation, user: &Pubkey, amount: u128) -> Result<(), DscEngineError> {
        require_non_zero(amount)?;

        self.ledger.add_debt(user, amount)?;
        op.settlement.mint(*user, amount);

        msg!("Mint {} stable units to {}", amount, user);
        Ok(())
    }

    /// Relieve `on_behalf_of`'s debt with units pulled from `payer`
    pub(super) fn burn(
        &mut self,
        op: &mut Operation,
        on_behalf_of: &Pubkey,
        payer: &Pubkey,
        amount: u128,
    ) -> Result<(), DscEngineError> {
        require_non_zero(amount)?;

        self.ledger.sub_debt(on_behalf_of, amount)?;
        op.settlement.pull(self.stable_token, *payer, amount);
        op.settlement.burn(amount);

        msg!("Burn {} stable units for {} paid by {}", amount, on_behalf_of, payer);
        Ok(())
    }
}
