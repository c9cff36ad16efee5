use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    constants::MAX_COLLATERAL_TYPES,
    error::DscEngineError,
};

/// Collateral and debt of one user. Absent entries are zero.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPosition {
    /// Deposited amount per collateral token
    pub collateral_deposited: BTreeMap<Pubkey, u128>,

    /// Stable units minted against the collateral
    pub debt_minted: u128,
}

impl UserPosition {
    pub const LEN: usize = 4 + MAX_COLLATERAL_TYPES * (32 + 16) + // collateral_deposited
        16; // debt_minted

    pub fn collateral_of(&self, token: &Pubkey) -> u128 {
        self.collateral_deposited.get(token).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.debt_minted == 0 && self.collateral_deposited.values().all(|&amount| amount == 0)
    }
}

/// System-wide sums, kept alongside the positions
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    /// Outstanding stable units across every position
    pub total_debt: u128,

    /// Collateral held in custody per token
    pub total_collateral: BTreeMap<Pubkey, u128>,
}

impl LedgerTotals {
    pub const LEN: usize = 16 + // total_debt
        4 + MAX_COLLATERAL_TYPES * (32 + 16); // total_collateral
}

/// Per-user collateral and debt book. Every decrement is checked; going below
/// zero is an error, never a saturation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStore {
    positions: BTreeMap<Pubkey, UserPosition>,
    totals: LedgerTotals,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted totals and the positions loaded for one call
    pub fn from_parts(totals: LedgerTotals, positions: impl IntoIterator<Item = (Pubkey, UserPosition)>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
            totals,
        }
    }

    /// Hand totals and positions back for persistence
    pub fn into_parts(self) -> (LedgerTotals, BTreeMap<Pubkey, UserPosition>) {
        (self.totals, self.positions)
    }

    pub fn position(&self, user: &Pubkey) -> Option<&UserPosition> {
        self.positions.get(user)
    }

    pub fn collateral_of(&self, user: &Pubkey, token: &Pubkey) -> u128 {
        self.positions
            .get(user)
            .map(|p| p.collateral_of(token))
            .unwrap_or(0)
    }

    pub fn debt_of(&self, user: &Pubkey) -> u128 {
        self.positions.get(user).map(|p| p.debt_minted).unwrap_or(0)
    }

    pub fn total_debt(&self) -> u128 {
        self.totals.total_debt
    }

    pub fn total_collateral(&self, token: &Pubkey) -> u128 {
        self.totals.total_collateral.get(token).copied().unwrap_or(0)
    }

    pub fn credit_collateral(&mut self, user: &Pubkey, token: &Pubkey, amount: u128) -> Result<(), DscEngineError> {
        let total = self.totals.total_collateral.entry(*token).or_insert(0);
        *total = total.checked_add(amount).ok_or(DscEngineError::ArithmeticOverflow)?;

        let entry = self
            .positions
            .entry(*user)
            .or_default()
            .collateral_deposited
            .entry(*token)
            .or_insert(0);
        *entry = entry.checked_add(amount).ok_or(DscEngineError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn debit_collateral(&mut self, user: &Pubkey, token: &Pubkey, amount: u128) -> Result<(), DscEngineError> {
        let held = self.collateral_of(user, token);
        let remaining = held
            .checked_sub(amount)
            .ok_or(DscEngineError::InsufficientCollateral)?;
        let total = self
            .total_collateral(token)
            .checked_sub(amount)
            .ok_or(DscEngineError::InsufficientCollateral)?;

        self.totals.total_collateral.insert(*token, total);
        self.positions
            .entry(*user)
            .or_default()
            .collateral_deposited
            .insert(*token, remaining);
        Ok(())
    }

    pub fn add_debt(&mut self, user: &Pubkey, amount: u128) -> Result<(), DscEngineError> {
        self.totals.total_debt = self
            .totals
            .total_debt
            .checked_add(amount)
            .ok_or(DscEngineError::ArithmeticOverflow)?;

        let position = self.positions.entry(*user).or_default();
        position.debt_minted = position
            .debt_minted
            .checked_add(amount)
            .ok_or(DscEngineError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn sub_debt(&mut self, user: &Pubkey, amount: u128) -> Result<(), DscEngineError> {
        let remaining = self
            .debt_of(user)
            .checked_sub(amount)
            .ok_or(DscEngineError::InsufficientDebt)?;
        let total = self
            .totals
            .total_debt
            .checked_sub(amount)
            .ok_or(DscEngineError::InsufficientDebt)?;

        self.totals.total_debt = total;
        self.positions.entry(*user).or_default().debt_minted = remaining;
        Ok(())
    }
}
