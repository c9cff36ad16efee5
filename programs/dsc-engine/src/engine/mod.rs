//! Stable unit engine
//!
//! Owns the collateral list and the ledger. Every mutation runs inside
//! `atomically`: the guard is held for the whole call, token interactions are
//! settled only once every check passed, and the ledger snapshot is restored
//! on any failure. Interactions that could not be undone are kept in
//! `stranded` for reconciliation.

use std::collections::BTreeMap;

use solana_program::{msg, pubkey::Pubkey};

use crate::{
    constants::{ADDITIONAL_FEED_PRECISION, PRECISION},
    error::DscEngineError,
    events::EngineEvent,
    math::checked_add,
    oracle::OracleGateway,
    security::ReentrancyGuard,
    settlement::{Interaction, Settlement},
    state::{CollateralRegistry, EngineConfig, EngineState, LedgerStore, LedgerTotals, UserPosition},
    token::TokenGateway,
};

mod health;
mod liquidation;
mod positions;
mod valuation;

pub use health::calculate_health_factor;

/// Collateral ledger, solvency checks and liquidation for one stable unit
#[derive(Debug, Clone)]
pub struct DscEngine {
    config: EngineConfig,
    registry: CollateralRegistry,
    stable_token: Pubkey,
    custody: Pubkey,
    ledger: LedgerStore,
    guard: ReentrancyGuard,
    events: Vec<EngineEvent>,
    stranded: Vec<Interaction>,
}

/// Pending work of the mutation in flight
pub(crate) struct Operation {
    settlement: Settlement,
    events: Vec<EngineEvent>,
}

impl DscEngine {
    /// Engine with the default risk parameters
    pub fn new(
        collateral_tokens: &[Pubkey],
        price_feeds: &[Pubkey],
        stable_token: Pubkey,
        custody: Pubkey,
    ) -> Result<Self, DscEngineError> {
        Self::with_config(
            EngineConfig::default(),
            collateral_tokens,
            price_feeds,
            stable_token,
            custody,
        )
    }

    pub fn with_config(
        config: EngineConfig,
        collateral_tokens: &[Pubkey],
        price_feeds: &[Pubkey],
        stable_token: Pubkey,
        custody: Pubkey,
    ) -> Result<Self, DscEngineError> {
        config.validate()?;
        let registry = CollateralRegistry::new(collateral_tokens, price_feeds)?;

        msg!(
            "Engine created: {} collateral types, stable unit {}",
            registry.len(),
            stable_token
        );

        Ok(Self {
            config,
            registry,
            stable_token,
            custody,
            ledger: LedgerStore::new(),
            guard: ReentrancyGuard::new(),
            events: Vec::new(),
            stranded: Vec::new(),
        })
    }

    /// Rebuild from the engine account and the positions one instruction touches
    pub fn restore(
        state: &EngineState,
        positions: impl IntoIterator<Item = (Pubkey, UserPosition)>,
    ) -> Self {
        Self {
            config: state.config,
            registry: state.collateral.clone(),
            stable_token: state.stable_token,
            custody: state.custody,
            ledger: LedgerStore::from_parts(state.totals.clone(), positions),
            guard: ReentrancyGuard::new(),
            events: Vec::new(),
            stranded: Vec::new(),
        }
    }

    /// Totals and touched positions, ready to be written back
    pub fn into_parts(self) -> (LedgerTotals, BTreeMap<Pubkey, UserPosition>) {
        self.ledger.into_parts()
    }

    /// Run one mutation all-or-nothing. `op` only changes the ledger and
    /// queues interactions; nothing leaves the engine until it returned `Ok`.
    fn atomically<T>(
        &mut self,
        gateway: &mut dyn TokenGateway,
        op: impl FnOnce(&mut Self, &mut Operation) -> Result<T, DscEngineError>,
    ) -> Result<T, DscEngineError> {
        self.guard.enter()?;

        let snapshot = self.ledger.clone();
        let mut operation = Operation {
            settlement: Settlement::new(self.custody, self.stable_token),
            events: Vec::new(),
        };

        let result = match op(self, &mut operation) {
            Ok(value) => match operation.settlement.execute(gateway) {
                Ok(()) => Ok(value),
                Err(failure) => {
                    self.stranded.extend(failure.stranded);
                    Err(failure.error)
                }
            },
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => {
                for event in operation.events {
                    event.emit();
                    self.events.push(event);
                }
            }
            Err(e) => {
                msg!("Operation reverted: {}", e);
                self.ledger = snapshot;
            }
        }

        self.guard.exit()?;
        result
    }

    // Queries

    /// `(debt_minted, collateral_value_usd)` of `user`
    pub fn account_information(
        &self,
        oracle: &OracleGateway,
        user: &Pubkey,
    ) -> Result<(u128, u128), DscEngineError> {
        let debt = self.ledger.debt_of(user);
        let collateral_value = self.account_collateral_value(oracle, user)?;
        Ok((debt, collateral_value))
    }

    /// USD value of everything `user` deposited, at current prices
    pub fn account_collateral_value(
        &self,
        oracle: &OracleGateway,
        user: &Pubkey,
    ) -> Result<u128, DscEngineError> {
        let mut total = 0u128;
        for collateral in self.registry.iter() {
            let amount = self.ledger.collateral_of(user, &collateral.token);
            if amount == 0 {
                continue;
            }
            let value = self.usd_value(oracle, &collateral.token, amount)?;
            total = checked_add(total, value)?;
        }
        Ok(total)
    }

    pub fn health_factor(&self, oracle: &OracleGateway, user: &Pubkey) -> Result<u128, DscEngineError> {
        let (debt, collateral_value) = self.account_information(oracle, user)?;
        self.calculate_health_factor(debt, collateral_value)
    }

    /// Health factor of a hypothetical position under this engine's parameters
    pub fn calculate_health_factor(&self, debt: u128, collateral_value: u128) -> Result<u128, DscEngineError> {
        calculate_health_factor(&self.config, debt, collateral_value)
    }

    pub fn usd_value(&self, oracle: &OracleGateway, token: &Pubkey, amount: u128) -> Result<u128, DscEngineError> {
        valuation::usd_value(oracle, &self.registry, token, amount)
    }

    pub fn token_amount_from_usd(
        &self,
        oracle: &OracleGateway,
        token: &Pubkey,
        usd_amount: u128,
    ) -> Result<u128, DscEngineError> {
        valuation::token_amount_from_usd(oracle, &self.registry, token, usd_amount)
    }

    pub fn collateral_balance_of(&self, user: &Pubkey, token: &Pubkey) -> u128 {
        self.ledger.collateral_of(user, token)
    }

    pub fn debt_of(&self, user: &Pubkey) -> u128 {
        self.ledger.debt_of(user)
    }

    /// Registered collateral tokens, in registration order
    pub fn collateral_tokens(&self) -> Vec<Pubkey> {
        self.registry.tokens()
    }

    pub fn price_feed_of(&self, token: &Pubkey) -> Result<Pubkey, DscEngineError> {
        self.registry.price_feed_of(token)
    }

    pub fn min_health_factor(&self) -> u128 {
        self.config.min_health_factor
    }

    pub fn stable_token(&self) -> Pubkey {
        self.stable_token
    }

    pub fn liquidation_threshold(&self) -> u64 {
        self.config.liquidation_threshold
    }

    pub fn liquidation_bonus(&self) -> u64 {
        self.config.liquidation_bonus
    }

    pub fn liquidation_precision(&self) -> u64 {
        self.config.liquidation_precision
    }

    pub fn precision(&self) -> u128 {
        PRECISION
    }

    pub fn additional_feed_precision(&self) -> u128 {
        ADDITIONAL_FEED_PRECISION
    }

    pub fn total_debt(&self) -> u128 {
        self.ledger.total_debt()
    }

    pub fn total_collateral(&self, token: &Pubkey) -> u128 {
        self.ledger.total_collateral(token)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Events of every committed operation, oldest first
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Token interactions left in place by a failed rollback, oldest failure first
    pub fn stranded(&self) -> &[Interaction] {
        &self.stranded
    }

    /// True while a mutation is in flight
    pub fn is_locked(&self) -> bool {
        self.guard.is_held()
    }

    fn assert_healthy(&self, oracle: &OracleGateway, user: &Pubkey) -> Result<(), DscEngineError> {
        let health_factor = self.health_factor(oracle, user)?;
        if health_factor < self.config.min_health_factor {
            msg!("Health factor of {} broken: {}", user, health_factor);
            return Err(DscEngineError::BreakHealthFactor(health_factor));
        }
        Ok(())
    }
}

fn require_non_zero(amount: u128) -> Result<(), DscEngineError> {
    if amount == 0 {
        return Err(DscEngineError::NeedsMoreThanZero);
    }
    Ok(())
}
