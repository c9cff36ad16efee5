//! Liquidation of under-collateralized positions
//!
//! The liquidator repays part or all of a debtor's debt with their own stable
//! units and receives the equivalent collateral plus a bonus. The debtor's
//! health must strictly improve and the liquidator must stay healthy.

use solana_program::{msg, pubkey::Pubkey};

use super::{require_non_zero, DscEngine, Operation};
use crate::{
    error::DscEngineError,
    events::{EngineEvent, PositionLiquidated},
    math::{checked_add, mul_div},
    oracle::OracleGateway,
    token::TokenGateway,
};

impl DscEngine {
    /// Cover `debt_to_cover` of `debtor`'s debt and seize `collateral_token`.
    /// The amount is never capped to what the debtor can pay out.
    pub fn liquidate(
        &mut self,
        oracle: &OracleGateway,
        gateway: &mut dyn TokenGateway,
        liquidator: &Pubkey,
        collateral_token: &Pubkey,
        debtor: &Pubkey,
        debt_to_cover: u128,
    ) -> Result<(), DscEngineError> {
        self.atomically(gateway, |engine, op| {
            engine.liquidate_position(oracle, op, liquidator, collateral_token, debtor, debt_to_cover)
        })
    }

    /// Collateral owed for covering `debt_to_cover`: `(collateral, bonus)`
    pub fn liquidation_payout(
        &self,
        oracle: &OracleGateway,
        collateral_token: &Pubkey,
        debt_to_cover: u128,
    ) -> Result<(u128, u128), DscEngineError> {
        let collateral = self.token_amount_from_usd(oracle, collateral_token, debt_to_cover)?;
        let bonus = mul_div(
            collateral,
            self.config.liquidation_bonus as u128,
            self.config.liquidation_precision as u128,
        )?;
        Ok((collateral, bonus))
    }

    fn liquidate_position(
        &mut self,
        oracle: &OracleGateway,
        op: &mut Operation,
        liquidator: &Pubkey,
        collateral_token: &Pubkey,
        debtor: &Pubkey,
        debt_to_cover: u128,
    ) -> Result<(), DscEngineError> {
        require_non_zero(debt_to_cover)?;

        let starting_health = self.health_factor(oracle, debtor)?;
        if starting_health >= self.config.min_health_factor {
            msg!("Position {} is healthy: {}", debtor, starting_health);
            return Err(DscEngineError::LiquidateHealthFactorOk(starting_health));
        }

        let (collateral, bonus) = self.liquidation_payout(oracle, collateral_token, debt_to_cover)?;
        let payout = checked_add(collateral, bonus)?;
        if payout == 0 {
            msg!("Covering {} buys no collateral of {}", debt_to_cover, collateral_token);
            return Err(DscEngineError::PayoutTooSmall);
        }

        self.redeem(op, debtor, liquidator, collateral_token, payout)?;
        self.burn(op, debtor, liquidator, debt_to_cover)?;

        let ending_health = self.health_factor(oracle, debtor)?;
        if ending_health <= starting_health {
            msg!(
                "Health of {} not improved: {} -> {}",
                debtor,
                starting_health,
                ending_health
            );
            return Err(DscEngineError::HealthFactorNotImproved);
        }

        self.assert_healthy(oracle, liquidator)?;

        op.events.push(EngineEvent::PositionLiquidated(PositionLiquidated {
            debtor: *debtor,
            liquidator: *liquidator,
            token: *collateral_token,
            debt_covered: debt_to_cover,
            collateral_paid: payout,
        }));

        msg!(
            "Liquidated {}: covered {}, paid {} (bonus {})",
            debtor,
            debt_to_cover,
            payout,
            bonus
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        constants::{MAX_PRICE_AGE_SECONDS, PRECISION},
        engine::test_utils::{Harness, NOW},
        error::DscEngineError,
        oracle::OracleGateway,
    };

    #[test]
    fn test_healthy_position_cannot_be_liquidated() {
        let mut h = Harness::new(2_000);
        let (debtor, liquidator) = (h.user(1), h.user(1));
        let oracle = OracleGateway::new(&h.feeds, NOW, MAX_PRICE_AGE_SECONDS);

        h.engine
            .deposit_collateral_and_mint_dsc(&oracle, &mut h.book, &debtor, &h.weth, PRECISION, 100 * PRECISION)
            .unwrap();

        assert_eq!(
            h.engine.liquidate(&oracle, &mut h.book, &liquidator, &h.weth, &debtor, 10 * PRECISION),
            Err(DscEngineError::LiquidateHealthFactorOk(10 * PRECISION))
        );
        assert_eq!(
            h.engine.liquidate(&oracle, &mut h.book, &liquidator, &h.weth, &debtor, 0),
            Err(DscEngineError::NeedsMoreThanZero)
        );
    }

    #[test]
    fn test_payout_includes_bonus() {
        let h = Harness::new(180);
        let oracle = OracleGateway::new(&h.feeds, NOW, MAX_PRICE_AGE_SECONDS);

        let (collateral, bonus) = h.engine.liquidation_payout(&oracle, &h.weth, 100 * PRECISION).unwrap();
        assert_eq!(collateral, 555_555_555_555_555_555);
        assert_eq!(bonus, 55_555_555_555_555_555);
    }

    #[test]
    fn test_debtor_without_enough_collateral() {
        let mut h = Harness::new(2_000);
        let (debtor, liquidator) = (h.user(1), h.user(20));
        {
            let oracle = OracleGateway::new(&h.feeds, NOW, MAX_PRICE_AGE_SECONDS);
            h.engine
                .deposit_collateral_and_mint_dsc(&oracle, &mut h.book, &debtor, &h.weth, PRECISION, 100 * PRECISION)
                .unwrap();
            h.engine
                .deposit_collateral_and_mint_dsc(&oracle, &mut h.book, &liquidator, &h.weth, 20 * PRECISION, 100 * PRECISION)
                .unwrap();
        }

        // at 100 USD the debtor's single unit no longer covers 100 units plus bonus
        h.set_price(100);
        let oracle = OracleGateway::new(&h.feeds, NOW, MAX_PRICE_AGE_SECONDS);
        assert_eq!(
            h.engine.liquidate(&oracle, &mut h.book, &liquidator, &h.weth, &debtor, 100 * PRECISION),
            Err(DscEngineError::InsufficientCollateral)
        );
        assert_eq!(h.engine.debt_of(&debtor), 100 * PRECISION);
        assert_eq!(h.engine.collateral_balance_of(&debtor, &h.weth), PRECISION);
    }

    #[test]
    fn test_dust_cover_buys_nothing() {
        let mut h = Harness::new(2_000);
        let (debtor, liquidator) = (h.user(1), h.user(1));
        {
            let oracle = OracleGateway::new(&h.feeds, NOW, MAX_PRICE_AGE_SECONDS);
            h.engine
                .deposit_collateral_and_mint_dsc(&oracle, &mut h.book, &debtor, &h.weth, PRECISION, 1_000 * PRECISION)
                .unwrap();
        }
        h.set_price(1_800);
        let oracle = OracleGateway::new(&h.feeds, NOW, MAX_PRICE_AGE_SECONDS);

        assert_eq!(
            h.engine.liquidate(&oracle, &mut h.book, &liquidator, &h.weth, &debtor, 1),
            Err(DscEngineError::PayoutTooSmall)
        );
        assert_eq!(h.engine.debt_of(&debtor), 1_000 * PRECISION);
    }
}
