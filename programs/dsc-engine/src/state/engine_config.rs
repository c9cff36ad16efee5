use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    constants::{
        LIQUIDATION_BONUS, LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MAX_PRICE_AGE_SECONDS,
        MIN_HEALTH_FACTOR,
    },
    error::DscEngineError,
};

/// Risk parameters, fixed when the engine is initialized
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Share of collateral value that counts toward solvency,
    /// in units of `liquidation_precision` (default: 50 = 50%)
    pub liquidation_threshold: u64,

    /// Extra collateral paid to liquidators,
    /// in units of `liquidation_precision` (default: 10 = 10%)
    pub liquidation_bonus: u64,

    /// Denominator of threshold and bonus (default: 100)
    pub liquidation_precision: u64,

    /// Lowest health factor a position with debt may end a call with
    /// Stored as fixed point with 18 decimals (default: 1e18 = 1.0)
    pub min_health_factor: u128,

    /// Oracle answers older than this many seconds are rejected (default: 3 hours)
    pub max_price_age: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            liquidation_threshold: LIQUIDATION_THRESHOLD,
            liquidation_bonus: LIQUIDATION_BONUS,
            liquidation_precision: LIQUIDATION_PRECISION,
            min_health_factor: MIN_HEALTH_FACTOR,
            max_price_age: MAX_PRICE_AGE_SECONDS,
        }
    }
}

impl EngineConfig {
    pub const LEN: usize = 8 + // liquidation_threshold
        8 + // liquidation_bonus
        8 + // liquidation_precision
        16 + // min_health_factor
        8; // max_price_age

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DscEngineError> {
        if self.liquidation_precision == 0 {
            return Err(DscEngineError::InvalidConfig);
        }

        // Threshold above 100% would let debt exceed collateral value
        if self.liquidation_threshold == 0 || self.liquidation_threshold > self.liquidation_precision {
            return Err(DscEngineError::InvalidConfig);
        }

        if self.liquidation_bonus > self.liquidation_precision {
            return Err(DscEngineError::InvalidConfig);
        }

        if self.min_health_factor == 0 || self.max_price_age <= 0 {
            return Err(DscEngineError::InvalidConfig);
        }

        Ok(())
    }
}
