use crate::{
    constants::PRECISION,
    error::DscEngineError,
    math::mul_div_chain,
    state::EngineConfig,
};

/// Health factor with 18 decimals:
/// `collateral_value * threshold / liquidation_precision * PRECISION / debt`.
///
/// No debt means unbounded health (`u128::MAX`). A ratio too large for u128
/// saturates to the same value.
pub fn calculate_health_factor(
    config: &EngineConfig,
    debt: u128,
    collateral_value: u128,
) -> Result<u128, DscEngineError> {
    if debt == 0 {
        return Ok(u128::MAX);
    }

    match mul_div_chain(
        &[collateral_value, config.liquidation_threshold as u128, PRECISION],
        &[config.liquidation_precision as u128, debt],
    ) {
        Err(DscEngineError::ArithmeticOverflow) => Ok(u128::MAX),
        other => other,
    }
}
