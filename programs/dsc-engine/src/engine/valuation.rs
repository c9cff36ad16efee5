//! Token amount <-> USD value, both directions rounded down

use solana_program::pubkey::Pubkey;

use crate::{
    constants::PRECISION,
    error::DscEngineError,
    math::mul_div,
    oracle::OracleGateway,
    state::CollateralRegistry,
};

fn price_of(
    oracle: &OracleGateway,
    registry: &CollateralRegistry,
    token: &Pubkey,
) -> Result<u128, DscEngineError> {
    let feed = registry.price_feed_of(token)?;
    oracle.price_e18(&feed)
}

/// `price * amount / PRECISION`
pub fn usd_value(
    oracle: &OracleGateway,
    registry: &CollateralRegistry,
    token: &Pubkey,
    amount: u128,
) -> Result<u128, DscEngineError> {
    let price = price_of(oracle, registry, token)?;
    mul_div(price, amount, PRECISION)
}

/// `usd_amount * PRECISION / price`
pub fn token_amount_from_usd(
    oracle: &OracleGateway,
    registry: &CollateralRegistry,
    token: &Pubkey,
    usd_amount: u128,
) -> Result<u128, DscEngineError> {
    let price = price_of(oracle, registry, token)?;
    mul_div(usd_amount, PRECISION, price)
}
