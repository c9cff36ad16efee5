//! Checked fixed-point arithmetic
//!
//! Every product is formed in 256 bits and checked before the single division
//! at the end, so intermediate precision is never lost and nothing wraps.

use uint::construct_uint;

use crate::error::DscEngineError;

construct_uint! {
    /// 256-bit unsigned integer for intermediate products
    pub struct U256(4);
}

/// Narrow a 256-bit value back to u128, failing instead of truncating
pub fn to_u128(value: U256) -> Result<u128, DscEngineError> {
    if value.bits() > 128 {
        return Err(DscEngineError::ArithmeticOverflow);
    }
    Ok(value.low_u128())
}

fn checked_product(factors: &[u128]) -> Result<U256, DscEngineError> {
    factors.iter().try_fold(U256::one(), |acc, &f| {
        acc.checked_mul(U256::from(f))
            .ok_or(DscEngineError::ArithmeticOverflow)
    })
}

/// `(n0 * n1 * ..) / (d0 * d1 * ..)`, rounded down.
/// Both products are taken in 256 bits; the division happens exactly once.
pub fn mul_div_chain(numerators: &[u128], denominators: &[u128]) -> Result<u128, DscEngineError> {
    let denominator = checked_product(denominators)?;
    if denominator.is_zero() {
        return Err(DscEngineError::DivisionByZero);
    }
    let numerator = checked_product(numerators)?;
    to_u128(numerator / denominator)
}

/// `a * b / c`, rounded down
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, DscEngineError> {
    mul_div_chain(&[a, b], &[c])
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, DscEngineError> {
    a.checked_add(b).ok_or(DscEngineError::ArithmeticOverflow)
}

/// 10^exp as u128 (exp <= 38)
pub fn pow10(exp: u32) -> Result<u128, DscEngineError> {
    10u128.checked_pow(exp).ok_or(DscEngineError::ArithmeticOverflow)
}
