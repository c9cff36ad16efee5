//! Fixed-point and protocol constants

/// Fixed point precision for USD values, amounts and health factors (18 decimals)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Decimals every price is normalized to before valuation
pub const PRICE_DECIMALS: u32 = 18;

/// Decimals of the canonical USD price feed
pub const FEED_DECIMALS: u32 = 8;

/// Normalizes an 8-decimal feed price to 18 decimals
pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000;

/// 50% threshold: collateral counts for half its value, i.e. 200% collateralization
pub const LIQUIDATION_THRESHOLD: u64 = 50;

/// 10% collateral bonus paid to liquidators
pub const LIQUIDATION_BONUS: u64 = 10;

pub const LIQUIDATION_PRECISION: u64 = 100;

/// 1.0 with 18 decimals
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

/// Oracle answers older than this are rejected (3 hours)
pub const MAX_PRICE_AGE_SECONDS: i64 = 3 * 60 * 60;

/// Upper bound on registered collateral types, keeps the state account bounded
pub const MAX_COLLATERAL_TYPES: usize = 8;

/// Seed of the custody authority PDA that owns every vault token account
pub const CUSTODY_SEED: &[u8] = b"dsc_custody";

/// Seed of the engine state account
pub const ENGINE_STATE_SEED: &[u8] = b"dsc_engine_state";

/// Seed of the reentrancy guard account
pub const GUARD_SEED: &[u8] = b"dsc_guard";

/// Seed of a user's position account, followed by the owner key
pub const POSITION_SEED: &[u8] = b"dsc_position";
