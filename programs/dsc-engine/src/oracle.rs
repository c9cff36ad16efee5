//! Price oracle gateway
//!
//! Wraps one external USD price source per collateral type. Prices are
//! Pyth-style `(price, expo, publish_time)` records; the gateway rejects stale,
//! non-positive and out-of-range answers before anything is valued with them.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    constants::{FEED_DECIMALS, PRICE_DECIMALS},
    error::DscEngineError,
    math::{mul_div_chain, pow10},
};

/// Raw answer of a price source
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceData {
    /// USD price scaled by 10^-expo
    pub price: i64,

    /// Decimal exponent, e.g. -8 for the canonical feed
    pub expo: i32,

    /// Unix timestamp the price was published at
    pub publish_time: UnixTimestamp,
}

impl PriceData {
    /// Price with the canonical 8 decimals
    pub fn usd_e8(price: i64, publish_time: UnixTimestamp) -> Self {
        Self {
            price,
            expo: -(FEED_DECIMALS as i32),
            publish_time,
        }
    }
}

/// External price source, keyed by price feed id
pub trait PriceFeed {
    fn latest_price(&self, feed: &Pubkey) -> Option<PriceData>;
}

impl PriceFeed for BTreeMap<Pubkey, PriceData> {
    fn latest_price(&self, feed: &Pubkey) -> Option<PriceData> {
        self.get(feed).copied()
    }
}

/// Freshness-checked view over a price source at a fixed point in time
#[derive(Clone, Copy)]
pub struct OracleGateway<'a> {
    feed: &'a dyn PriceFeed,
    now: UnixTimestamp,
    max_age: i64,
}

impl<'a> OracleGateway<'a> {
    pub fn new(feed: &'a dyn PriceFeed, now: UnixTimestamp, max_age: i64) -> Self {
        Self { feed, now, max_age }
    }

    /// Validated USD price normalized to 18 decimals
    pub fn price_e18(&self, feed: &Pubkey) -> Result<u128, DscEngineError> {
        let data = self
            .feed
            .latest_price(feed)
            .ok_or(DscEngineError::PriceFeedUnavailable)?;

        // Publish times ahead of the clock count as fresh
        let age = self.now.saturating_sub(data.publish_time);
        if age > self.max_age {
            msg!("Price feed {} stale: {} seconds old", feed, age);
            return Err(DscEngineError::StalePrice);
        }

        normalize_price(&data)
    }
}

/// Scale a positive price to 18 decimals. For the 8-decimal feed this is the
/// `ADDITIONAL_FEED_PRECISION` factor.
pub fn normalize_price(data: &PriceData) -> Result<u128, DscEngineError> {
    if data.price <= 0 {
        msg!("Invalid oracle price: {}", data.price);
        return Err(DscEngineError::InvalidPrice);
    }
    if data.expo > 0 || data.expo < -(PRICE_DECIMALS as i32) {
        msg!("Unsupported price exponent: {}", data.expo);
        return Err(DscEngineError::InvalidPrice);
    }

    let scale = pow10((PRICE_DECIMALS as i32 + data.expo) as u32)?;
    mul_div_chain(&[data.price as u128, scale], &[1])
}
