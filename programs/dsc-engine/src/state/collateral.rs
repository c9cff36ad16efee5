use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{constants::MAX_COLLATERAL_TYPES, error::DscEngineError};

/// Registered collateral asset and its USD price source
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollateralType {
    pub token: Pubkey,
    pub price_feed: Pubkey,
}

/// Ordered, construction-time-only list of collateral types
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollateralRegistry {
    types: Vec<CollateralType>,
}

impl CollateralRegistry {
    pub const LEN: usize = 4 + MAX_COLLATERAL_TYPES * (32 + 32);

    /// Pair tokens with feeds in order. There is no way to add or remove an
    /// entry afterwards.
    pub fn new(tokens: &[Pubkey], price_feeds: &[Pubkey]) -> Result<Self, DscEngineError> {
        if tokens.len() != price_feeds.len() {
            return Err(DscEngineError::CollateralListLengthMismatch);
        }
        if tokens.len() > MAX_COLLATERAL_TYPES {
            return Err(DscEngineError::TooManyCollateralTypes);
        }

        let mut types: Vec<CollateralType> = Vec::with_capacity(tokens.len());
        for (token, price_feed) in tokens.iter().zip(price_feeds) {
            if types.iter().any(|t| t.token == *token) {
                return Err(DscEngineError::DuplicateCollateral);
            }
            types.push(CollateralType {
                token: *token,
                price_feed: *price_feed,
            });
        }

        Ok(Self { types })
    }

    pub fn price_feed_of(&self, token: &Pubkey) -> Result<Pubkey, DscEngineError> {
        self.types
            .iter()
            .find(|t| t.token == *token)
            .map(|t| t.price_feed)
            .ok_or(DscEngineError::TokenNotAllowed)
    }

    pub fn is_registered(&self, token: &Pubkey) -> bool {
        self.types.iter().any(|t| t.token == *token)
    }

    pub fn tokens(&self) -> Vec<Pubkey> {
        self.types.iter().map(|t| t.token).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollateralType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
