//! Price feed read from accounts passed to the instruction
//!
//! A feed id is the address of its price account. The account must be owned by
//! the configured oracle program and holds a discriminator followed by a borsh
//! `PriceData` record.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{account_info::AccountInfo, msg, pubkey::Pubkey};

use crate::oracle::{PriceData, PriceFeed};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PriceAccount {
    /// Account discriminator
    pub discriminator: [u8; 8],

    pub price: PriceData,
}

impl PriceAccount {
    pub const DISCRIMINATOR: [u8; 8] = [68, 83, 67, 95, 80, 82, 67, 69]; // "DSC_PRCE"

    pub const LEN: usize = 8 + // discriminator
        8 + // price
        4 + // expo
        8; // publish_time

    pub fn new(price: PriceData) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            price,
        }
    }

    pub fn from_account_info(info: &AccountInfo) -> Option<Self> {
        let data = info.try_borrow_data().ok()?;
        let account = Self::deserialize(&mut &data[..]).ok()?;
        if account.discriminator != Self::DISCRIMINATOR {
            msg!("Account {} is not a price account", info.key);
            return None;
        }
        Some(account)
    }
}

/// Looks feeds up among the accounts of the current instruction
pub struct AccountPriceFeed<'a, 'b> {
    accounts: &'b [AccountInfo<'a>],
    oracle_program: &'b Pubkey,
}

impl<'a, 'b> AccountPriceFeed<'a, 'b> {
    pub fn new(accounts: &'b [AccountInfo<'a>], oracle_program: &'b Pubkey) -> Self {
        Self {
            accounts,
            oracle_program,
        }
    }
}

impl<'a, 'b> PriceFeed for AccountPriceFeed<'a, 'b> {
    fn latest_price(&self, feed: &Pubkey) -> Option<PriceData> {
        let info = self.accounts.iter().find(|info| info.key == feed)?;
        if info.owner != self.oracle_program {
            msg!("Price account {} owned by {}, expected {}", feed, info.owner, self.oracle_program);
            return None;
        }
        PriceAccount::from_account_info(info).map(|account| account.price)
    }
}
