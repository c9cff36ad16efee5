//! Token collaborator interfaces
//!
//! The engine never touches balances itself. Collateral moves through
//! `TokenLedger`, stable units are issued and destroyed through `StableToken`.
//! A `false` return is a hard failure for the enclosing operation.

use std::collections::BTreeMap;

use solana_program::pubkey::Pubkey;

/// Fungible token transfers performed on behalf of the engine
pub trait TokenLedger {
    /// Move `amount` of `token` from `from` to `to`; `from` has authorized the engine
    fn transfer_from(&mut self, token: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool;

    /// Move `amount` of `token` out of engine custody to `to`
    fn transfer(&mut self, token: &Pubkey, to: &Pubkey, amount: u128) -> bool;
}

/// Stable unit issuance, callable only by the engine
pub trait StableToken {
    fn mint(&mut self, to: &Pubkey, amount: u128) -> bool;

    /// Destroy `amount` held in engine custody
    fn burn(&mut self, amount: u128) -> bool;
}

/// Everything settlement calls out to
pub trait TokenGateway: TokenLedger + StableToken {}

impl<T: TokenLedger + StableToken> TokenGateway for T {}

/// Call made against a `TokenGateway`, as recorded by `TokenBook`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    TransferFrom { token: Pubkey, from: Pubkey, to: Pubkey, amount: u128 },
    Transfer { token: Pubkey, to: Pubkey, amount: u128 },
    Mint { to: Pubkey, amount: u128 },
    Burn { amount: u128 },
}

/// In-memory balances for every token, custody and the stable unit included.
/// Used for simulations and tests; individual calls can be made to fail.
#[derive(Debug, Clone)]
pub struct TokenBook {
    custody: Pubkey,
    stable_token: Pubkey,
    balances: BTreeMap<(Pubkey, Pubkey), u128>,
    supply: BTreeMap<Pubkey, u128>,
    calls: Vec<TokenCall>,
    fail_transfer_from: bool,
    fail_transfer: bool,
    fail_mint: bool,
    fail_burn: bool,
}

impl TokenBook {
    pub fn new(custody: Pubkey, stable_token: Pubkey) -> Self {
        Self {
            custody,
            stable_token,
            balances: BTreeMap::new(),
            supply: BTreeMap::new(),
            calls: Vec::new(),
            fail_transfer_from: false,
            fail_transfer: false,
            fail_mint: false,
            fail_burn: false,
        }
    }

    /// Credit `owner` out of thin air (a faucet for collateral tokens)
    pub fn fund(&mut self, token: &Pubkey, owner: &Pubkey, amount: u128) {
        *self.balances.entry((*token, *owner)).or_insert(0) += amount;
        *self.supply.entry(*token).or_insert(0) += amount;
    }

    pub fn balance_of(&self, token: &Pubkey, owner: &Pubkey) -> u128 {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }

    pub fn total_supply(&self, token: &Pubkey) -> u128 {
        self.supply.get(token).copied().unwrap_or(0)
    }

    /// Every call received so far, failed ones included
    pub fn calls(&self) -> &[TokenCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn fail_transfer_from(&mut self, fail: bool) {
        self.fail_transfer_from = fail;
    }

    pub fn fail_transfer(&mut self, fail: bool) {
        self.fail_transfer = fail;
    }

    pub fn fail_mint(&mut self, fail: bool) {
        self.fail_mint = fail;
    }

    pub fn fail_burn(&mut self, fail: bool) {
        self.fail_burn = fail;
    }

    fn move_balance(&mut self, token: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        let held = self.balance_of(token, from);
        let Some(remaining) = held.checked_sub(amount) else {
            return false;
        };
        let Some(received) = self.balance_of(token, to).checked_add(amount) else {
            return false;
        };
        self.balances.insert((*token, *from), remaining);
        self.balances.insert((*token, *to), received);
        true
    }
}

impl TokenLedger for TokenBook {
    fn transfer_from(&mut self, token: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        self.calls.push(TokenCall::TransferFrom {
            token: *token,
            from: *from,
            to: *to,
            amount,
        });
        if self.fail_transfer_from {
            return false;
        }
        self.move_balance(token, from, to, amount)
    }

    fn transfer(&mut self, token: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        self.calls.push(TokenCall::Transfer {
            token: *token,
            to: *to,
            amount,
        });
        if self.fail_transfer {
            return false;
        }
        let custody = self.custody;
        self.move_balance(token, &custody, to, amount)
    }
}

impl StableToken for TokenBook {
    fn mint(&mut self, to: &Pubkey, amount: u128) -> bool {
        self.calls.push(TokenCall::Mint { to: *to, amount });
        if self.fail_mint {
            return false;
        }
        let stable = self.stable_token;
        self.fund(&stable, to, amount);
        true
    }

    fn burn(&mut self, amount: u128) -> bool {
        self.calls.push(TokenCall::Burn { amount });
        if self.fail_burn {
            return false;
        }
        let (stable, custody) = (self.stable_token, self.custody);
        let held = self.balance_of(&stable, &custody);
        let Some(remaining) = held.checked_sub(amount) else {
            return false;
        };
        self.balances.insert((stable, custody), remaining);
        *self.supply.entry(stable).or_insert(0) -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_requires_balance() {
        let (custody, stable, token, user) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let mut book = TokenBook::new(custody, stable);
        book.fund(&token, &user, 10);

        assert!(!book.transfer_from(&token, &user, &custody, 11));
        assert!(book.transfer_from(&token, &user, &custody, 10));
        assert_eq!(book.balance_of(&token, &custody), 10);
        assert!(book.transfer(&token, &user, 4));
        assert_eq!(book.balance_of(&token, &user), 4);
        assert_eq!(book.calls().len(), 3);
    }

    #[test]
    fn test_mint_and_burn_track_supply() {
        let (custody, stable, user) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let mut book = TokenBook::new(custody, stable);

        assert!(book.mint(&user, 100));
        assert_eq!(book.total_supply(&stable), 100);
        assert!(!book.burn(1)); // nothing in custody yet

        assert!(book.transfer_from(&stable, &user, &custody, 40));
        assert!(book.burn(40));
        assert_eq!(book.total_supply(&stable), 60);
    }

    #[test]
    fn test_failure_switches() {
        let (custody, stable, user) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let mut book = TokenBook::new(custody, stable);
        book.fail_mint(true);
        assert!(!book.mint(&user, 1));
        assert_eq!(book.total_supply(&stable), 0);
        assert_eq!(book.calls(), &[TokenCall::Mint { to: user, amount: 1 }]);
    }
}
