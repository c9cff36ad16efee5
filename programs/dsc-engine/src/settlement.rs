//! Settlement journal
//!
//! An operation queues its token interactions while it mutates the ledger and
//! runs its checks. They are executed only after every check passed, custody
//! payouts first, then pulls, mints and burns. When one of them fails, the ones
//! already executed are compensated in reverse order. A compensation that fails
//! too leaves the collaborators out of step with the ledger; it is reported as
//! `CompensationFailed` together with the stranded interactions.

use solana_program::{msg, pubkey::Pubkey};

use crate::{error::DscEngineError, token::TokenGateway};

/// One external call made during settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Pull tokens from `from` into custody
    Pull { token: Pubkey, from: Pubkey, amount: u128 },
    /// Pay tokens out of custody to `to`
    Push { token: Pubkey, to: Pubkey, amount: u128 },
    /// Issue stable units to `to`
    Mint { to: Pubkey, amount: u128 },
    /// Destroy stable units held in custody
    Burn { amount: u128 },
}

impl Interaction {
    fn failure(&self) -> DscEngineError {
        match self {
            Self::Pull { .. } | Self::Push { .. } => DscEngineError::TransferFailed,
            Self::Mint { .. } => DscEngineError::MintFailed,
            Self::Burn { .. } => DscEngineError::BurnFailed,
        }
    }

    /// Execution rank. A burn is last since only a fresh mint can undo it.
    fn stage(&self) -> u8 {
        match self {
            Self::Push { .. } => 0,
            Self::Pull { .. } => 1,
            Self::Mint { .. } => 2,
            Self::Burn { .. } => 3,
        }
    }
}

/// Why a settlement did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementFailure {
    pub error: DscEngineError,
    /// Executed interactions whose compensation failed, newest first
    pub stranded: Vec<Interaction>,
}

#[derive(Debug, Clone)]
pub struct Settlement {
    custody: Pubkey,
    stable_token: Pubkey,
    pending: Vec<Interaction>,
}

impl Settlement {
    pub fn new(custody: Pubkey, stable_token: Pubkey) -> Self {
        Self {
            custody,
            stable_token,
            pending: Vec::new(),
        }
    }

    pub fn pull(&mut self, token: Pubkey, from: Pubkey, amount: u128) {
        self.pending.push(Interaction::Pull { token, from, amount });
    }

    pub fn push(&mut self, token: Pubkey, to: Pubkey, amount: u128) {
        self.pending.push(Interaction::Push { token, to, amount });
    }

    pub fn mint(&mut self, to: Pubkey, amount: u128) {
        self.pending.push(Interaction::Mint { to, amount });
    }

    pub fn burn(&mut self, amount: u128) {
        self.pending.push(Interaction::Burn { amount });
    }

    /// Run every queued interaction, or none of them
    pub fn execute(mut self, gateway: &mut dyn TokenGateway) -> Result<(), SettlementFailure> {
        self.pending.sort_by_key(Interaction::stage);
        let mut done: Vec<Interaction> = Vec::with_capacity(self.pending.len());

        for interaction in &self.pending {
            if self.apply(gateway, interaction) {
                done.push(*interaction);
                continue;
            }

            msg!("Settlement failed at {:?}, compensating {} calls", interaction, done.len());
            let stranded: Vec<Interaction> = done
                .iter()
                .rev()
                .filter(|executed| !self.compensate(gateway, executed))
                .copied()
                .collect();

            if stranded.is_empty() {
                return Err(SettlementFailure {
                    error: interaction.failure(),
                    stranded,
                });
            }
            for executed in &stranded {
                msg!("Compensation failed for {:?}", executed);
            }
            return Err(SettlementFailure {
                error: DscEngineError::CompensationFailed,
                stranded,
            });
        }

        Ok(())
    }

    fn apply(&self, gateway: &mut dyn TokenGateway, interaction: &Interaction) -> bool {
        match *interaction {
            Interaction::Pull { token, from, amount } => {
                gateway.transfer_from(&token, &from, &self.custody, amount)
            }
            Interaction::Push { token, to, amount } => gateway.transfer(&token, &to, amount),
            Interaction::Mint { to, amount } => gateway.mint(&to, amount),
            Interaction::Burn { amount } => gateway.burn(amount),
        }
    }

    fn compensate(&self, gateway: &mut dyn TokenGateway, interaction: &Interaction) -> bool {
        match *interaction {
            Interaction::Pull { token, from, amount } => gateway.transfer(&token, &from, amount),
            Interaction::Push { token, to, amount } => {
                gateway.transfer_from(&token, &to, &self.custody, amount)
            }
            Interaction::Mint { to, amount } => {
                gateway.transfer_from(&self.stable_token, &to, &self.custody, amount)
                    && gateway.burn(amount)
            }
            Interaction::Burn { amount } => gateway.mint(&self.custody, amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{StableToken, TokenBook, TokenCall};

    struct Fixture {
        book: TokenBook,
        custody: Pubkey,
        stable: Pubkey,
        token: Pubkey,
        user: Pubkey,
    }

    fn fixture() -> Fixture {
        let (custody, stable, token, user) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let mut book = TokenBook::new(custody, stable);
        book.fund(&token, &user, 1_000);
        Fixture { book, custody, stable, token, user }
    }

    #[test]
    fn test_executes_in_order() {
        let mut f = fixture();
        let mut settlement = Settlement::new(f.custody, f.stable);
        settlement.pull(f.token, f.user, 300);
        settlement.mint(f.user, 50);

        settlement.execute(&mut f.book).unwrap();
        assert_eq!(f.book.balance_of(&f.token, &f.custody), 300);
        assert_eq!(f.book.balance_of(&f.stable, &f.user), 50);
        assert_eq!(
            f.book.calls(),
            &[
                TokenCall::TransferFrom { token: f.token, from: f.user, to: f.custody, amount: 300 },
                TokenCall::Mint { to: f.user, amount: 50 },
            ]
        );
    }

    #[test]
    fn test_payouts_run_before_pulls_and_burns() {
        let mut f = fixture();
        assert!(f.book.mint(&f.user, 80));
        f.book.fund(&f.token, &f.custody, 500);
        f.book.clear_calls();

        let mut settlement = Settlement::new(f.custody, f.stable);
        settlement.pull(f.stable, f.user, 80);
        settlement.burn(80);
        settlement.push(f.token, f.user, 200);

        settlement.execute(&mut f.book).unwrap();
        assert_eq!(
            f.book.calls(),
            &[
                TokenCall::Transfer { token: f.token, to: f.user, amount: 200 },
                TokenCall::TransferFrom { token: f.stable, from: f.user, to: f.custody, amount: 80 },
                TokenCall::Burn { amount: 80 },
            ]
        );
        assert_eq!(f.book.total_supply(&f.stable), 0);
    }

    #[test]
    fn test_failed_mint_returns_pulled_collateral() {
        let mut f = fixture();
        f.book.fail_mint(true);

        let mut settlement = Settlement::new(f.custody, f.stable);
        settlement.pull(f.token, f.user, 300);
        settlement.mint(f.user, 50);

        let failure = settlement.execute(&mut f.book).unwrap_err();
        assert_eq!(failure.error, DscEngineError::MintFailed);
        assert!(failure.stranded.is_empty());
        assert_eq!(f.book.balance_of(&f.token, &f.user), 1_000);
        assert_eq!(f.book.balance_of(&f.token, &f.custody), 0);
    }

    #[test]
    fn test_failed_push_touches_nothing_else() {
        let mut f = fixture();
        assert!(f.book.mint(&f.user, 80));
        f.book.fund(&f.token, &f.custody, 500);
        f.book.fail_transfer(true);
        f.book.clear_calls();

        let mut settlement = Settlement::new(f.custody, f.stable);
        settlement.pull(f.stable, f.user, 80);
        settlement.burn(80);
        settlement.push(f.token, f.user, 200);

        let failure = settlement.execute(&mut f.book).unwrap_err();
        assert_eq!(failure.error, DscEngineError::TransferFailed);
        assert!(failure.stranded.is_empty());
        assert_eq!(f.book.calls().len(), 1);
        assert_eq!(f.book.balance_of(&f.stable, &f.user), 80);
        assert_eq!(f.book.total_supply(&f.stable), 80);
        assert_eq!(f.book.balance_of(&f.token, &f.custody), 500);
    }

    #[test]
    fn test_failed_compensation_is_not_a_clean_rollback() {
        let mut f = fixture();
        f.book.fail_mint(true);
        f.book.fail_transfer(true);

        let mut settlement = Settlement::new(f.custody, f.stable);
        settlement.pull(f.token, f.user, 300);
        settlement.mint(f.user, 50);

        let failure = settlement.execute(&mut f.book).unwrap_err();
        assert_eq!(failure.error, DscEngineError::CompensationFailed);
        assert_eq!(
            failure.stranded,
            vec![Interaction::Pull { token: f.token, from: f.user, amount: 300 }]
        );
        assert_eq!(f.book.balance_of(&f.token, &f.custody), 300);
    }
}
