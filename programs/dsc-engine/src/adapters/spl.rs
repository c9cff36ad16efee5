//! SPL Token program CPI behind the token collaborator traits
//!
//! Token accounts are located among the instruction accounts by mint and
//! owner. Vaults and the stable mint are controlled by the custody PDA, which
//! signs with its seeds. A failed lookup, an amount beyond u64 or a failed CPI
//! is reported as `false`.

use solana_program::{
    account_info::AccountInfo,
    msg,
    program::{invoke, invoke_signed},
    program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::{instruction as token_instruction, state::Account as TokenAccount};

use crate::{
    constants::CUSTODY_SEED,
    token::{StableToken, TokenLedger},
};

/// SPL Token program ID
pub const TOKEN_PROGRAM_ID: Pubkey = spl_token::ID;

pub struct SplTokenGateway<'a, 'b> {
    /// The signing caller; the only owner tokens can be pulled from
    signer: &'b AccountInfo<'a>,
    custody: &'b AccountInfo<'a>,
    custody_bump: u8,
    stable_mint: &'b AccountInfo<'a>,
    token_program: &'b AccountInfo<'a>,
    token_accounts: &'b [AccountInfo<'a>],
}

impl<'a, 'b> SplTokenGateway<'a, 'b> {
    pub fn new(
        signer: &'b AccountInfo<'a>,
        custody: &'b AccountInfo<'a>,
        custody_bump: u8,
        stable_mint: &'b AccountInfo<'a>,
        token_program: &'b AccountInfo<'a>,
        token_accounts: &'b [AccountInfo<'a>],
    ) -> Self {
        Self {
            signer,
            custody,
            custody_bump,
            stable_mint,
            token_program,
            token_accounts,
        }
    }

    /// Token account holding `mint` for `owner`
    fn find_token_account(&self, mint: &Pubkey, owner: &Pubkey) -> Option<&'b AccountInfo<'a>> {
        let found = self.token_accounts.iter().find(|info| {
            if info.owner != &TOKEN_PROGRAM_ID {
                return false;
            }
            let Ok(data) = info.try_borrow_data() else {
                return false;
            };
            TokenAccount::unpack(&data)
                .map(|account| account.mint == *mint && account.owner == *owner)
                .unwrap_or(false)
        });

        if found.is_none() {
            msg!("No token account for mint {} owned by {}", mint, owner);
        }
        found
    }

    fn amount_u64(amount: u128) -> Option<u64> {
        match u64::try_from(amount) {
            Ok(amount) => Some(amount),
            Err(_) => {
                msg!("Amount {} exceeds token precision", amount);
                None
            }
        }
    }

    fn custody_transfer(&self, token: &Pubkey, to: &Pubkey, amount: u64) -> bool {
        let custody_key = *self.custody.key;
        let (Some(source), Some(destination)) = (
            self.find_token_account(token, &custody_key),
            self.find_token_account(token, to),
        ) else {
            return false;
        };

        let Ok(instruction) = token_instruction::transfer(
            &TOKEN_PROGRAM_ID,
            source.key,
            destination.key,
            self.custody.key,
            &[],
            amount,
        ) else {
            return false;
        };

        let bump = [self.custody_bump];
        let signer_seeds: &[&[u8]] = &[CUSTODY_SEED, &bump];
        report(invoke_signed(
            &instruction,
            &[
                source.clone(),
                destination.clone(),
                self.custody.clone(),
                self.token_program.clone(),
            ],
            &[signer_seeds],
        ))
    }
}

fn report(result: solana_program::entrypoint::ProgramResult) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            msg!("Token program call failed: {}", e);
            false
        }
    }
}

impl<'a, 'b> TokenLedger for SplTokenGateway<'a, 'b> {
    fn transfer_from(&mut self, token: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        let Some(amount) = Self::amount_u64(amount) else {
            return false;
        };
        if from != self.signer.key || !self.signer.is_signer {
            msg!("Transfer source {} has not signed", from);
            return false;
        }
        let (Some(source), Some(destination)) =
            (self.find_token_account(token, from), self.find_token_account(token, to))
        else {
            return false;
        };

        let Ok(instruction) = token_instruction::transfer(
            &TOKEN_PROGRAM_ID,
            source.key,
            destination.key,
            from,
            &[],
            amount,
        ) else {
            return false;
        };

        report(invoke(
            &instruction,
            &[
                source.clone(),
                destination.clone(),
                self.signer.clone(),
                self.token_program.clone(),
            ],
        ))
    }

    fn transfer(&mut self, token: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        match Self::amount_u64(amount) {
            Some(amount) => self.custody_transfer(token, to, amount),
            None => false,
        }
    }
}

impl<'a, 'b> StableToken for SplTokenGateway<'a, 'b> {
    fn mint(&mut self, to: &Pubkey, amount: u128) -> bool {
        let Some(amount) = Self::amount_u64(amount) else {
            return false;
        };
        let Some(destination) = self.find_token_account(self.stable_mint.key, to) else {
            return false;
        };

        let Ok(instruction) = token_instruction::mint_to(
            &TOKEN_PROGRAM_ID,
            self.stable_mint.key,
            destination.key,
            self.custody.key,
            &[],
            amount,
        ) else {
            return false;
        };

        let bump = [self.custody_bump];
        let signer_seeds: &[&[u8]] = &[CUSTODY_SEED, &bump];
        report(invoke_signed(
            &instruction,
            &[
                self.stable_mint.clone(),
                destination.clone(),
                self.custody.clone(),
                self.token_program.clone(),
            ],
            &[signer_seeds],
        ))
    }

    fn burn(&mut self, amount: u128) -> bool {
        let Some(amount) = Self::amount_u64(amount) else {
            return false;
        };
        let custody_key = *self.custody.key;
        let Some(vault) = self.find_token_account(self.stable_mint.key, &custody_key) else {
            return false;
        };

        let Ok(instruction) = token_instruction::burn(
            &TOKEN_PROGRAM_ID,
            vault.key,
            self.stable_mint.key,
            self.custody.key,
            &[],
            amount,
        ) else {
            return false;
        };

        let bump = [self.custody_bump];
        let signer_seeds: &[&[u8]] = &[CUSTODY_SEED, &bump];
        report(invoke_signed(
            &instruction,
            &[
                vault.clone(),
                self.stable_mint.clone(),
                self.custody.clone(),
                self.token_program.clone(),
            ],
            &[signer_seeds],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::program_option::COption;
    use spl_token::state::AccountState;

    fn token_account_data(mint: Pubkey, owner: Pubkey, amount: u64) -> Vec<u8> {
        let account = TokenAccount {
            mint,
            owner,
            amount,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(account, &mut data).unwrap();
        data
    }

    #[test]
    fn test_token_accounts_matched_by_mint_and_owner() {
        let (signer_key, custody_key, mint_key, weth) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let (user_vault_key, custody_vault_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let system = solana_program::system_program::id();
        let program_key = crate::id();

        let mut lamports = [0u64; 6];
        let [l0, l1, l2, l3, l4, l5] = &mut lamports;
        let (mut d0, mut d1, mut d2, mut d3) = (vec![], vec![], vec![], vec![]);
        let mut user_data = token_account_data(weth, signer_key, 5);
        let mut custody_data = token_account_data(weth, custody_key, 9);

        let signer = AccountInfo::new(&signer_key, true, true, l0, &mut d0, &system, false, 0);
        let custody = AccountInfo::new(&custody_key, false, false, l1, &mut d1, &program_key, false, 0);
        let mint = AccountInfo::new(&mint_key, false, true, l2, &mut d2, &TOKEN_PROGRAM_ID, false, 0);
        let program = AccountInfo::new(&TOKEN_PROGRAM_ID, false, false, l3, &mut d3, &system, true, 0);
        let token_accounts = vec![
            AccountInfo::new(&user_vault_key, false, true, l4, &mut user_data, &TOKEN_PROGRAM_ID, false, 0),
            AccountInfo::new(&custody_vault_key, false, true, l5, &mut custody_data, &TOKEN_PROGRAM_ID, false, 0),
        ];

        let mut gateway = SplTokenGateway::new(&signer, &custody, 255, &mint, &program, &token_accounts);

        assert_eq!(gateway.find_token_account(&weth, &signer_key).map(|i| *i.key), Some(user_vault_key));
        assert_eq!(gateway.find_token_account(&weth, &custody_key).map(|i| *i.key), Some(custody_vault_key));
        assert!(gateway.find_token_account(&mint_key, &signer_key).is_none());

        // Rejected before any CPI is attempted
        assert!(!gateway.transfer_from(&weth, &custody_key, &signer_key, 1));
        assert!(!gateway.transfer(&weth, &signer_key, u128::from(u64::MAX) + 1));
        assert!(!gateway.mint(&signer_key, 1));
    }
}
