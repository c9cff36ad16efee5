use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use super::{CollateralRegistry, EngineConfig, LedgerTotals, UserPosition};

/// Singleton engine account
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct EngineState {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// Risk parameters
    pub config: EngineConfig,

    /// Registered collateral types
    pub collateral: CollateralRegistry,

    /// Mint of the stable unit
    pub stable_token: Pubkey,

    /// PDA that owns the vaults and is the stable mint authority
    pub custody: Pubkey,

    pub custody_bump: u8,

    /// Program that owns every accepted price account
    pub oracle_program: Pubkey,

    /// Sums over every position
    pub totals: LedgerTotals,
}

impl EngineState {
    pub const DISCRIMINATOR: [u8; 8] = [68, 83, 67, 95, 69, 78, 71, 78]; // "DSC_ENGN"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        EngineConfig::LEN +
        CollateralRegistry::LEN +
        32 + // stable_token
        32 + // custody
        1 + // custody_bump
        32 + // oracle_program
        LedgerTotals::LEN +
        64; // padding

    pub fn new(
        config: EngineConfig,
        collateral: CollateralRegistry,
        stable_token: Pubkey,
        custody: Pubkey,
        custody_bump: u8,
        oracle_program: Pubkey,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            config,
            collateral,
            stable_token,
            custody,
            custody_bump,
            oracle_program,
            totals: LedgerTotals::default(),
        }
    }

    /// Check discriminator and initialization
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(())
    }
}

/// Per-user position account
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct PositionAccount {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// Position owner
    pub owner: Pubkey,

    pub position: UserPosition,
}

impl PositionAccount {
    pub const DISCRIMINATOR: [u8; 8] = [68, 83, 67, 95, 80, 79, 83, 78]; // "DSC_POSN"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // owner
        UserPosition::LEN +
        32; // padding

    pub fn new(owner: Pubkey) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            owner,
            position: UserPosition::default(),
        }
    }

    pub fn validate(&self, owner: &Pubkey) -> Result<(), ProgramError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        if self.owner != *owner {
            return Err(ProgramError::IllegalOwner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_COLLATERAL_TYPES;

    #[test]
    fn test_full_state_fits_len() {
        let tokens: Vec<Pubkey> = (0..MAX_COLLATERAL_TYPES).map(|_| Pubkey::new_unique()).collect();
        let feeds: Vec<Pubkey> = (0..MAX_COLLATERAL_TYPES).map(|_| Pubkey::new_unique()).collect();
        let registry = CollateralRegistry::new(&tokens, &feeds).unwrap();

        let mut state = EngineState::new(
            EngineConfig::default(),
            registry,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            255,
            Pubkey::new_unique(),
        );
        state.totals.total_debt = u128::MAX;
        for token in &tokens {
            state.totals.total_collateral.insert(*token, u128::MAX);
        }

        assert!(state.try_to_vec().unwrap().len() <= EngineState::LEN);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_position_account_owner_check() {
        let owner = Pubkey::new_unique();
        let account = PositionAccount::new(owner);
        assert!(account.validate(&owner).is_ok());
        assert_eq!(
            account.validate(&Pubkey::new_unique()),
            Err(ProgramError::IllegalOwner)
        );
        assert!(account.try_to_vec().unwrap().len() <= PositionAccount::LEN);
    }
}
