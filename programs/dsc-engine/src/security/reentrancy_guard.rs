//! Reentrancy Guard
//!
//! Every mutating engine entry point runs between `enter` and `exit`. A nested
//! attempt fails immediately instead of queueing.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{account_info::AccountInfo, msg, program_error::ProgramError};

use crate::error::DscEngineError;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    Open = 0,
    /// A mutation is in flight
    Held = 1,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReentrancyGuard {
    pub discriminator: [u8; 8],
    pub lock: Lock,
    /// Mutations started through this guard
    pub entries: u64,
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ReentrancyGuard {
    pub const DISCRIMINATOR: [u8; 8] = [68, 83, 67, 95, 71, 85, 82, 68]; // "DSC_GURD"

    pub const LEN: usize = 8 + 1 + 8;

    pub fn new() -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            lock: Lock::Open,
            entries: 0,
        }
    }

    pub fn enter(&mut self) -> Result<(), DscEngineError> {
        if self.lock == Lock::Held {
            msg!("Engine busy with mutation #{}", self.entries);
            return Err(DscEngineError::ReentrancyDetected);
        }
        self.lock = Lock::Held;
        self.entries = self.entries.saturating_add(1);
        Ok(())
    }

    pub fn exit(&mut self) -> Result<(), DscEngineError> {
        if self.lock == Lock::Open {
            msg!("Guard released without a mutation in flight");
            return Err(DscEngineError::InvalidGuardState);
        }
        self.lock = Lock::Open;
        Ok(())
    }

    pub fn is_held(&self) -> bool {
        self.lock == Lock::Held
    }

    fn check_discriminator(&self) -> Result<(), ProgramError> {
        if self.discriminator == Self::DISCRIMINATOR {
            Ok(())
        } else {
            Err(ProgramError::InvalidAccountData)
        }
    }
}

/// Guard persisted in its own account so a nested program invocation observes
/// the held lock while the outer instruction is still running.
pub struct ReentrancyContext<'a, 'b> {
    account: &'b AccountInfo<'a>,
    guard: ReentrancyGuard,
}

impl<'a, 'b> ReentrancyContext<'a, 'b> {
    /// Take the lock and write it to the guard account
    pub fn enter(account: &'b AccountInfo<'a>) -> Result<Self, ProgramError> {
        let mut guard = ReentrancyGuard::try_from_slice(&account.data.borrow()[..ReentrancyGuard::LEN])?;
        guard.check_discriminator()?;
        guard.enter()?;

        let context = Self { account, guard };
        context.store()?;
        Ok(context)
    }

    /// Release the lock and write it back
    pub fn exit(mut self) -> Result<(), ProgramError> {
        self.guard.exit()?;
        self.store()
    }

    fn store(&self) -> Result<(), ProgramError> {
        let mut data = self.account.data.borrow_mut();
        self.guard.serialize(&mut &mut data[..])?;
        Ok(())
    }
}
