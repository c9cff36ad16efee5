//! Event logging
//!
//! Events are emitted only after an operation committed. Each one is logged as
//! a marker line, its type and the bs58 borsh payload.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    CollateralDeposited = 1,
    CollateralRedeemed = 2,
    PositionLiquidated = 3,
}

/// Base event trait
pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    fn emit(&self) {
        msg!("DSC_ENGINE_EVENT");
        msg!("TYPE:{:?}", Self::event_type());

        if let Ok(data) = self.try_to_vec() {
            msg!("DATA:{}", bs58::encode(&data).into_string());
        }
    }
}

/// Macro for easy event definition
#[macro_export]
macro_rules! define_event {
    ($name:ident { $($field:ident: $type:ty),* $(,)? }) => {
        #[derive(::borsh::BorshSerialize, ::borsh::BorshDeserialize, Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $type,)*
        }

        impl $crate::events::Event for $name {
            fn event_type() -> $crate::events::EventType {
                $crate::events::EventType::$name
            }
        }
    };
}

define_event!(CollateralDeposited {
    user: Pubkey,
    token: Pubkey,
    amount: u128,
});

define_event!(CollateralRedeemed {
    from: Pubkey,
    to: Pubkey,
    token: Pubkey,
    amount: u128,
});

define_event!(PositionLiquidated {
    debtor: Pubkey,
    liquidator: Pubkey,
    token: Pubkey,
    debt_covered: u128,
    collateral_paid: u128,
});

/// Any engine event, as recorded in the engine's event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CollateralDeposited(CollateralDeposited),
    CollateralRedeemed(CollateralRedeemed),
    PositionLiquidated(PositionLiquidated),
}

impl EngineEvent {
    pub fn emit(&self) {
        match self {
            Self::CollateralDeposited(e) => e.emit(),
            Self::CollateralRedeemed(e) => e.emit(),
            Self::PositionLiquidated(e) => e.emit(),
        }
    }
}
