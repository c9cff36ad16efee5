use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Engine failures. Health factor variants carry the offending ratio so callers
/// can see how far off the position is.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum DscEngineError {
    #[error("Amount must be more than zero")]
    NeedsMoreThanZero,

    #[error("Collateral token and price feed lists differ in length")]
    CollateralListLengthMismatch,

    #[error("Token is not registered as collateral")]
    TokenNotAllowed,

    #[error("Collateral token registered twice")]
    DuplicateCollateral,

    #[error("Too many collateral types")]
    TooManyCollateralTypes,

    #[error("Token transfer failed")]
    TransferFailed,

    #[error("Stable unit mint failed")]
    MintFailed,

    #[error("Stable unit burn failed")]
    BurnFailed,

    #[error("Rollback incomplete: token state no longer matches the ledger")]
    CompensationFailed,

    #[error("Health factor broken: {0}")]
    BreakHealthFactor(u128),

    #[error("Health factor ok, position cannot be liquidated: {0}")]
    LiquidateHealthFactorOk(u128),

    #[error("Health factor not improved by liquidation")]
    HealthFactorNotImproved,

    #[error("Insufficient deposited collateral")]
    InsufficientCollateral,

    #[error("Burn amount exceeds minted debt")]
    InsufficientDebt,

    #[error("Debt to cover is worth no collateral")]
    PayoutTooSmall,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Price data stale")]
    StalePrice,

    #[error("Invalid oracle price")]
    InvalidPrice,

    #[error("Price feed unavailable")]
    PriceFeedUnavailable,

    #[error("Reentrancy detected")]
    ReentrancyDetected,

    #[error("Invalid guard state")]
    InvalidGuardState,

    #[error("Invalid engine configuration")]
    InvalidConfig,

    #[error("Account does not match its derived address")]
    InvalidAccountAddress,

    #[error("Account not initialized")]
    AccountNotInitialized,

    #[error("Account already initialized")]
    AccountAlreadyInitialized,

    #[error("Invalid custody account")]
    InvalidCustody,
}

/// Stable numeric codes reported through `ProgramError::Custom`
#[derive(Error, Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum ErrorCode {
    #[error("Amount must be more than zero")]
    NeedsMoreThanZero = 6000,
    #[error("Collateral token and price feed lists differ in length")]
    CollateralListLengthMismatch = 6001,
    #[error("Token is not registered as collateral")]
    TokenNotAllowed = 6002,
    #[error("Collateral token registered twice")]
    DuplicateCollateral = 6003,
    #[error("Too many collateral types")]
    TooManyCollateralTypes = 6004,

    // Collaborator failures (6010-6019)
    #[error("Token transfer failed")]
    TransferFailed = 6010,
    #[error("Stable unit mint failed")]
    MintFailed = 6011,
    #[error("Stable unit burn failed")]
    BurnFailed = 6012,
    #[error("Rollback incomplete")]
    CompensationFailed = 6013,

    // Solvency (6020-6029)
    #[error("Health factor broken")]
    BreakHealthFactor = 6020,
    #[error("Health factor ok")]
    LiquidateHealthFactorOk = 6021,
    #[error("Health factor not improved")]
    HealthFactorNotImproved = 6022,
    #[error("Insufficient deposited collateral")]
    InsufficientCollateral = 6023,
    #[error("Burn amount exceeds minted debt")]
    InsufficientDebt = 6024,
    #[error("Debt to cover is worth no collateral")]
    PayoutTooSmall = 6025,

    // Arithmetic and oracle (6030-6039)
    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 6030,
    #[error("Division by zero")]
    DivisionByZero = 6031,
    #[error("Price data stale")]
    StalePrice = 6032,
    #[error("Invalid oracle price")]
    InvalidPrice = 6033,
    #[error("Price feed unavailable")]
    PriceFeedUnavailable = 6034,

    // Program plumbing (6040-6049)
    #[error("Reentrancy detected")]
    ReentrancyDetected = 6040,
    #[error("Invalid guard state")]
    InvalidGuardState = 6041,
    #[error("Invalid engine configuration")]
    InvalidConfig = 6042,
    #[error("Account does not match its derived address")]
    InvalidAccountAddress = 6043,
    #[error("Account not initialized")]
    AccountNotInitialized = 6044,
    #[error("Account already initialized")]
    AccountAlreadyInitialized = 6045,
    #[error("Invalid custody account")]
    InvalidCustody = 6046,
}

impl DscEngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NeedsMoreThanZero => ErrorCode::NeedsMoreThanZero,
            Self::CollateralListLengthMismatch => ErrorCode::CollateralListLengthMismatch,
            Self::TokenNotAllowed => ErrorCode::TokenNotAllowed,
            Self::DuplicateCollateral => ErrorCode::DuplicateCollateral,
            Self::TooManyCollateralTypes => ErrorCode::TooManyCollateralTypes,
            Self::TransferFailed => ErrorCode::TransferFailed,
            Self::MintFailed => ErrorCode::MintFailed,
            Self::BurnFailed => ErrorCode::BurnFailed,
            Self::CompensationFailed => ErrorCode::CompensationFailed,
            Self::BreakHealthFactor(_) => ErrorCode::BreakHealthFactor,
            Self::LiquidateHealthFactorOk(_) => ErrorCode::LiquidateHealthFactorOk,
            Self::HealthFactorNotImproved => ErrorCode::HealthFactorNotImproved,
            Self::InsufficientCollateral => ErrorCode::InsufficientCollateral,
            Self::InsufficientDebt => ErrorCode::InsufficientDebt,
            Self::PayoutTooSmall => ErrorCode::PayoutTooSmall,
            Self::ArithmeticOverflow => ErrorCode::ArithmeticOverflow,
            Self::DivisionByZero => ErrorCode::DivisionByZero,
            Self::StalePrice => ErrorCode::StalePrice,
            Self::InvalidPrice => ErrorCode::InvalidPrice,
            Self::PriceFeedUnavailable => ErrorCode::PriceFeedUnavailable,
            Self::ReentrancyDetected => ErrorCode::ReentrancyDetected,
            Self::InvalidGuardState => ErrorCode::InvalidGuardState,
            Self::InvalidConfig => ErrorCode::InvalidConfig,
            Self::InvalidAccountAddress => ErrorCode::InvalidAccountAddress,
            Self::AccountNotInitialized => ErrorCode::AccountNotInitialized,
            Self::AccountAlreadyInitialized => ErrorCode::AccountAlreadyInitialized,
            Self::InvalidCustody => ErrorCode::InvalidCustody,
        }
    }
}

impl From<DscEngineError> for ProgramError {
    fn from(e: DscEngineError) -> Self {
        msg!("Engine error: {}", e);
        ProgramError::Custom(e.code() as u32)
    }
}

impl From<ErrorCode> for ProgramError {
    fn from(e: ErrorCode) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for ErrorCode {
    fn type_of() -> &'static str {
        "DscEngineError"
    }
}

impl PrintProgramError for ErrorCode {
    fn print<E>(&self)
    where
        E: 'static
            + std::error::Error
            + DecodeError<E>
            + PrintProgramError
            + num_traits::FromPrimitive,
    {
        msg!("Error: {}", self);
    }
}
