//! FX engine error types.

use fxdash_common::{Currency, ParseError, RecordId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// Reference table row with a zero or negative base rate.
    #[error("Invalid base rate {rate} for {code}")]
    InvalidBaseRate { code: Currency, rate: Decimal },

    /// Currency listed more than once in the reference table.
    #[error("Duplicate currency in reference table: {0}")]
    DuplicateCurrency(Currency),

    /// The pivot currency cannot be quoted against itself.
    #[error("USD is the pivot currency and cannot appear in the reference table")]
    PivotInTable,

    /// Reference table has no rows.
    #[error("Reference table is empty")]
    EmptyTable,

    /// Malformed currency code or pair.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Volatility outside `[0, 100)` percent.
    #[error("Volatility {0}% is out of range")]
    InvalidVolatility(Decimal),

    /// Refresh interval must be non-zero.
    #[error("Refresh interval must be greater than zero")]
    InvalidRefreshInterval,

    /// Environment or CLI configuration could not be read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Currency is neither USD nor present in the quote table.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(Currency),

    /// Alert target rate must be positive.
    #[error("Invalid alert target rate: {0}")]
    InvalidAlertTarget(Decimal),

    /// Holding amount or purchase rate is not positive.
    #[error("Invalid holding: {0}")]
    InvalidHolding(String),

    /// Amount times rate does not fit in a `Decimal`.
    #[error("Amount {amount} at rate {rate} is out of range")]
    AmountOverflow { amount: Decimal, rate: Decimal },

    /// No stored record with this ID.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),
}

/// `amount * rate`, or [`FxError::AmountOverflow`] when it does not fit.
pub fn checked_product(amount: Decimal, rate: Decimal) -> FxResult<Decimal> {
    amount
        .checked_mul(rate)
        .ok_or(FxError::AmountOverflow { amount, rate })
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
