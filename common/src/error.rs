//! Parse errors for shared types.

use thiserror::Error;

/// Errors raised while parsing user supplied codes and pairs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Currency code is not three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    /// Pair is not of the form `BASE/QUOTE`.
    #[error("Invalid currency pair: {0:?}")]
    InvalidPair(String),
}
