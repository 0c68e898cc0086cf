//! Reference table of base rates.

use std::collections::HashSet;

use fxdash_common::Currency;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// One row of the reference table: a USD peer and its anchor rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCurrency {
    /// Currency code.
    pub code: Currency,
    /// Presentation symbol.
    pub symbol: String,
    /// Units of `code` per 1 USD.
    pub base_rate: Decimal,
}

impl BaseCurrency {
    /// Create a new reference row.
    pub fn new(code: impl Into<Currency>, symbol: impl Into<String>, base_rate: Decimal) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            base_rate,
        }
    }
}

/// Built-in reference table used when no table is configured.
pub fn reference_table() -> Vec<BaseCurrency> {
    vec![
        BaseCurrency::new("EUR", "€", dec!(0.85)),
        BaseCurrency::new("GBP", "£", dec!(0.73)),
        BaseCurrency::new("JPY", "¥", dec!(110.0)),
        BaseCurrency::new("CAD", "C$", dec!(1.25)),
        BaseCurrency::new("AUD", "A$", dec!(1.35)),
        BaseCurrency::new("CHF", "Fr", dec!(0.92)),
        BaseCurrency::new("CNY", "¥", dec!(6.45)),
        BaseCurrency::new("INR", "₹", dec!(83.12)),
        BaseCurrency::new("SEK", "kr", dec!(10.25)),
        BaseCurrency::new("NOK", "kr", dec!(10.85)),
        BaseCurrency::new("DKK", "kr", dec!(6.33)),
        BaseCurrency::new("SGD", "S$", dec!(1.34)),
        BaseCurrency::new("HKD", "HK$", dec!(7.82)),
        BaseCurrency::new("NZD", "NZ$", dec!(1.52)),
        BaseCurrency::new("KRW", "₩", dec!(1320.45)),
        BaseCurrency::new("MXN", "Mex$", dec!(17.25)),
        BaseCurrency::new("BRL", "R$", dec!(4.95)),
        BaseCurrency::new("ZAR", "R", dec!(18.75)),
        BaseCurrency::new("AED", "د.إ", dec!(3.67)),
        BaseCurrency::new("THB", "฿", dec!(35.42)),
    ]
}

/// Check the table before the engine is built from it.
///
/// Rejects an empty table, malformed or duplicate codes, a USD row and
/// any base rate that is not strictly positive.
pub fn validate_table(table: &[BaseCurrency]) -> FxResult<()> {
    if table.is_empty() {
        return Err(FxError::EmptyTable);
    }

    let mut seen = HashSet::with_capacity(table.len());
    for row in table {
        Currency::parse(row.code.code())?;

        if row.code.is_usd() {
            return Err(FxError::PivotInTable);
        }

        if row.base_rate <= Decimal::ZERO {
            return Err(FxError::InvalidBaseRate {
                code: row.code.clone(),
                rate: row.base_rate,
            });
        }

        if !seen.insert(&row.code) {
            return Err(FxError::DuplicateCurrency(row.code.clone()));
        }
    }

    Ok(())
}
