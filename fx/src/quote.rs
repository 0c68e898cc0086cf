//! Quotes and immutable quote-table snapshots.

use std::collections::HashMap;

use fxdash_common::{Currency, CurrencyPair, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{FxError, FxResult};
use crate::table::BaseCurrency;

/// Simulated quote for one non-USD currency, in units per 1 USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyQuote {
    /// Currency code.
    pub code: Currency,
    /// Presentation symbol.
    pub symbol: String,
    /// Fixed anchor rate.
    pub base_rate: Decimal,
    /// Most recently generated rate.
    pub current_rate: Decimal,
    /// `current_rate - base_rate`.
    pub absolute_change: Decimal,
    /// `absolute_change / base_rate * 100`.
    pub percent_change: Decimal,
}

impl CurrencyQuote {
    /// Quote sitting exactly on its base rate.
    pub fn at_base(base: &BaseCurrency) -> Self {
        Self {
            code: base.code.clone(),
            symbol: base.symbol.clone(),
            base_rate: base.base_rate,
            current_rate: base.base_rate,
            absolute_change: Decimal::ZERO,
            percent_change: Decimal::ZERO,
        }
    }

    /// Quote moved `percent_change` percent away from its base rate.
    pub fn perturbed(base: &BaseCurrency, percent_change: Decimal) -> Self {
        let absolute_change = base.base_rate * percent_change / Decimal::ONE_HUNDRED;
        Self {
            code: base.code.clone(),
            symbol: base.symbol.clone(),
            base_rate: base.base_rate,
            current_rate: base.base_rate + absolute_change,
            absolute_change,
            percent_change,
        }
    }

    /// The `CODE/USD` pair this quote is listed under.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.code.clone(), Currency::usd())
    }
}

/// One generation of the quote table.
///
/// Snapshots are never mutated; the engine publishes a new one on every
/// regeneration, so every value read from a snapshot belongs to the same
/// generation.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteSnapshot {
    generation: u64,
    generated_at: Timestamp,
    quotes: Vec<CurrencyQuote>,
    #[serde(skip)]
    index: HashMap<Currency, usize>,
}

impl QuoteSnapshot {
    /// Build a snapshot. Quotes keep their reference-table order.
    pub fn new(generation: u64, generated_at: Timestamp, quotes: Vec<CurrencyQuote>) -> Self {
        let index = quotes
            .iter()
            .enumerate()
            .map(|(i, q)| (q.code.clone(), i))
            .collect();

        Self {
            generation,
            generated_at,
            quotes,
            index,
        }
    }

    /// Generation counter; 0 is the base-rate table.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When this generation was produced.
    pub fn generated_at(&self) -> Timestamp {
        self.generated_at
    }

    /// All quotes, in reference-table order.
    pub fn quotes(&self) -> &[CurrencyQuote] {
        &self.quotes
    }

    /// Number of quoted currencies (USD excluded).
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the table has no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Look up a quote.
    pub fn quote(&self, code: &Currency) -> Option<&CurrencyQuote> {
        self.index.get(code).map(|&i| &self.quotes[i])
    }

    /// Whether `code` can be converted: USD or a quoted currency.
    pub fn supports(&self, code: &Currency) -> bool {
        code.is_usd() || self.index.contains_key(code)
    }

    /// Units of `code` per USD; unknown codes are pegged 1:1.
    fn leg(&self, code: &Currency) -> Decimal {
        self.quote(code).map_or(Decimal::ONE, |q| q.current_rate)
    }

    /// Rate from `from` to `to` with USD as the pivot.
    ///
    /// Codes missing from the table convert as if pegged 1:1 to USD.
    pub fn rate(&self, from: &Currency, to: &Currency) -> Decimal {
        if from == to {
            return Decimal::ONE;
        }

        if from.is_usd() {
            self.leg(to)
        } else if to.is_usd() {
            Decimal::ONE / self.leg(from)
        } else {
            self.leg(from) / self.leg(to)
        }
    }

    /// Like [`QuoteSnapshot::rate`], but unknown codes are an error.
    pub fn try_rate(&self, from: &Currency, to: &Currency) -> FxResult<Decimal> {
        for code in [from, to] {
            if !self.supports(code) {
                return Err(FxError::UnsupportedCurrency(code.clone()));
            }
        }
        Ok(self.rate(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_snapshot() -> QuoteSnapshot {
        let quotes = vec![
            CurrencyQuote::at_base(&BaseCurrency::new("EUR", "€", dec!(0.85))),
            CurrencyQuote::at_base(&BaseCurrency::new("GBP", "£", dec!(0.73))),
        ];
        QuoteSnapshot::new(0, fxdash_common::now(), quotes)
    }

    #[test]
    fn test_perturbed_quote() {
        let base = BaseCurrency::new("JPY", "¥", dec!(110));
        let quote = CurrencyQuote::perturbed(&base, dec!(-1.5));

        assert_eq!(quote.absolute_change, dec!(-1.65));
        assert_eq!(quote.current_rate, dec!(108.35));
        assert_eq!(quote.base_rate, dec!(110));
        assert_eq!(quote.pair().to_string(), "JPY/USD");
    }

    #[test]
    fn test_at_base_has_no_change() {
        let quote = CurrencyQuote::at_base(&BaseCurrency::new("EUR", "€", dec!(0.85)));
        assert_eq!(quote.current_rate, quote.base_rate);
        assert!(quote.absolute_change.is_zero());
        assert!(quote.percent_change.is_zero());
    }

    #[test]
    fn test_rate_cases() {
        let snap = base_snapshot();
        let usd = Currency::usd();
        let eur = Currency::eur();
        let gbp = Currency::gbp();

        assert_eq!(snap.rate(&usd, &eur), dec!(0.85));
        assert_eq!(snap.rate(&eur, &usd), Decimal::ONE / dec!(0.85));
        assert_eq!(snap.rate(&eur, &gbp), dec!(0.85) / dec!(0.73));
        assert_eq!(snap.rate(&usd, &usd), Decimal::ONE);
        assert_eq!(snap.rate(&gbp, &gbp), Decimal::ONE);
    }

    #[test]
    fn test_unknown_codes_peg_to_one() {
        let snap = base_snapshot();
        let zzz = Currency::new("ZZZ");

        assert_eq!(snap.rate(&Currency::usd(), &zzz), Decimal::ONE);
        assert_eq!(snap.rate(&zzz, &Currency::usd()), Decimal::ONE);
        assert_eq!(snap.rate(&Currency::eur(), &zzz), dec!(0.85));
    }

    #[test]
    fn test_try_rate_rejects_unknown() {
        let snap = base_snapshot();
        let zzz = Currency::new("ZZZ");

        assert!(matches!(
            snap.try_rate(&Currency::usd(), &zzz),
            Err(FxError::UnsupportedCurrency(c)) if c == zzz
        ));
        assert_eq!(
            snap.try_rate(&Currency::usd(), &Currency::gbp()).unwrap(),
            dec!(0.73)
        );
    }

    #[test]
    fn test_lookup() {
        let snap = base_snapshot();
        assert_eq!(snap.len(), 2);
        assert!(!snap.is_empty());
        assert!(snap.supports(&Currency::usd()));
        assert!(snap.supports(&Currency::eur()));
        assert!(!snap.supports(&Currency::jpy()));
        assert_eq!(snap.quote(&Currency::gbp()).unwrap().symbol, "£");
    }
}
