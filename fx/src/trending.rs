//! Trending board and regional performance derived from a snapshot.

use fxdash_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::quote::{CurrencyQuote, QuoteSnapshot};

/// Moves larger than this many percent mark a currency as hot.
pub const HOT_THRESHOLD_PERCENT: Decimal = dec!(1.5);

/// How many gainers or losers the board highlights.
pub const TOP_MOVERS: usize = 5;

/// Board ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Largest absolute percent move first.
    #[default]
    Change,
    /// By currency code.
    Alphabetical,
}

/// One row of the trending board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingEntry {
    pub quote: CurrencyQuote,
    pub pair: CurrencyPair,
    pub is_hot: bool,
    /// `50 + percent_change * 5`; 50 is unchanged.
    pub strength: Decimal,
}

impl TrendingEntry {
    fn from_quote(quote: &CurrencyQuote) -> Self {
        Self {
            quote: quote.clone(),
            pair: quote.pair(),
            is_hot: quote.percent_change.abs() > HOT_THRESHOLD_PERCENT,
            strength: dec!(50) + quote.percent_change * dec!(5),
        }
    }

    fn is_gainer(&self) -> bool {
        self.quote.absolute_change > Decimal::ZERO
    }

    fn is_loser(&self) -> bool {
        self.quote.absolute_change < Decimal::ZERO
    }
}

/// Sorted view over one generation of quotes.
#[derive(Debug, Clone, Serialize)]
pub struct TrendingBoard {
    generation: u64,
    entries: Vec<TrendingEntry>,
}

impl TrendingBoard {
    /// Build the board for `snapshot`.
    pub fn from_snapshot(snapshot: &QuoteSnapshot, order: SortOrder) -> Self {
        let mut entries: Vec<TrendingEntry> =
            snapshot.quotes().iter().map(TrendingEntry::from_quote).collect();

        match order {
            // Stable sort keeps table order among equal moves.
            SortOrder::Change => entries.sort_by(|a, b| {
                b.quote
                    .percent_change
                    .abs()
                    .cmp(&a.quote.percent_change.abs())
            }),
            SortOrder::Alphabetical => entries.sort_by(|a, b| a.quote.code.cmp(&b.quote.code)),
        }

        Self {
            generation: snapshot.generation(),
            entries,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &[TrendingEntry] {
        &self.entries
    }

    /// Up to [`TOP_MOVERS`] rising currencies, in board order.
    pub fn top_gainers(&self) -> Vec<&TrendingEntry> {
        self.entries.iter().filter(|e| e.is_gainer()).take(TOP_MOVERS).collect()
    }

    /// Up to [`TOP_MOVERS`] falling currencies, in board order.
    pub fn top_losers(&self) -> Vec<&TrendingEntry> {
        self.entries.iter().filter(|e| e.is_loser()).take(TOP_MOVERS).collect()
    }

    pub fn gainers_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_gainer()).count()
    }

    pub fn losers_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_loser()).count()
    }

    pub fn hot_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_hot).count()
    }
}

/// Named group of currencies for the market overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub currencies: &'static [&'static str],
}

impl Region {
    /// Regions shown on the market overview.
    pub const ALL: [Region; 4] = [
        Region {
            name: "Americas",
            currencies: &["USD", "CAD", "BRL"],
        },
        Region {
            name: "Europe",
            currencies: &["EUR", "GBP", "CHF"],
        },
        Region {
            name: "Asia-Pacific",
            currencies: &["JPY", "AUD", "SGD"],
        },
        Region {
            name: "Emerging",
            currencies: &["CNY", "INR", "MXN"],
        },
    ];

    /// Mean percent change of the region's quoted currencies.
    ///
    /// Codes without a quote (USD among them) are skipped; a region with
    /// no quoted member scores zero.
    pub fn performance(&self, snapshot: &QuoteSnapshot) -> Decimal {
        let changes: Vec<Decimal> = self
            .currencies
            .iter()
            .filter_map(|code| snapshot.quote(&Currency::new(*code)))
            .map(|q| q.percent_change)
            .collect();

        if changes.is_empty() {
            return Decimal::ZERO;
        }
        changes.iter().sum::<Decimal>() / Decimal::from(changes.len())
    }
}
