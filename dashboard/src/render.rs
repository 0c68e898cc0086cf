//! Plain-text rendering of dashboard panels.

use std::fmt::Write;

use fxdash_fx::format::plain;
use fxdash_fx::{
    Conversion, PortfolioSummary, QuoteSnapshot, RateEngine, Region, TrendingBoard,
    TriggeredAlert,
};
use rust_decimal::Decimal;

fn signed_percent(value: Decimal) -> String {
    let sign = if value > Decimal::ZERO { "+" } else { "" };
    format!("{sign}{}%", plain(value, 2))
}

/// Quote board with mover counts.
pub fn board(board: &TrendingBoard, engine: &RateEngine) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Market, generation {} ==", board.generation());
    let _ = writeln!(out, "{:<9} {:>16} {:>9} {:>7}", "PAIR", "RATE", "CHANGE", "STR");

    for entry in board.entries() {
        let quote = &entry.quote;
        let _ = writeln!(
            out,
            "{:<9} {:>16} {:>9} {:>7}{}",
            entry.pair.to_string(),
            engine.format_amount(quote.current_rate, &quote.code),
            signed_percent(quote.percent_change),
            plain(entry.strength, 1),
            if entry.is_hot { "  hot" } else { "" }
        );
    }

    let _ = writeln!(
        out,
        "gainers {}  losers {}  hot {}",
        board.gainers_count(),
        board.losers_count(),
        board.hot_count()
    );

    let gainers: Vec<String> = board.top_gainers().iter().map(|e| e.quote.code.to_string()).collect();
    let losers: Vec<String> = board.top_losers().iter().map(|e| e.quote.code.to_string()).collect();
    let _ = writeln!(out, "top gainers: {}", gainers.join(" "));
    let _ = write!(out, "top losers:  {}", losers.join(" "));
    out
}

/// One line of regional averages.
pub fn regions(snapshot: &QuoteSnapshot) -> String {
    Region::ALL
        .iter()
        .map(|region| format!("{} {}", region.name, signed_percent(region.performance(snapshot))))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn conversions(conversions: &[Conversion], engine: &RateEngine) -> String {
    conversions
        .iter()
        .map(|c| {
            format!(
                "{} {} = {} {} @ {}",
                engine.format_amount(c.amount.value, c.from_currency()),
                c.from_currency(),
                engine.format_amount(c.result.value, c.to_currency()),
                c.to_currency(),
                plain(c.rate, 6)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn alerts(triggered: &[TriggeredAlert]) -> String {
    triggered
        .iter()
        .map(|t| {
            format!(
                "ALERT {} {:?} {} (now {})",
                t.alert.pair,
                t.alert.direction,
                t.alert.target_rate,
                plain(t.observed_rate, 6)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn portfolio(summary: &PortfolioSummary) -> String {
    let mut out = String::new();
    for valuation in &summary.holdings {
        let holding = &valuation.holding;
        let _ = writeln!(
            out,
            "{} {} bought @ {} now @ {}: pnl {} ({})",
            plain(holding.amount, 2),
            holding.currency,
            plain(holding.purchase_rate, 4),
            plain(valuation.current_rate, 4),
            plain(valuation.pnl, 2),
            signed_percent(valuation.pnl_percent)
        );
    }
    let _ = write!(
        out,
        "portfolio value {} pnl {} ({})",
        plain(summary.total_value, 2),
        plain(summary.total_pnl, 2),
        signed_percent(summary.total_pnl_percent)
    );
    out
}
