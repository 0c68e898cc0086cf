//! Display formatting for converted amounts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits for currencies shown with minor units.
pub const DISPLAY_DECIMALS: u32 = 4;

/// Fraction digits for the generic fallback rendering.
pub const FALLBACK_DECIMALS: u32 = 2;

/// Render `value` with `decimals` fraction digits and `,` thousands
/// separators. Halves round away from zero.
pub fn grouped(value: Decimal, decimals: u32) -> String {
    let rendered = plain(value, decimals);

    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3);
    out.push_str(sign);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Render `value` with exactly `decimals` fraction digits, no grouping.
pub fn plain(value: Decimal, decimals: u32) -> String {
    let mut rounded =
        value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    // -0.00 after rounding prints without the sign.
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(decimals);
    rounded.to_string()
}
