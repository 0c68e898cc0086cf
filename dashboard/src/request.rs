//! Command-line request formats.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use fxdash_common::{Currency, CurrencyPair};
use fxdash_fx::AlertDirection;
use rust_decimal::Decimal;

/// Alert given as `BASE/QUOTE>TARGET` or `BASE/QUOTE<TARGET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub pair: CurrencyPair,
    pub target: Decimal,
    pub direction: AlertDirection,
}

impl FromStr for AlertRequest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pair, target, direction) = if let Some((pair, target)) = s.split_once('>') {
            (pair, target, AlertDirection::Above)
        } else if let Some((pair, target)) = s.split_once('<') {
            (pair, target, AlertDirection::Below)
        } else {
            bail!("alert {s:?} needs '>' or '<', e.g. USD/EUR>0.86");
        };

        Ok(Self {
            pair: pair.trim().parse()?,
            target: target
                .trim()
                .parse()
                .with_context(|| format!("alert target {target:?}"))?,
            direction,
        })
    }
}

/// Holding given as `CODE:AMOUNT@RATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingRequest {
    pub currency: Currency,
    pub amount: Decimal,
    pub purchase_rate: Decimal,
}

impl FromStr for HoldingRequest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, rest) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("holding {s:?} should look like EUR:1000@0.84"))?;
        let (amount, rate) = rest
            .split_once('@')
            .ok_or_else(|| anyhow!("holding {s:?} is missing '@RATE'"))?;

        Ok(Self {
            currency: Currency::parse(code.trim())?,
            amount: amount
                .trim()
                .parse()
                .with_context(|| format!("holding amount {amount:?}"))?,
            purchase_rate: rate
                .trim()
                .parse()
                .with_context(|| format!("holding rate {rate:?}"))?,
        })
    }
}
