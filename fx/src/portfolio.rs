//! Currency holdings and their valuation against live quotes.

use dashmap::DashMap;
use fxdash_common::{Currency, RecordId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{checked_product, FxError, FxResult};
use crate::quote::QuoteSnapshot;

/// A currency position bought at a known rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub id: RecordId,
    pub currency: Currency,
    pub amount: Decimal,
    pub purchase_rate: Decimal,
    pub notes: Option<String>,
    pub purchased_at: Timestamp,
}

impl Holding {
    pub fn purchase_value(&self) -> FxResult<Decimal> {
        checked_product(self.amount, self.purchase_rate)
    }
}

/// One holding marked to the current rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingValuation {
    pub holding: Holding,
    pub current_rate: Decimal,
    pub purchase_value: Decimal,
    pub current_value: Decimal,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
}

impl HoldingValuation {
    fn new(holding: Holding, snapshot: &QuoteSnapshot) -> FxResult<Self> {
        // Unquoted currencies are carried at cost.
        let current_rate = snapshot
            .quote(&holding.currency)
            .map(|q| q.current_rate)
            .unwrap_or(holding.purchase_rate);

        let purchase_value = holding.purchase_value()?;
        let current_value = checked_product(holding.amount, current_rate)?;
        // Both values are non-negative, so the difference always fits.
        let pnl = current_value - purchase_value;

        Ok(Self {
            holding,
            current_rate,
            purchase_value,
            current_value,
            pnl,
            pnl_percent: percent_of(pnl, purchase_value)?,
        })
    }
}

/// Totals over every holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    pub holdings: Vec<HoldingValuation>,
    pub total_value: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_percent: Decimal,
}

fn percent_of(part: Decimal, whole: Decimal) -> FxResult<Decimal> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let ratio = part.checked_div(whole).ok_or(FxError::AmountOverflow {
        amount: part,
        rate: whole,
    })?;
    checked_product(ratio, Decimal::ONE_HUNDRED)
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> FxResult<Decimal> {
    values.try_fold(Decimal::ZERO, |total, value| {
        total.checked_add(value).ok_or(FxError::AmountOverflow {
            amount: total,
            rate: Decimal::ONE,
        })
    })
}

/// Process-local set of holdings.
#[derive(Default)]
pub struct Portfolio {
    holdings: DashMap<RecordId, Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a purchase of `amount` units of `currency` at `purchase_rate`.
    pub fn add(
        &self,
        currency: Currency,
        amount: Decimal,
        purchase_rate: Decimal,
        notes: Option<String>,
    ) -> FxResult<Holding> {
        if amount <= Decimal::ZERO {
            return Err(FxError::InvalidHolding(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        if purchase_rate <= Decimal::ZERO {
            return Err(FxError::InvalidHolding(format!(
                "purchase rate must be positive, got {}",
                purchase_rate
            )));
        }
        if amount.checked_mul(purchase_rate).is_none() {
            return Err(FxError::InvalidHolding(format!(
                "{} at {} is out of range",
                amount, purchase_rate
            )));
        }

        let holding = Holding {
            id: RecordId::new(),
            currency,
            amount,
            purchase_rate,
            notes,
            purchased_at: fxdash_common::now(),
        };
        self.holdings.insert(holding.id, holding.clone());

        info!(
            holding_id = %holding.id,
            currency = %holding.currency,
            amount = %holding.amount,
            "Holding added"
        );
        Ok(holding)
    }

    pub fn remove(&self, id: RecordId) -> FxResult<Holding> {
        self.holdings
            .remove(&id)
            .map(|(_, holding)| holding)
            .ok_or(FxError::RecordNotFound(id))
    }

    /// Holdings in purchase order.
    pub fn list(&self) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = self.holdings.iter().map(|h| h.clone()).collect();
        holdings.sort_by_key(|h| h.id);
        holdings
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Mark every holding to `snapshot`.
    ///
    /// Fails with [`FxError::AmountOverflow`] when a value or a total does
    /// not fit in a `Decimal`.
    pub fn valuation(&self, snapshot: &QuoteSnapshot) -> FxResult<PortfolioSummary> {
        let holdings = self
            .list()
            .into_iter()
            .map(|h| HoldingValuation::new(h, snapshot))
            .collect::<FxResult<Vec<_>>>()?;

        let total_value = checked_sum(holdings.iter().map(|v| v.current_value))?;
        let total_cost = checked_sum(holdings.iter().map(|v| v.purchase_value))?;
        let total_pnl = total_value - total_cost;

        Ok(PortfolioSummary {
            holdings,
            total_value,
            total_pnl,
            total_pnl_percent: percent_of(total_pnl, total_cost)?,
        })
    }
}
