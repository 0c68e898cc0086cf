//! Rate alerts (watchlist).

use dashmap::DashMap;
use fxdash_common::{CurrencyPair, RecordId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FxError, FxResult};
use crate::quote::QuoteSnapshot;

/// Which side of the target fires the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertDirection {
    /// Fires when the rate rises above the target.
    Above,
    /// Fires when the rate falls below the target.
    Below,
}

impl AlertDirection {
    fn is_met(&self, rate: Decimal, target: Decimal) -> bool {
        match self {
            AlertDirection::Above => rate > target,
            AlertDirection::Below => rate < target,
        }
    }
}

/// A price alert on a currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateAlert {
    pub id: RecordId,
    pub pair: CurrencyPair,
    pub target_rate: Decimal,
    pub direction: AlertDirection,
    pub active: bool,
    pub created_at: Timestamp,
}

/// An alert whose condition held, with the rate that tripped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredAlert {
    pub alert: RateAlert,
    pub observed_rate: Decimal,
}

/// Process-local alert store.
#[derive(Default)]
pub struct AlertBook {
    alerts: DashMap<RecordId, RateAlert>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active alert.
    pub fn create(
        &self,
        pair: CurrencyPair,
        target_rate: Decimal,
        direction: AlertDirection,
    ) -> FxResult<RateAlert> {
        if target_rate <= Decimal::ZERO {
            return Err(FxError::InvalidAlertTarget(target_rate));
        }

        let alert = RateAlert {
            id: RecordId::new(),
            pair,
            target_rate,
            direction,
            active: true,
            created_at: fxdash_common::now(),
        };
        self.alerts.insert(alert.id, alert.clone());

        info!(
            alert_id = %alert.id,
            pair = %alert.pair,
            target = %alert.target_rate,
            direction = ?alert.direction,
            "Alert created"
        );
        Ok(alert)
    }

    /// All alerts, newest first.
    pub fn list(&self) -> Vec<RateAlert> {
        let mut alerts: Vec<RateAlert> = self.alerts.iter().map(|a| a.clone()).collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        alerts
    }

    /// Delete an alert.
    pub fn remove(&self, id: RecordId) -> FxResult<RateAlert> {
        self.alerts
            .remove(&id)
            .map(|(_, alert)| alert)
            .ok_or(FxError::RecordNotFound(id))
    }

    pub fn active_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.active).count()
    }

    /// Check every active alert against one snapshot.
    ///
    /// Alerts that fire are deactivated, so each fires at most once.
    /// Alerts on currencies the snapshot does not quote are skipped.
    pub fn evaluate(&self, snapshot: &QuoteSnapshot) -> Vec<TriggeredAlert> {
        let mut triggered = Vec::new();

        for mut entry in self.alerts.iter_mut() {
            let alert = entry.value_mut();
            if !alert.active {
                continue;
            }

            let rate = match snapshot.try_rate(&alert.pair.base, &alert.pair.quote) {
                Ok(rate) => rate,
                Err(e) => {
                    warn!(alert_id = %alert.id, error = %e, "Skipping alert");
                    continue;
                }
            };

            if alert.direction.is_met(rate, alert.target_rate) {
                alert.active = false;
                info!(
                    alert_id = %alert.id,
                    pair = %alert.pair,
                    rate = %rate,
                    target = %alert.target_rate,
                    "Alert triggered"
                );
                triggered.push(TriggeredAlert {
                    alert: alert.clone(),
                    observed_rate: rate,
                });
            }
        }

        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::CurrencyQuote;
    use crate::table::BaseCurrency;
    use fxdash_common::Currency;
    use rust_decimal_macros::dec;

    fn snapshot() -> QuoteSnapshot {
        let quotes = vec![
            CurrencyQuote::at_base(&BaseCurrency::new("EUR", "€", dec!(0.85))),
            CurrencyQuote::at_base(&BaseCurrency::new("GBP", "£", dec!(0.73))),
        ];
        QuoteSnapshot::new(0, fxdash_common::now(), quotes)
    }

    fn pair(s: &str) -> CurrencyPair {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejects_non_positive_target() {
        let book = AlertBook::new();
        assert!(matches!(
            book.create(pair("USD/EUR"), Decimal::ZERO, AlertDirection::Above),
            Err(FxError::InvalidAlertTarget(_))
        ));
    }

    #[test]
    fn test_above_and_below() {
        let book = AlertBook::new();
        let above = book
            .create(pair("USD/EUR"), dec!(0.80), AlertDirection::Above)
            .unwrap();
        book.create(pair("USD/EUR"), dec!(0.80), AlertDirection::Below)
            .unwrap();
        let below = book
            .create(pair("USD/GBP"), dec!(0.75), AlertDirection::Below)
            .unwrap();

        let fired = book.evaluate(&snapshot());
        let mut ids: Vec<RecordId> = fired.iter().map(|t| t.alert.id).collect();
        ids.sort();
        let mut expected = vec![above.id, below.id];
        expected.sort();

        assert_eq!(ids, expected);
        assert_eq!(book.active_count(), 1);
    }

    #[test]
    fn test_fires_once() {
        let book = AlertBook::new();
        book.create(pair("EUR/GBP"), dec!(1.1), AlertDirection::Above)
            .unwrap();

        let fired = book.evaluate(&snapshot());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].observed_rate, dec!(0.85) / dec!(0.73));
        assert!(!fired[0].alert.active);

        assert!(book.evaluate(&snapshot()).is_empty());
    }

    #[test]
    fn test_skips_unsupported_pairs() {
        let book = AlertBook::new();
        book.create(pair("USD/ZZZ"), dec!(0.5), AlertDirection::Above)
            .unwrap();

        assert!(book.evaluate(&snapshot()).is_empty());
        assert_eq!(book.active_count(), 1);
    }

    #[test]
    fn test_list_and_remove() {
        let book = AlertBook::new();
        let alert = book
            .create(
                CurrencyPair::new(Currency::usd(), Currency::jpy()),
                dec!(111),
                AlertDirection::Above,
            )
            .unwrap();

        assert_eq!(book.list(), vec![alert.clone()]);
        assert_eq!(book.remove(alert.id).unwrap(), alert);
        assert!(matches!(
            book.remove(alert.id),
            Err(FxError::RecordNotFound(_))
        ));
        assert!(book.list().is_empty());
    }
}
