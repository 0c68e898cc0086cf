//! Main rate engine implementation.

use std::sync::Arc;

use fxdash_common::{Currency, Money};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::config::FxEngineConfig;
use crate::conversion::Conversion;
use crate::error::{checked_product, FxResult};
use crate::format;
use crate::quote::{CurrencyQuote, QuoteSnapshot};
use crate::scheduler::RefreshScheduler;

/// Synthetic exchange-rate engine.
///
/// Holds the current [`QuoteSnapshot`] behind a lock that is only ever
/// taken to clone or swap an `Arc`, so readers never block on a
/// regeneration and never see half of one.
pub struct RateEngine {
    config: FxEngineConfig,
    table: RwLock<Arc<QuoteSnapshot>>,
    // Held for the whole of a regeneration, which serializes timer and
    // manual refreshes.
    rng: Mutex<StdRng>,
    updates: watch::Sender<Arc<QuoteSnapshot>>,
}

impl RateEngine {
    /// Create an engine from a validated config.
    ///
    /// The initial table sits on the base rates. Seeds from `config.seed`
    /// when set, otherwise from entropy.
    pub fn new(config: FxEngineConfig) -> FxResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create an engine with an explicit random source.
    pub fn with_rng(config: FxEngineConfig, rng: StdRng) -> FxResult<Self> {
        config.validate()?;

        let quotes = config
            .base_table
            .iter()
            .map(CurrencyQuote::at_base)
            .collect();
        let initial = Arc::new(QuoteSnapshot::new(0, fxdash_common::now(), quotes));
        let (updates, _) = watch::channel(initial.clone());

        info!(
            currencies = initial.len(),
            volatility = %config.volatility,
            refresh_secs = config.refresh_interval.as_secs(),
            "Rate engine initialized"
        );

        Ok(Self {
            config,
            table: RwLock::new(initial),
            rng: Mutex::new(rng),
            updates,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &FxEngineConfig {
        &self.config
    }

    /// Current quote table.
    pub fn snapshot(&self) -> Arc<QuoteSnapshot> {
        self.table.read().clone()
    }

    /// Subscribe to newly published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<QuoteSnapshot>> {
        self.updates.subscribe()
    }

    /// Draw a fresh perturbation for every currency and publish the new
    /// table as one generation.
    #[instrument(skip(self))]
    pub fn regenerate(&self) -> Arc<QuoteSnapshot> {
        let mut rng = self.rng.lock();
        let generation = self.table.read().generation() + 1;

        let quotes = self
            .config
            .base_table
            .iter()
            .map(|base| {
                let percent = draw_percent_change(&mut *rng, self.config.volatility);
                CurrencyQuote::perturbed(base, percent)
            })
            .collect();
        let next = Arc::new(QuoteSnapshot::new(generation, fxdash_common::now(), quotes));

        *self.table.write() = next.clone();
        self.updates.send_replace(next.clone());

        debug!(generation, "Quote table regenerated");
        next
    }

    /// Rate from `from` to `to` against the current table.
    ///
    /// Unsupported codes are treated as pegged 1:1 to USD.
    pub fn get_rate(&self, from: &Currency, to: &Currency) -> Decimal {
        self.snapshot().rate(from, to)
    }

    /// Rate from `from` to `to`, rejecting unsupported codes.
    pub fn try_rate(&self, from: &Currency, to: &Currency) -> FxResult<Decimal> {
        self.snapshot().try_rate(from, to)
    }

    /// Whether `code` is USD or a quoted currency.
    pub fn supports(&self, code: &Currency) -> bool {
        self.snapshot().supports(code)
    }

    /// Quote for a single currency.
    pub fn quote(&self, code: &Currency) -> Option<CurrencyQuote> {
        self.snapshot().quote(code).cloned()
    }

    /// USD followed by every quoted currency, in table order.
    pub fn currencies(&self) -> Vec<Currency> {
        std::iter::once(Currency::usd())
            .chain(self.config.base_table.iter().map(|b| b.code.clone()))
            .collect()
    }

    /// Convert `amount` of `from` into `to` at the current rate.
    pub fn convert(&self, amount: Decimal, from: &Currency, to: &Currency) -> FxResult<Conversion> {
        let rate = self.get_rate(from, to);
        Conversion::new(Money::new(amount, from.clone()), to.clone(), rate)
    }

    /// Convert one amount into several currencies against one generation.
    pub fn convert_many(
        &self,
        amount: Decimal,
        from: &Currency,
        targets: &[Currency],
    ) -> FxResult<Vec<Conversion>> {
        let snapshot = self.snapshot();
        targets
            .iter()
            .map(|to| {
                let rate = snapshot.rate(from, to);
                Conversion::new(Money::new(amount, from.clone()), to.clone(), rate)
            })
            .collect()
    }

    /// Convert a USD-denominated figure into `to`.
    pub fn convert_from_usd(&self, usd_amount: Decimal, to: &Currency) -> FxResult<Decimal> {
        if to.is_usd() {
            return Ok(usd_amount);
        }
        checked_product(usd_amount, self.get_rate(&Currency::usd(), to))
    }

    /// Format `value` for display in `code`.
    ///
    /// Quoted currencies without minor units get no fraction digits, other
    /// quoted currencies get four. Anything else, USD included, falls back
    /// to a plain two-decimal rendering.
    pub fn format_amount(&self, value: Decimal, code: &Currency) -> String {
        if self.snapshot().quote(code).is_none() {
            return format::plain(value, format::FALLBACK_DECIMALS);
        }

        let decimals = if code.has_minor_units() {
            format::DISPLAY_DECIMALS
        } else {
            0
        };
        format::grouped(value, decimals)
    }

    /// Start the periodic refresh task at the configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_refresh(self: &Arc<Self>) -> RefreshScheduler {
        RefreshScheduler::start(Arc::clone(self), self.config.refresh_interval)
    }
}

/// Uniform draw on `[-volatility, +volatility]` percent.
fn draw_percent_change<R: Rng + ?Sized>(rng: &mut R, volatility: Decimal) -> Decimal {
    let draw: f64 = rng.gen();
    let unit = Decimal::from_f64((draw - 0.5) * 2.0)
        .unwrap_or(Decimal::ZERO)
        .round_dp(12)
        .clamp(-Decimal::ONE, Decimal::ONE);
    unit * volatility
}

impl std::fmt::Debug for RateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateEngine")
            .field("config", &self.config)
            .field("generation", &self.snapshot().generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::table::BaseCurrency;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::thread;

    fn tolerance() -> Decimal {
        dec!(0.000000001)
    }

    fn seeded(seed: u64) -> RateEngine {
        let config = FxEngineConfig {
            seed: Some(seed),
            ..Default::default()
        };
        RateEngine::new(config).unwrap()
    }

    fn two_currency_engine() -> RateEngine {
        let config = FxEngineConfig::with_table(vec![
            BaseCurrency::new("EUR", "€", dec!(0.85)),
            BaseCurrency::new("GBP", "£", dec!(0.73)),
        ]);
        RateEngine::new(config).unwrap()
    }

    #[test]
    fn test_initial_rates_scenario() {
        let engine = two_currency_engine();
        let usd = Currency::usd();
        let eur = Currency::eur();
        let gbp = Currency::gbp();

        assert_eq!(engine.snapshot().generation(), 0);
        assert_eq!(engine.get_rate(&usd, &eur), dec!(0.85));

        let eur_usd = engine.get_rate(&eur, &usd);
        assert!((eur_usd - dec!(1.17647)).abs() < dec!(0.00001));

        let eur_gbp = engine.get_rate(&eur, &gbp);
        assert_eq!(eur_gbp, dec!(0.85) / dec!(0.73));
        assert!((eur_gbp - dec!(1.16438)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_initial_quotes_have_zero_change() {
        let engine = seeded(1);
        for quote in engine.snapshot().quotes() {
            assert_eq!(quote.current_rate, quote.base_rate);
            assert!(quote.percent_change.is_zero());
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FxEngineConfig::with_table(vec![BaseCurrency::new("EUR", "€", Decimal::ZERO)]);
        assert!(RateEngine::new(config).is_err());
    }

    #[test]
    fn test_regeneration_is_bounded_and_anchored() {
        let engine = seeded(7);
        let volatility = engine.config().volatility;

        for _ in 0..200 {
            let snapshot = engine.regenerate();
            for quote in snapshot.quotes() {
                assert!(quote.percent_change.abs() <= volatility);
                assert_eq!(quote.current_rate, quote.base_rate + quote.absolute_change);
                assert_eq!(
                    quote.absolute_change,
                    quote.base_rate * quote.percent_change / Decimal::ONE_HUNDRED
                );
            }
        }
        assert_eq!(engine.snapshot().generation(), 200);
    }

    #[test]
    fn test_zero_volatility_keeps_base_rates() {
        let config = FxEngineConfig {
            volatility: Decimal::ZERO,
            seed: Some(3),
            ..Default::default()
        };
        let engine = RateEngine::new(config).unwrap();
        let snapshot = engine.regenerate();
        for quote in snapshot.quotes() {
            assert_eq!(quote.current_rate, quote.base_rate);
        }
    }

    #[test]
    fn test_same_seed_same_rates() {
        let a = seeded(42);
        let b = seeded(42);
        a.regenerate();
        b.regenerate();
        assert_eq!(a.snapshot().quotes(), b.snapshot().quotes());
    }

    #[test]
    fn test_old_snapshot_survives_regeneration() {
        let engine = seeded(11);
        let before = engine.regenerate();
        let recorded: Vec<Decimal> = before.quotes().iter().map(|q| q.current_rate).collect();

        let after = engine.regenerate();

        let still: Vec<Decimal> = before.quotes().iter().map(|q| q.current_rate).collect();
        assert_eq!(recorded, still);
        assert_eq!(after.generation(), before.generation() + 1);
        assert_eq!(engine.snapshot().generation(), after.generation());
    }

    #[test]
    fn test_concurrent_readers_see_whole_generations() {
        let engine = Arc::new(seeded(5));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..500 {
                        let snapshot = engine.snapshot();
                        assert!(snapshot.generation() >= last);
                        last = snapshot.generation();
                        assert_eq!(snapshot.len(), 20);
                        if snapshot.generation() == 0 {
                            assert!(snapshot.quotes().iter().all(|q| q.percent_change.is_zero()));
                        }
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            engine.regenerate();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(engine.snapshot().generation(), 100);
    }

    #[test]
    fn test_unknown_currency_fallback() {
        let engine = seeded(9);
        engine.regenerate();
        let zzz = Currency::new("ZZZ");

        assert_eq!(engine.get_rate(&Currency::usd(), &zzz), Decimal::ONE);
        assert_eq!(engine.get_rate(&zzz, &Currency::usd()), Decimal::ONE);
        assert!(engine.try_rate(&Currency::usd(), &zzz).is_err());
        assert!(!engine.supports(&zzz));
        assert!(engine.quote(&zzz).is_none());
    }

    #[test]
    fn test_format_amount() {
        let engine = seeded(2);

        assert_eq!(engine.format_amount(dec!(1234.5), &Currency::jpy()), "1,235");
        assert!(!engine.format_amount(dec!(1234.5), &Currency::jpy()).contains('.'));
        assert_eq!(engine.format_amount(dec!(1.0), &Currency::eur()), "1.0000");
        assert_eq!(engine.format_amount(dec!(920.123456), &Currency::gbp()), "920.1235");
        assert_eq!(engine.format_amount(dec!(1234.567), &Currency::new("ZZZ")), "1234.57");
        assert_eq!(engine.format_amount(dec!(10), &Currency::usd()), "10.00");
    }

    #[test]
    fn test_conversions() {
        let engine = two_currency_engine();
        let usd = Currency::usd();
        let eur = Currency::eur();
        let gbp = Currency::gbp();

        let conversion = engine.convert(dec!(1000), &usd, &eur).unwrap();
        assert_eq!(conversion.result.value, dec!(850.00));
        assert_eq!(conversion.rate, dec!(0.85));

        let many = engine
            .convert_many(dec!(100), &usd, &[eur.clone(), gbp.clone()])
            .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].result.value, dec!(85.00));
        assert_eq!(many[1].result.value, dec!(73.00));

        assert_eq!(engine.convert_from_usd(dec!(200), &gbp).unwrap(), dec!(146.00));
        assert_eq!(engine.convert_from_usd(dec!(200), &usd).unwrap(), dec!(200));
    }

    #[test]
    fn test_out_of_range_conversions_are_errors() {
        let config = FxEngineConfig::with_table(vec![BaseCurrency::new("JPY", "¥", dec!(110))]);
        let engine = RateEngine::new(config).unwrap();
        let usd = Currency::usd();
        let jpy = Currency::jpy();

        assert!(matches!(
            engine.convert(Decimal::MAX, &usd, &jpy),
            Err(FxError::AmountOverflow { .. })
        ));
        assert!(engine.convert_many(Decimal::MAX, &usd, &[usd.clone(), jpy.clone()]).is_err());
        assert!(engine.convert_from_usd(Decimal::MAX, &jpy).is_err());
        assert_eq!(engine.convert_from_usd(Decimal::MAX, &usd).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_currencies_lists_usd_first() {
        let engine = two_currency_engine();
        assert_eq!(
            engine.currencies(),
            vec![Currency::usd(), Currency::eur(), Currency::gbp()]
        );
    }

    #[test]
    fn test_subscribers_see_new_snapshot() {
        let engine = seeded(4);
        let mut rx = engine.subscribe();
        assert_eq!(rx.borrow_and_update().generation(), 0);

        engine.regenerate();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().generation(), 1);
    }

    #[test]
    fn test_draw_is_within_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            let pct = draw_percent_change(&mut rng, dec!(2.0));
            assert!(pct >= dec!(-2.0) && pct <= dec!(2.0));
        }
    }

    proptest! {
        #[test]
        fn prop_identity_and_inverse(seed in any::<u64>(), ticks in 0usize..5) {
            let engine = seeded(seed);
            for _ in 0..ticks {
                engine.regenerate();
            }
            let usd = Currency::usd();
            prop_assert_eq!(engine.get_rate(&usd, &usd), Decimal::ONE);

            for code in engine.currencies().into_iter().skip(1) {
                prop_assert_eq!(engine.get_rate(&code, &code), Decimal::ONE);
                let product = engine.get_rate(&usd, &code) * engine.get_rate(&code, &usd);
                prop_assert!((product - Decimal::ONE).abs() < tolerance());
            }
        }

        #[test]
        fn prop_cross_rates_are_consistent(seed in any::<u64>(), a in 0usize..20, b in 0usize..20) {
            let engine = seeded(seed);
            let snapshot = engine.regenerate();
            let currencies = engine.currencies();
            let (x, y) = (&currencies[a + 1], &currencies[b + 1]);
            let usd = Currency::usd();

            let forward = snapshot.rate(x, y);
            let backward = snapshot.rate(y, x);
            prop_assert!((forward * backward - Decimal::ONE).abs() < tolerance());

            if x != y {
                // Both legs come from the same generation.
                prop_assert_eq!(forward, snapshot.rate(&usd, x) / snapshot.rate(&usd, y));
            }
        }

        #[test]
        fn prop_bounded_perturbation(seed in any::<u64>(), vol in 0u32..50) {
            let config = FxEngineConfig {
                volatility: Decimal::from(vol),
                seed: Some(seed),
                ..Default::default()
            };
            let engine = RateEngine::new(config).unwrap();
            let snapshot = engine.regenerate();
            for quote in snapshot.quotes() {
                prop_assert!(quote.percent_change.abs() <= Decimal::from(vol));
                prop_assert!(quote.current_rate > Decimal::ZERO);
            }
        }
    }
}
