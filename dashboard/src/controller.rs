//! Dashboard controller.

use std::sync::Arc;
use std::time::Duration;

use fxdash_common::Currency;
use fxdash_fx::{
    AlertBook, Conversion, ConversionService, FxError, InMemoryConversionLog, Portfolio,
    QuoteSnapshot, RateEngine, SortOrder, TrendingBoard,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::render;
use crate::request::{AlertRequest, HoldingRequest};

/// Conversion redone on every refresh.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub from: Currency,
    pub targets: Vec<Currency>,
}

/// Counters for one dashboard session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub refreshes: u64,
    pub conversions: u64,
    pub alerts_fired: u64,
}

/// Drives the panels from engine updates.
pub struct DashboardController {
    engine: Arc<RateEngine>,
    conversions: ConversionService,
    alerts: AlertBook,
    portfolio: Portfolio,
    conversion: Option<ConversionRequest>,
    sort: SortOrder,
    print_json: bool,
    stats: SessionStats,
}

impl DashboardController {
    pub fn new(engine: Arc<RateEngine>, sort: SortOrder, print_json: bool) -> Self {
        let conversions =
            ConversionService::new(engine.clone(), Arc::new(InMemoryConversionLog::new()));
        Self {
            engine,
            conversions,
            alerts: AlertBook::new(),
            portfolio: Portfolio::new(),
            conversion: None,
            sort,
            print_json,
            stats: SessionStats::default(),
        }
    }

    /// Register alerts, holdings and the conversion to track.
    pub fn initialize(
        &mut self,
        alerts: &[AlertRequest],
        holdings: &[HoldingRequest],
        conversion: Option<ConversionRequest>,
    ) -> anyhow::Result<()> {
        for alert in alerts {
            self.alerts
                .create(alert.pair.clone(), alert.target, alert.direction)?;
        }
        for holding in holdings {
            self.portfolio.add(
                holding.currency.clone(),
                holding.amount,
                holding.purchase_rate,
                None,
            )?;
        }

        if let Some(request) = &conversion {
            for code in std::iter::once(&request.from).chain(&request.targets) {
                if !self.engine.supports(code) {
                    warn!(currency = %code, "Unsupported currency, converting 1:1 via USD");
                }
            }
        }
        self.conversion = conversion;

        info!(
            alerts = self.alerts.active_count(),
            holdings = self.portfolio.len(),
            "Dashboard initialized"
        );
        Ok(())
    }

    /// Render every published generation until `duration` passes or
    /// Ctrl+C is received.
    pub async fn run(&mut self, duration: Option<Duration>) -> anyhow::Result<()> {
        let refresh = self.engine.start_refresh();
        let mut updates = self.engine.subscribe();

        let initial = self.engine.snapshot();
        self.on_snapshot(&initial).await?;

        let deadline = async move {
            match duration {
                Some(d) => {
                    tokio::time::sleep(d).await;
                    Ok(())
                }
                None => tokio::signal::ctrl_c().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                result = &mut deadline => {
                    result?;
                    break;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    self.on_snapshot(&snapshot).await?;
                }
            }
        }

        refresh.stop();
        Ok(())
    }

    async fn on_snapshot(&mut self, snapshot: &QuoteSnapshot) -> anyhow::Result<()> {
        self.stats.refreshes += 1;

        if self.print_json {
            println!("{}", serde_json::to_string_pretty(snapshot)?);
        } else {
            let board = TrendingBoard::from_snapshot(snapshot, self.sort);
            println!("{}", render::board(&board, &self.engine));
            println!("{}", render::regions(snapshot));
        }

        if let Some(request) = &self.conversion {
            let mut done = Vec::with_capacity(request.targets.len());
            for to in &request.targets {
                match self.conversions.convert(request.amount, &request.from, to).await {
                    Ok(conversion) => done.push(conversion),
                    Err(FxError::AmountOverflow { .. }) => {
                        warn!(from = %request.from, to = %to, "Conversion out of range, skipped");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            self.stats.conversions += done.len() as u64;
            println!("{}", render::conversions(&done, &self.engine));
        }

        let fired = self.alerts.evaluate(snapshot);
        if !fired.is_empty() {
            self.stats.alerts_fired += fired.len() as u64;
            println!("{}", render::alerts(&fired));
        }

        if !self.portfolio.is_empty() {
            match self.portfolio.valuation(snapshot) {
                Ok(summary) => println!("{}", render::portfolio(&summary)),
                Err(e) => warn!(error = %e, "Portfolio valuation skipped"),
            }
        }

        println!();
        Ok(())
    }

    pub fn engine(&self) -> &RateEngine {
        &self.engine
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Conversions recorded this session, newest first.
    pub async fn history(&self, limit: usize) -> anyhow::Result<Vec<Conversion>> {
        Ok(self.conversions.history(limit).await?)
    }

    pub fn active_alerts(&self) -> usize {
        self.alerts.active_count()
    }
}
