//! fxdash
//!
//! Terminal dashboard over the synthetic FX rate engine.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use fxdash_common::Currency;
use fxdash_fx::{FxEngineConfig, RateEngine, SortOrder};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod render;
mod request;

use controller::{ConversionRequest, DashboardController};
use request::{AlertRequest, HoldingRequest};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Change,
    Alphabetical,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Change => SortOrder::Change,
            SortArg::Alphabetical => SortOrder::Alphabetical,
        }
    }
}

/// fxdash CLI
#[derive(Parser, Debug)]
#[command(name = "fxdash")]
#[command(about = "Live synthetic exchange rates in the terminal")]
struct Args {
    /// Maximum perturbation per refresh, in percent (overrides FX_VOLATILITY)
    #[arg(long)]
    volatility: Option<Decimal>,

    /// Refresh period in seconds (overrides FX_REFRESH_INTERVAL_SECS)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Random seed for reproducible rates (overrides FX_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Run duration in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Board ordering
    #[arg(long, value_enum, default_value = "change")]
    sort: SortArg,

    /// Amount to convert on every refresh
    #[arg(long, requires = "to")]
    amount: Option<Decimal>,

    /// Source currency for --amount
    #[arg(long, default_value = "USD")]
    from: Currency,

    /// Target currency for --amount (repeatable)
    #[arg(long)]
    to: Vec<Currency>,

    /// Rate alert such as USD/EUR>0.86 (repeatable)
    #[arg(long)]
    alert: Vec<AlertRequest>,

    /// Holding such as EUR:1000@0.84 (repeatable)
    #[arg(long)]
    holding: Vec<HoldingRequest>,

    /// Print each snapshot as JSON instead of the board
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so the board on stdout stays readable.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let mut config = FxEngineConfig::from_env()?;
    if let Some(volatility) = args.volatility {
        config.volatility = volatility;
    }
    if let Some(secs) = args.interval {
        config.refresh_interval = Duration::from_secs(secs);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    info!("Starting fxdash");
    let engine = Arc::new(RateEngine::new(config)?);

    let conversion = args.amount.map(|amount| ConversionRequest {
        amount,
        from: args.from.clone(),
        targets: args.to.clone(),
    });

    let mut controller = DashboardController::new(engine, args.sort.into(), args.json);
    controller.initialize(&args.alert, &args.holding, conversion)?;

    let duration = if args.duration > 0 {
        Some(Duration::from_secs(args.duration))
    } else {
        info!("Press Ctrl+C to stop");
        None
    };
    controller.run(duration).await?;

    let recent = controller.history(5).await?;
    if !recent.is_empty() {
        println!("recent conversions:");
        println!("{}", render::conversions(&recent, controller.engine()));
    }

    let stats = controller.stats();
    info!(
        refreshes = stats.refreshes,
        conversions = stats.conversions,
        alerts_fired = stats.alerts_fired,
        alerts_pending = controller.active_alerts(),
        "fxdash stopped"
    );

    Ok(())
}
