//! Engine configuration.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{FxError, FxResult};
use crate::table::{reference_table, validate_table, BaseCurrency};

/// Configuration for the rate engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Maximum size of one perturbation, in percent.
    pub volatility: Decimal,
    /// Period of the background refresh task.
    pub refresh_interval: Duration,
    /// Reference table the quotes are generated around.
    pub base_table: Vec<BaseCurrency>,
    /// Seed for the random source. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            volatility: dec!(2.0),
            refresh_interval: Duration::from_secs(30),
            base_table: reference_table(),
            seed: None,
        }
    }
}

impl FxEngineConfig {
    /// Config with the default parameters and a custom table.
    pub fn with_table(base_table: Vec<BaseCurrency>) -> Self {
        Self {
            base_table,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `FX_VOLATILITY`, `FX_REFRESH_INTERVAL_SECS` and `FX_SEED`.
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> FxResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("FX_VOLATILITY") {
            config.volatility = Decimal::from_str(raw.trim())
                .map_err(|e| FxError::Config(format!("FX_VOLATILITY={raw:?}: {e}")))?;
        }

        if let Ok(raw) = std::env::var("FX_REFRESH_INTERVAL_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| FxError::Config(format!("FX_REFRESH_INTERVAL_SECS={raw:?}: {e}")))?;
            config.refresh_interval = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("FX_SEED") {
            let seed: u64 = raw
                .trim()
                .parse()
                .map_err(|e| FxError::Config(format!("FX_SEED={raw:?}: {e}")))?;
            config.seed = Some(seed);
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        // At 100% a draw could push a rate to zero.
        if self.volatility < Decimal::ZERO || self.volatility >= Decimal::ONE_HUNDRED {
            return Err(FxError::InvalidVolatility(self.volatility));
        }

        if self.refresh_interval.is_zero() {
            return Err(FxError::InvalidRefreshInterval);
        }

        validate_table(&self.base_table)
    }
}
