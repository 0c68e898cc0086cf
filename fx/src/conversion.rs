//! Currency conversion records and conversion history.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use fxdash_common::{Currency, CurrencyPair, Money, RecordId, Timestamp};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::engine::RateEngine;
use crate::error::{checked_product, FxResult};

/// A completed currency conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: RecordId,
    /// Input amount.
    pub amount: Money,
    /// Output amount.
    pub result: Money,
    /// Rate applied: units of the target per unit of the source.
    pub rate: Decimal,
    /// When the conversion was executed.
    pub executed_at: Timestamp,
}

impl Conversion {
    /// Create a conversion of `amount` into `to` at `rate`.
    pub fn new(amount: Money, to: Currency, rate: Decimal) -> FxResult<Self> {
        let result = Money::new(checked_product(amount.value, rate)?, to);
        Ok(Self {
            id: RecordId::new(),
            amount,
            result,
            rate,
            executed_at: fxdash_common::now(),
        })
    }

    /// Source currency.
    pub fn from_currency(&self) -> &Currency {
        &self.amount.currency
    }

    /// Target currency.
    pub fn to_currency(&self) -> &Currency {
        &self.result.currency
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.amount.currency.clone(), self.result.currency.clone())
    }
}

/// Store for conversion history.
#[async_trait]
pub trait ConversionLog: Send + Sync {
    /// Persist a conversion.
    async fn record(&self, conversion: &Conversion) -> FxResult<()>;

    /// Most recent conversions, newest first.
    async fn recent(&self, limit: usize) -> FxResult<Vec<Conversion>>;

    /// Number of stored conversions.
    async fn len(&self) -> FxResult<usize>;
}

/// Process-local conversion history.
///
/// Keeps the most recent `capacity` conversions; older ones are dropped.
pub struct InMemoryConversionLog {
    entries: RwLock<VecDeque<Conversion>>,
    capacity: usize,
}

impl InMemoryConversionLog {
    /// Entries kept by [`InMemoryConversionLog::new`].
    pub const DEFAULT_CAPACITY: usize = 1_000;

    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create an empty log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryConversionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversionLog for InMemoryConversionLog {
    async fn record(&self, conversion: &Conversion) -> FxResult<()> {
        let mut entries = self.entries.write();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(conversion.clone());
        debug!(conversion_id = %conversion.id, "Conversion recorded");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> FxResult<Vec<Conversion>> {
        Ok(self.entries.read().iter().rev().take(limit).cloned().collect())
    }

    async fn len(&self) -> FxResult<usize> {
        Ok(self.entries.read().len())
    }
}

/// Converter backed by the engine, recording each conversion.
pub struct ConversionService {
    engine: Arc<RateEngine>,
    log: Arc<dyn ConversionLog>,
}

impl ConversionService {
    /// Create a new conversion service.
    pub fn new(engine: Arc<RateEngine>, log: Arc<dyn ConversionLog>) -> Self {
        Self { engine, log }
    }

    /// Convert at the current rate and record the result.
    #[instrument(skip(self), fields(from = %from, to = %to, amount = %amount))]
    pub async fn convert(&self, amount: Decimal, from: &Currency, to: &Currency) -> FxResult<Conversion> {
        let conversion = self.engine.convert(amount, from, to)?;
        self.log.record(&conversion).await?;

        info!(
            conversion_id = %conversion.id,
            rate = %conversion.rate,
            result = %conversion.result,
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Recent history, newest first.
    pub async fn history(&self, limit: usize) -> FxResult<Vec<Conversion>> {
        self.log.recent(limit).await
    }
}
