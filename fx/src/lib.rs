//! fxdash FX Engine
//!
//! Synthetic exchange-rate engine behind the fxdash dashboard.
//!
//! # Features
//!
//! - Fixed reference table of USD-quoted base rates
//! - Bounded random regeneration with atomic snapshot replacement
//! - USD-pivoted direct, inverse and cross rates
//! - Cancelable periodic refresh task
//! - Display formatting, conversion history, trending board, rate alerts
//!   and portfolio valuation on top of the engine
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxdash_common::Currency;
//! use fxdash_fx::{FxEngineConfig, RateEngine};
//!
//! let engine = Arc::new(RateEngine::new(FxEngineConfig::default())?);
//! let refresh = engine.start_refresh();
//!
//! let rate = engine.get_rate(&Currency::eur(), &Currency::gbp());
//! println!("{}", engine.format_amount(rate, &Currency::gbp()));
//!
//! refresh.stop();
//! ```

pub mod alert;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod format;
pub mod portfolio;
pub mod quote;
pub mod scheduler;
pub mod table;
pub mod trending;

pub use alert::{AlertBook, AlertDirection, RateAlert, TriggeredAlert};
pub use config::FxEngineConfig;
pub use conversion::{Conversion, ConversionLog, ConversionService, InMemoryConversionLog};
pub use engine::RateEngine;
pub use error::{FxError, FxResult};
pub use portfolio::{Holding, HoldingValuation, Portfolio, PortfolioSummary};
pub use quote::{CurrencyQuote, QuoteSnapshot};
pub use scheduler::RefreshScheduler;
pub use table::BaseCurrency;
pub use trending::{Region, SortOrder, TrendingBoard, TrendingEntry};
