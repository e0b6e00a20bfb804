//! Backtester-RS: moving-average crossover backtesting core
//!
//! This crate holds everything a front-end needs to turn an uploaded OHLCV
//! file into a backtest:
//!
//! # Features
//!
//! - **Data Management**: OHLCV CSV loading and validation
//! - **Technical Indicators**: EMA via [ta-rs](https://github.com/greyblake/ta-rs)
//! - **Signal Evaluation**: fast/slow crossover detection
//! - **Position Policy**: trade-mode aware open/close/flip decisions
//! - **Strategy Registry**: named strategies with typed parameter schemas
//! - **Backtesting**: a per-bar run loop with trade log and CSV export
//!
//! # Example
//!
//! ```no_run
//! use backtester_rs::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let candles = load_csv_str(&std::fs::read_to_string("prices.csv")?)?;
//!     let registry = StrategyRegistry::new();
//!     let strategy = registry.create("EMA Crossover", &StrategyParams::new())?;
//!     let engine = BacktestEngine::new(BacktestConfig::default());
//!     let result = engine.run(strategy.as_ref(), TradeMode::Both, &candles)?;
//!     println!("{}", BacktestReport::new(result).format());
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod data;
pub mod error;
pub mod indicators;
pub mod strategy;

pub use error::Error;

// Re-export commonly used types
pub mod prelude {
    pub use crate::backtest::*;
    pub use crate::data::*;
    pub use crate::error::*;
    pub use crate::indicators::*;
    pub use crate::strategy::*;
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
