//! HTTP front-end for the strategy backtester
//!
//! Upload OHLCV data, pick a strategy and trade mode, run a backtest and
//! download the trade log.

pub mod app;
pub mod error;
pub mod logging;
pub mod routes;

pub use app::router;
pub use error::ApiError;
pub use routes::{AppState, BacktestRequest};
