//! Data management module
//!
//! Handles OHLCV candle structures and CSV loading/validation.

pub mod candle;
pub mod loader;

pub use candle::*;
pub use loader::*;
