//! Technical indicators module
//!
//! Provides technical analysis indicators using the `ta` crate.

pub mod ema;

pub use ema::*;

use thiserror::Error;

/// Indicator trait for all indicators
pub trait Indicator {
    /// Get the name of the indicator
    fn name(&self) -> &str;

    /// Update indicator with new value
    fn update(&mut self, value: f64);

    /// Get current indicator value
    fn value(&self) -> Option<f64>;

    /// Check if indicator is ready (has enough data)
    fn is_ready(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("{name} period must be positive, got {period}")]
    InvalidPeriod { name: &'static str, period: usize },
}
