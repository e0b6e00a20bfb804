//! Base strategy trait and strategy errors

use thiserror::Error;

use crate::data::CandleSeries;
use crate::strategy::{MovingAveragePair, ParamKind};
use crate::Result;

/// A crossover strategy.
///
/// Strategies differ only in which pair of series they derive from the
/// candles; signal evaluation and the position policy are shared.
pub trait Strategy: Send + Sync {
    /// Get strategy name
    fn name(&self) -> &str;

    /// Compute the fast/slow series, one entry per candle
    fn moving_averages(&self, candles: &CandleSeries) -> Result<MovingAveragePair>;
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Strategy '{0}' not found")]
    UnknownStrategy(String),

    #[error("Unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("Missing required parameter '{0}'")]
    MissingParam(String),

    #[error("Parameter '{name}' must be of type {expected:?}")]
    InvalidParamType { name: String, expected: ParamKind },

    #[error("Parameter '{name}' value {value} is outside the allowed range [{}, {}]",
        fmt_bound(.min), fmt_bound(.max))]
    OutOfRange {
        name: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("{0}")]
    InvalidParams(String),
}

fn fmt_bound(bound: &Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}
