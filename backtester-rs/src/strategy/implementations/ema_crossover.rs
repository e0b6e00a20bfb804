//! EMA crossover strategy

use tracing::debug;

use crate::data::CandleSeries;
use crate::indicators::calculate_ema;
use crate::strategy::{
    int_param, MovingAveragePair, ParamSchema, ParamSpec, Strategy, StrategyError, StrategyParams,
};
use crate::Result;

/// Fast/slow exponential moving averages of the close
#[derive(Debug, Clone)]
pub struct EmaCrossover {
    fast_period: usize,
    slow_period: usize,
}

impl EmaCrossover {
    pub const NAME: &'static str = "EMA Crossover";

    pub fn new(fast_period: usize, slow_period: usize) -> std::result::Result<Self, StrategyError> {
        if fast_period == 0 || slow_period == 0 {
            return Err(StrategyError::InvalidParams(
                "EMA periods must be positive.".to_string(),
            ));
        }
        if fast_period >= slow_period {
            return Err(StrategyError::InvalidParams(
                "Fast EMA must be smaller than Slow EMA.".to_string(),
            ));
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }

    pub fn schema() -> ParamSchema {
        vec![
            ParamSpec::int("fast_ema", 12, 1, 100, "Fast EMA period"),
            ParamSpec::int("slow_ema", 26, 2, 200, "Slow EMA period"),
        ]
    }

    /// Build from parameters already resolved against [`EmaCrossover::schema`]
    pub fn from_params(params: &StrategyParams) -> std::result::Result<Self, StrategyError> {
        let period = |name: &str| int_param(params, name).map(|v| v.max(0) as usize);
        Self::new(period("fast_ema")?, period("slow_ema")?)
    }

    pub fn fast_period(&self) -> usize {
        self.fast_period
    }

    pub fn slow_period(&self) -> usize {
        self.slow_period
    }
}

impl Default for EmaCrossover {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
        }
    }
}

impl Strategy for EmaCrossover {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn moving_averages(&self, candles: &CandleSeries) -> Result<MovingAveragePair> {
        let closes = candles.closes();
        let fast = calculate_ema(&closes, self.fast_period)?;
        let slow = calculate_ema(&closes, self.slow_period)?;
        debug!(
            fast_period = self.fast_period,
            slow_period = self.slow_period,
            bars = closes.len(),
            "Computed EMA pair"
        );
        Ok(MovingAveragePair::new(fast, slow)?)
    }
}
