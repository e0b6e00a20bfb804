//! EMA (Exponential Moving Average) indicator

use crate::indicators::{Indicator, IndicatorError};
use ta::indicators::ExponentialMovingAverage;
use ta::Next;

/// EMA indicator wrapper
#[derive(Debug, Clone)]
pub struct EMA {
    inner: ExponentialMovingAverage,
    period: usize,
    update_count: usize,
    last_value: Option<f64>,
}

impl EMA {
    /// Create new EMA indicator
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        let inner = ExponentialMovingAverage::new(period)
            .map_err(|_| IndicatorError::InvalidPeriod { name: "EMA", period })?;
        Ok(Self {
            inner,
            period,
            update_count: 0,
            last_value: None,
        })
    }

    /// Get EMA period
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for EMA {
    fn name(&self) -> &str {
        "EMA"
    }

    fn update(&mut self, value: f64) {
        let ema_value = self.inner.next(value);
        self.update_count += 1;
        if self.update_count >= self.period {
            self.last_value = Some(ema_value);
        }
    }

    fn value(&self) -> Option<f64> {
        self.last_value
    }

    fn is_ready(&self) -> bool {
        self.update_count >= self.period
    }
}

/// Calculate EMA from a series of values.
///
/// The first `period - 1` entries are `None` while the average warms up.
pub fn calculate_ema(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    let mut ema = EMA::new(period)?;
    Ok(values
        .iter()
        .map(|&value| {
            ema.update(value);
            ema.value()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_up_is_masked() {
        let values = calculate_ema(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(values.len(), 5);
        assert!(values[0].is_none());
        assert!(values[1].is_none());
        assert!(values[2..].iter().all(Option::is_some));
    }

    #[test]
    fn test_constant_input_is_fixed_point() {
        let values = calculate_ema(&[7.5; 10], 4).unwrap();
        for value in values.into_iter().flatten() {
            assert!((value - 7.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_period_one_tracks_input() {
        let values = calculate_ema(&[3.0, 9.0, 1.0], 1).unwrap();
        assert_eq!(values, vec![Some(3.0), Some(9.0), Some(1.0)]);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(
            EMA::new(0),
            Err(IndicatorError::InvalidPeriod { period: 0, .. })
        ));
    }
}
