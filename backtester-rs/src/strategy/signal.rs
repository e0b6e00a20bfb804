//! Crossover signal evaluation
//!
//! Detects the bar at which a fast moving average crosses a slow one.
//! Evaluation is pure: the result depends only on the two values at
//! `index - 1` and `index`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crossover state at a single bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverSignal {
    /// No cross at this bar (including warm-up)
    #[default]
    None,
    /// Fast moved from at-or-below slow to strictly above it
    Bullish,
    /// Fast moved from at-or-above slow to strictly below it
    Bearish,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("moving average series differ in length: fast={fast}, slow={slow}")]
    LengthMismatch { fast: usize, slow: usize },

    #[error("signal index {index} out of range for series of length {len} (expected 1..{len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Fast and slow moving averages aligned by bar index.
///
/// Entries are `None` until the corresponding lookback window is filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAveragePair {
    fast: Vec<Option<f64>>,
    slow: Vec<Option<f64>>,
}

impl MovingAveragePair {
    pub fn new(fast: Vec<Option<f64>>, slow: Vec<Option<f64>>) -> Result<Self, SignalError> {
        if fast.len() != slow.len() {
            return Err(SignalError::LengthMismatch {
                fast: fast.len(),
                slow: slow.len(),
            });
        }
        Ok(Self { fast, slow })
    }

    /// Build a pair from fully-defined series
    pub fn from_values(fast: &[f64], slow: &[f64]) -> Result<Self, SignalError> {
        Self::new(
            fast.iter().copied().map(Some).collect(),
            slow.iter().copied().map(Some).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }

    pub fn fast(&self) -> &[Option<f64>] {
        &self.fast
    }

    pub fn slow(&self) -> &[Option<f64>] {
        &self.slow
    }

    /// Signal at a single bar
    pub fn signal_at(&self, index: usize) -> Result<CrossoverSignal, SignalError> {
        evaluate(&self.fast, &self.slow, index)
    }

    /// Signal at every bar; bar 0 never carries a signal
    pub fn signals(&self) -> Vec<CrossoverSignal> {
        evaluate_all(self)
    }
}

/// Evaluate the crossover at `index` (`1 <= index < len`).
///
/// A missing or NaN value at either bar yields [`CrossoverSignal::None`].
pub fn evaluate(
    fast: &[Option<f64>],
    slow: &[Option<f64>],
    index: usize,
) -> Result<CrossoverSignal, SignalError> {
    if fast.len() != slow.len() {
        return Err(SignalError::LengthMismatch {
            fast: fast.len(),
            slow: slow.len(),
        });
    }
    if index == 0 || index >= fast.len() {
        return Err(SignalError::IndexOutOfRange {
            index,
            len: fast.len(),
        });
    }

    let defined = |v: Option<f64>| v.filter(|x| !x.is_nan());
    let values = (
        defined(fast[index - 1]),
        defined(slow[index - 1]),
        defined(fast[index]),
        defined(slow[index]),
    );
    let (Some(prev_fast), Some(prev_slow), Some(fast_now), Some(slow_now)) = values else {
        return Ok(CrossoverSignal::None);
    };

    let signal = if prev_fast <= prev_slow && fast_now > slow_now {
        CrossoverSignal::Bullish
    } else if prev_fast >= prev_slow && fast_now < slow_now {
        CrossoverSignal::Bearish
    } else {
        CrossoverSignal::None
    };
    Ok(signal)
}

/// Evaluate every bar of a pair
pub fn evaluate_all(pair: &MovingAveragePair) -> Vec<CrossoverSignal> {
    let mut signals = Vec::with_capacity(pair.len());
    if pair.is_empty() {
        return signals;
    }
    signals.push(CrossoverSignal::None);
    signals.extend((1..pair.len()).map(|i| {
        // Lengths were checked in the constructor and i is in range
        evaluate(&pair.fast, &pair.slow, i).unwrap_or_default()
    }));
    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_cross_up_then_down() {
        let fast = defined(&[1.0, 1.0, 3.0, 2.0]);
        let slow = defined(&[2.0, 2.0, 2.0, 2.0]);

        assert_eq!(evaluate(&fast, &slow, 1), Ok(CrossoverSignal::None));
        assert_eq!(evaluate(&fast, &slow, 2), Ok(CrossoverSignal::Bullish));
        // Touching the slow line is not a cross below it
        assert_eq!(evaluate(&fast, &slow, 3), Ok(CrossoverSignal::None));
    }

    #[test]
    fn test_cross_from_equal() {
        let fast = defined(&[2.0, 3.0, 2.0, 1.0]);
        let slow = defined(&[2.0, 2.0, 2.0, 2.0]);

        assert_eq!(evaluate(&fast, &slow, 1), Ok(CrossoverSignal::Bullish));
        assert_eq!(evaluate(&fast, &slow, 2), Ok(CrossoverSignal::None));
        assert_eq!(evaluate(&fast, &slow, 3), Ok(CrossoverSignal::Bearish));
    }

    #[test]
    fn test_missing_values_give_no_signal() {
        let fast = vec![None, Some(1.0), Some(3.0), Some(f64::NAN), Some(1.0)];
        let slow = defined(&[2.0, 2.0, 2.0, 2.0, 2.0]);

        assert_eq!(evaluate(&fast, &slow, 1), Ok(CrossoverSignal::None));
        assert_eq!(evaluate(&fast, &slow, 2), Ok(CrossoverSignal::Bullish));
        assert_eq!(evaluate(&fast, &slow, 3), Ok(CrossoverSignal::None));
        assert_eq!(evaluate(&fast, &slow, 4), Ok(CrossoverSignal::None));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let fast = defined(&[1.0, 2.0]);
        let slow = defined(&[1.0, 2.0, 3.0]);
        assert_eq!(
            evaluate(&fast, &slow, 1),
            Err(SignalError::LengthMismatch { fast: 2, slow: 3 })
        );
        assert!(MovingAveragePair::new(fast.clone(), slow).is_err());

        assert_eq!(
            evaluate(&fast, &fast, 0),
            Err(SignalError::IndexOutOfRange { index: 0, len: 2 })
        );
        assert_eq!(
            evaluate(&fast, &fast, 2),
            Err(SignalError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_evaluate_all_matches_single_evaluation() {
        let pair = MovingAveragePair::from_values(&[1.0, 1.0, 3.0, 1.5], &[2.0; 4]).unwrap();
        let signals = pair.signals();

        assert_eq!(
            signals,
            vec![
                CrossoverSignal::None,
                CrossoverSignal::None,
                CrossoverSignal::Bullish,
                CrossoverSignal::Bearish,
            ]
        );
        for (i, signal) in signals.iter().enumerate().skip(1) {
            assert_eq!(pair.signal_at(i).unwrap(), *signal);
        }
    }

    #[test]
    fn test_evaluate_all_on_short_series() {
        let empty = MovingAveragePair::new(Vec::new(), Vec::new()).unwrap();
        assert!(empty.signals().is_empty());

        let single = MovingAveragePair::from_values(&[1.0], &[2.0]).unwrap();
        assert_eq!(single.signals(), vec![CrossoverSignal::None]);
    }
}
