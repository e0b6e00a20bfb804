//! Crate-wide error type

use thiserror::Error;

use crate::data::DataError;
use crate::indicators::IndicatorError;
use crate::strategy::{PolicyError, SignalError, StrategyError};

/// Any failure raised by the backtesting core
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("failed to export trades: {0}")]
    Export(String),
}

impl Error {
    /// Whether the error was caused by caller input rather than a defect
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Data(_) | Error::Strategy(_) | Error::Indicator(_)
        )
    }
}
