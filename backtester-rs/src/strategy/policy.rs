//! Trade-mode position policy
//!
//! Translates crossover signals into position actions. The mode fixes which
//! sides may be held for the whole run:
//!
//! | mode     | reachable states     |
//! |----------|----------------------|
//! | OnlyBuy  | Flat, Long           |
//! | OnlySell | Flat, Short          |
//! | Both     | Flat, Long, Short    |
//!
//! A signal opposite to the held side closes it (or flips it under `Both`);
//! a signal with nothing to do is a `Hold`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::strategy::CrossoverSignal;

/// Which position directions a run may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeMode {
    #[serde(rename = "Only_Buy", alias = "only_buy")]
    OnlyBuy,
    #[serde(rename = "Only_Sell", alias = "only_sell")]
    OnlySell,
    #[serde(rename = "Both_Buy_Sell", alias = "both")]
    Both,
}

impl TradeMode {
    pub const ALL: [TradeMode; 3] = [TradeMode::OnlyBuy, TradeMode::OnlySell, TradeMode::Both];

    /// Wire label shown to users
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeMode::OnlyBuy => "Only_Buy",
            TradeMode::OnlySell => "Only_Sell",
            TradeMode::Both => "Both_Buy_Sell",
        }
    }

    /// Whether `state` can ever be held under this mode
    pub fn allows(&self, state: PositionState) -> bool {
        !matches!(
            (self, state),
            (TradeMode::OnlyBuy, PositionState::Short) | (TradeMode::OnlySell, PositionState::Long)
        )
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Only_Buy" | "only_buy" => Ok(TradeMode::OnlyBuy),
            "Only_Sell" | "only_sell" => Ok(TradeMode::OnlySell),
            "Both_Buy_Sell" | "both" => Ok(TradeMode::Both),
            other => Err(PolicyError::UnknownTradeMode(other.to_string())),
        }
    }
}

/// Position currently held by a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

/// Decision emitted for one bar.
///
/// `OpenLong` while short and `OpenShort` while long are flips: the engine
/// closes the held side before opening the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    OpenLong,
    OpenShort,
    Close,
    Hold,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("position {state:?} is unreachable under trade mode {mode}")]
    UnreachableState { mode: TradeMode, state: PositionState },

    #[error("unknown trade mode '{0}' (expected Only_Buy, Only_Sell or Both_Buy_Sell)")]
    UnknownTradeMode(String),
}

/// Decide the action for `signal` given the mode and the held position.
///
/// Returns the action together with the position held afterwards. A
/// `(mode, current)` pair the table can never produce is a caller defect
/// and is reported as [`PolicyError::UnreachableState`].
pub fn decide(
    signal: CrossoverSignal,
    mode: TradeMode,
    current: PositionState,
) -> Result<(Action, PositionState), PolicyError> {
    use Action::*;
    use CrossoverSignal as S;
    use PositionState::*;

    if !mode.allows(current) {
        return Err(PolicyError::UnreachableState {
            mode,
            state: current,
        });
    }

    let decision = match (mode, current, signal) {
        (_, state, S::None) => (Hold, state),

        (TradeMode::OnlyBuy, Flat, S::Bullish) => (OpenLong, Long),
        (TradeMode::OnlyBuy, Long, S::Bearish) => (Close, Flat),

        (TradeMode::OnlySell, Flat, S::Bearish) => (OpenShort, Short),
        (TradeMode::OnlySell, Short, S::Bullish) => (Close, Flat),

        (TradeMode::Both, Flat | Short, S::Bullish) => (OpenLong, Long),
        (TradeMode::Both, Flat | Long, S::Bearish) => (OpenShort, Short),

        (_, state, _) => (Hold, state),
    };
    Ok(decision)
}

/// Owns the position state of a single run
#[derive(Debug, Clone)]
pub struct PositionPolicy {
    mode: TradeMode,
    state: PositionState,
}

impl PositionPolicy {
    /// Start a run flat
    pub fn new(mode: TradeMode) -> Self {
        Self {
            mode,
            state: PositionState::Flat,
        }
    }

    pub fn mode(&self) -> TradeMode {
        self.mode
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Apply one signal and advance the held position
    pub fn step(&mut self, signal: CrossoverSignal) -> Result<Action, PolicyError> {
        let (action, next) = decide(signal, self.mode, self.state)?;
        if action != Action::Hold {
            debug!(
                mode = %self.mode,
                ?signal,
                from = ?self.state,
                to = ?next,
                ?action,
                "Position decision"
            );
        }
        self.state = next;
        Ok(action)
    }

    /// Return to `Flat` without a signal, used when an entry could not be filled
    pub fn reset(&mut self) {
        if self.state != PositionState::Flat {
            debug!(mode = %self.mode, from = ?self.state, "Position reset to flat");
        }
        self.state = PositionState::Flat;
    }
}
