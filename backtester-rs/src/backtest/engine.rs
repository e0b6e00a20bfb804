//! Backtesting engine

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::data::{Candle, CandleSeries};
use crate::strategy::{
    Action, CrossoverSignal, PositionPolicy, PositionState, Strategy, TradeMode,
};
use crate::Result;

/// Run-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Starting cash
    pub initial_cash: f64,
    /// Commission per fill, as a fraction of notional (0.001 = 0.1%)
    pub commission: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: 100_000.0,
            commission: 0.001,
        }
    }
}

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    fn sign(self) -> f64 {
        match self {
            TradeSide::Long => 1.0,
            TradeSide::Short => -1.0,
        }
    }
}

/// Why a trade was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Closed (or flipped) by a crossover
    Signal,
    /// Still open on the last bar and closed there
    EndOfData,
}

/// Trade record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub side: TradeSide,
    pub entry_bar: usize,
    pub exit_bar: usize,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Entry plus exit commission
    pub commission: f64,
    /// Net of commission
    pub pnl: f64,
    /// Net P&L relative to entry notional, in percent
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

/// A non-hold decision taken during the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub bar: usize,
    pub timestamp: NaiveDateTime,
    pub signal: CrossoverSignal,
    pub action: Action,
    pub price: f64,
    /// Position held after the action
    pub position: PositionState,
}

/// Mark-to-market equity at the close of one bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub position: PositionState,
}

/// Run bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub strategy: String,
    pub trade_mode: TradeMode,
    pub initial_cash: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub num_trades: usize,
    pub bars: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// Backtest result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub summary: BacktestSummary,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub actions: Vec<ActionRecord>,
}

#[derive(Debug, Clone)]
struct OpenPosition {
    side: TradeSide,
    entry_bar: usize,
    entry_time: NaiveDateTime,
    entry_price: f64,
    quantity: f64,
    entry_commission: f64,
}

impl OpenPosition {
    fn unrealized(&self, price: f64) -> f64 {
        self.side.sign() * self.quantity * (price - self.entry_price)
    }
}

/// Cash and the single open position of one run
struct Ledger {
    commission: f64,
    cash: f64,
    position: Option<OpenPosition>,
    trades: Vec<Trade>,
}

impl Ledger {
    fn new(config: &BacktestConfig) -> Self {
        Self {
            commission: config.commission,
            cash: config.initial_cash,
            position: None,
            trades: Vec::new(),
        }
    }

    fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.unrealized(price))
    }

    /// Commit all equity to a new position at `candle.close`.
    ///
    /// Returns `false` without filling when cash or price is not positive.
    fn open(&mut self, side: TradeSide, bar: usize, candle: &Candle) -> bool {
        let price = candle.close;
        if self.cash <= 0.0 || price <= 0.0 {
            warn!(bar, cash = self.cash, price, "Cannot open position, skipping entry");
            return false;
        }
        let notional = self.cash / (1.0 + self.commission);
        let fee = notional * self.commission;
        self.cash -= fee;
        self.position = Some(OpenPosition {
            side,
            entry_bar: bar,
            entry_time: candle.timestamp,
            entry_price: price,
            quantity: notional / price,
            entry_commission: fee,
        });
        true
    }

    /// Close the open position, if any; returns whether a fill happened
    fn close(&mut self, bar: usize, candle: &Candle, reason: ExitReason) -> bool {
        let Some(position) = self.position.take() else {
            return false;
        };
        let price = candle.close;
        let gross = position.unrealized(price);
        let exit_fee = position.quantity * price * self.commission;
        self.cash += gross - exit_fee;

        let commission = position.entry_commission + exit_fee;
        let pnl = gross - commission;
        let entry_notional = position.quantity * position.entry_price;
        self.trades.push(Trade {
            id: Uuid::new_v4(),
            side: position.side,
            entry_bar: position.entry_bar,
            exit_bar: bar,
            entry_time: position.entry_time,
            exit_time: candle.timestamp,
            entry_price: position.entry_price,
            exit_price: price,
            quantity: position.quantity,
            commission,
            pnl,
            return_pct: pnl / entry_notional * 100.0,
            exit_reason: reason,
        });
        true
    }

    /// Hold `side`, closing the opposite side first if needed.
    ///
    /// Returns the action actually filled: `opened` when the entry went
    /// through, `Close` when only the opposite side was closed.
    fn enter(
        &mut self,
        side: TradeSide,
        opened: Action,
        bar: usize,
        candle: &Candle,
    ) -> Option<Action> {
        let closed = match self.position.as_ref().map(|p| p.side) {
            Some(held) if held == side => return None,
            Some(_) => self.close(bar, candle, ExitReason::Signal),
            None => false,
        };
        if self.open(side, bar, candle) {
            Some(opened)
        } else {
            closed.then_some(Action::Close)
        }
    }

    fn state(&self) -> PositionState {
        match self.position.as_ref().map(|p| p.side) {
            Some(TradeSide::Long) => PositionState::Long,
            Some(TradeSide::Short) => PositionState::Short,
            None => PositionState::Flat,
        }
    }
}

/// Backtesting engine.
///
/// Fills happen at the bar close with no slippage. Each run owns its own
/// position policy, so one engine can serve concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create new backtest engine
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run backtest
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        mode: TradeMode,
        candles: &CandleSeries,
    ) -> Result<BacktestResult> {
        info!(
            strategy = strategy.name(),
            %mode,
            bars = candles.len(),
            initial_cash = self.config.initial_cash,
            "Starting backtest"
        );

        let pair = strategy.moving_averages(candles)?;
        let mut policy = PositionPolicy::new(mode);
        let mut ledger = Ledger::new(&self.config);
        let mut equity_curve = Vec::with_capacity(candles.len());
        let mut actions = Vec::new();

        for (bar, candle) in candles.candles().iter().enumerate() {
            if bar > 0 {
                let signal = pair.signal_at(bar)?;
                let filled = match policy.step(signal)? {
                    Action::OpenLong => {
                        ledger.enter(TradeSide::Long, Action::OpenLong, bar, candle)
                    }
                    Action::OpenShort => {
                        ledger.enter(TradeSide::Short, Action::OpenShort, bar, candle)
                    }
                    Action::Close => ledger
                        .close(bar, candle, ExitReason::Signal)
                        .then_some(Action::Close),
                    Action::Hold => None,
                };
                // An entry that could not be filled leaves the run flat
                if ledger.state() != policy.state() {
                    policy.reset();
                }
                if let Some(action) = filled {
                    actions.push(ActionRecord {
                        bar,
                        timestamp: candle.timestamp,
                        signal,
                        action,
                        price: candle.close,
                        position: policy.state(),
                    });
                }
            }

            equity_curve.push(EquityPoint {
                timestamp: candle.timestamp,
                equity: ledger.equity(candle.close),
                position: policy.state(),
            });
        }

        if let Some(last) = candles.last() {
            if ledger.position.is_some() {
                debug!(state = ?policy.state(), "Closing position left open at end of data");
                ledger.close(candles.len() - 1, last, ExitReason::EndOfData);
                policy.reset();
                if let Some(point) = equity_curve.last_mut() {
                    point.equity = ledger.cash;
                    point.position = PositionState::Flat;
                }
            }
        }

        let final_equity = ledger.cash;
        let summary = BacktestSummary {
            strategy: strategy.name().to_string(),
            trade_mode: mode,
            initial_cash: self.config.initial_cash,
            final_equity,
            total_return_pct: (final_equity - self.config.initial_cash) / self.config.initial_cash
                * 100.0,
            num_trades: ledger.trades.len(),
            bars: candles.len(),
            start: candles.first().map(|c| c.timestamp),
            end: candles.last().map(|c| c.timestamp),
        };

        info!(
            trades = summary.num_trades,
            final_equity = summary.final_equity,
            return_pct = summary.total_return_pct,
            "Backtest finished"
        );

        Ok(BacktestResult {
            summary,
            trades: ledger.trades,
            equity_curve,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MovingAveragePair;
    use chrono::NaiveDate;

    /// Replays fixed fast/slow series regardless of the candles
    struct Scripted {
        fast: Vec<f64>,
        slow: Vec<f64>,
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn moving_averages(&self, _candles: &CandleSeries) -> Result<MovingAveragePair> {
            Ok(MovingAveragePair::from_values(&self.fast, &self.slow)?)
        }
    }

    fn candles(closes: &[f64]) -> CandleSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(start + chrono::Duration::days(i as i64), c, c, c, c, 1.0)
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn frictionless(cash: f64) -> BacktestEngine {
        BacktestEngine::new(BacktestConfig {
            initial_cash: cash,
            commission: 0.0,
        })
    }

    #[test]
    fn test_long_round_trip() {
        let strategy = Scripted {
            fast: vec![1.0, 3.0, 3.0, 1.0],
            slow: vec![2.0; 4],
        };
        let result = frictionless(1000.0)
            .run(&strategy, TradeMode::OnlyBuy, &candles(&[10.0, 10.0, 12.0, 15.0]))
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, TradeSide::Long);
        assert_eq!((trade.entry_bar, trade.exit_bar), (1, 3));
        assert!((trade.pnl - 500.0).abs() < 1e-9);
        assert!((trade.return_pct - 50.0).abs() < 1e-9);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert!((result.summary.final_equity - 1500.0).abs() < 1e-9);
        assert!((result.summary.total_return_pct - 50.0).abs() < 1e-9);
        assert_eq!(result.equity_curve.len(), 4);
        assert!((result.equity_curve[2].equity - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_flip_records_two_trades() {
        let strategy = Scripted {
            fast: vec![1.0, 3.0, 1.0, 1.0],
            slow: vec![2.0; 4],
        };
        let result = frictionless(1000.0)
            .run(&strategy, TradeMode::Both, &candles(&[10.0, 10.0, 20.0, 10.0]))
            .unwrap();

        let sides: Vec<_> = result.trades.iter().map(|t| t.side).collect();
        assert_eq!(sides, vec![TradeSide::Long, TradeSide::Short]);
        assert_eq!(result.trades[1].exit_reason, ExitReason::EndOfData);
        // Long doubles to 2000, short from 20 to 10 gains another 1000
        assert!((result.summary.final_equity - 3000.0).abs() < 1e-9);
        assert_eq!(
            result.actions.iter().map(|a| a.action).collect::<Vec<_>>(),
            vec![Action::OpenLong, Action::OpenShort]
        );
        let last = result.equity_curve.last().unwrap();
        assert_eq!(last.position, PositionState::Flat);
        assert!((last.equity - 3000.0).abs() < 1e-9);
    }

    fn positions(result: &BacktestResult) -> Vec<PositionState> {
        result.equity_curve.iter().map(|p| p.position).collect()
    }

    #[test]
    fn test_exhausted_cash_skips_entry() {
        // Short at 10, squeezed to 30: cash ends at -1000
        let strategy = Scripted {
            fast: vec![3.0, 1.0, 3.0, 1.0, 3.0],
            slow: vec![2.0; 5],
        };
        let result = frictionless(1000.0)
            .run(
                &strategy,
                TradeMode::OnlySell,
                &candles(&[10.0, 10.0, 30.0, 30.0, 30.0]),
            )
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(
            result.actions.iter().map(|a| a.action).collect::<Vec<_>>(),
            vec![Action::OpenShort, Action::Close]
        );
        assert_eq!(result.actions.len(), result.trades.len() * 2);
        assert_eq!(
            positions(&result),
            vec![
                PositionState::Flat,
                PositionState::Short,
                PositionState::Flat,
                PositionState::Flat,
                PositionState::Flat,
            ]
        );
        assert!((result.summary.final_equity + 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_price_skips_entry() {
        let strategy = Scripted {
            fast: vec![1.0, 1.0, 3.0, 3.0],
            slow: vec![2.0; 4],
        };
        let result = frictionless(1000.0)
            .run(&strategy, TradeMode::OnlyBuy, &candles(&[10.0, 10.0, 0.0, 5.0]))
            .unwrap();

        assert!(result.trades.is_empty());
        assert!(result.actions.is_empty());
        assert!(positions(&result).iter().all(|p| *p == PositionState::Flat));
        assert_eq!(result.summary.final_equity, 1000.0);
    }

    #[test]
    fn test_flip_without_cash_only_closes() {
        let strategy = Scripted {
            fast: vec![3.0, 1.0, 3.0, 3.0],
            slow: vec![2.0; 4],
        };
        let result = frictionless(1000.0)
            .run(&strategy, TradeMode::Both, &candles(&[10.0, 10.0, 30.0, 30.0]))
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].side, TradeSide::Short);
        let recorded: Vec<_> = result.actions.iter().map(|a| (a.action, a.position)).collect();
        assert_eq!(
            recorded,
            vec![
                (Action::OpenShort, PositionState::Short),
                (Action::Close, PositionState::Flat),
            ]
        );
        assert_eq!(result.equity_curve[3].position, PositionState::Flat);
    }

    #[test]
    fn test_commission_is_charged_per_fill() {
        let strategy = Scripted {
            fast: vec![1.0, 3.0, 1.0],
            slow: vec![2.0; 3],
        };
        let engine = BacktestEngine::new(BacktestConfig {
            initial_cash: 1001.0,
            commission: 0.001,
        });
        let result = engine
            .run(&strategy, TradeMode::OnlyBuy, &candles(&[10.0, 10.0, 10.0]))
            .unwrap();

        let trade = &result.trades[0];
        // 1000 notional: 1.0 in at entry, 1.0 out at exit
        assert!((trade.commission - 2.0).abs() < 1e-9);
        assert!((trade.pnl + 2.0).abs() < 1e-9);
        assert!((result.summary.final_equity - 999.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_signals_means_no_trades() {
        let strategy = Scripted {
            fast: vec![1.0; 3],
            slow: vec![2.0; 3],
        };
        let result = BacktestEngine::default()
            .run(&strategy, TradeMode::Both, &candles(&[1.0, 2.0, 3.0]))
            .unwrap();

        assert!(result.trades.is_empty());
        assert!(result.actions.is_empty());
        assert_eq!(result.summary.final_equity, 100_000.0);
        assert_eq!(result.summary.bars, 3);
    }

    #[test]
    fn test_short_series_is_an_error() {
        let strategy = Scripted {
            fast: vec![1.0, 3.0],
            slow: vec![2.0, 2.0],
        };
        let result = BacktestEngine::default().run(&strategy, TradeMode::Both, &candles(&[1.0, 2.0, 3.0]));
        assert!(result.is_err());
    }
}
