//! Backtest report generation and trade export

use crate::backtest::{BacktestResult, Trade};
use crate::{Error, Result};

/// Column order of the exported trade log; mirrors the fields of [`Trade`]
pub const TRADE_CSV_HEADERS: [&str; 13] = [
    "id",
    "side",
    "entry_bar",
    "exit_bar",
    "entry_time",
    "exit_time",
    "entry_price",
    "exit_price",
    "quantity",
    "commission",
    "pnl",
    "return_pct",
    "exit_reason",
];

/// File name offered for the trade log download
pub const TRADES_CSV_FILENAME: &str = "trades_backtest.csv";

/// Backtest report
#[derive(Debug)]
pub struct BacktestReport {
    result: BacktestResult,
}

impl BacktestReport {
    /// Create new report from result
    pub fn new(result: BacktestResult) -> Self {
        Self { result }
    }

    /// Format report as string
    pub fn format(&self) -> String {
        let summary = &self.result.summary;
        let date = |d: Option<chrono::NaiveDateTime>| {
            d.map_or_else(|| "N/A".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
        };
        format!(
            r#"
Backtest Results
================
Strategy: {}
Trade Mode: {}
Period: {} -> {} ({} bars)
Initial Cash: ${:.2}
Final Equity: ${:.2}
Total Return: {:.2}%
Number of Trades: {}
"#,
            summary.strategy,
            summary.trade_mode,
            date(summary.start),
            date(summary.end),
            summary.bars,
            summary.initial_cash,
            summary.final_equity,
            summary.total_return_pct,
            summary.num_trades,
        )
    }

    /// Trade log as CSV
    pub fn trades_csv(&self) -> Result<String> {
        trades_to_csv(&self.result.trades)
    }

    /// Get result reference
    pub fn result(&self) -> &BacktestResult {
        &self.result
    }
}

/// Serialize trades to CSV; the header row is written even with no trades
pub fn trades_to_csv(trades: &[Trade]) -> Result<String> {
    let export = |e: &dyn std::fmt::Display| Error::Export(e.to_string());

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(TRADE_CSV_HEADERS).map_err(|e| export(&e))?;
    for trade in trades {
        writer.serialize(trade).map_err(|e| export(&e))?;
    }

    let bytes = writer.into_inner().map_err(|e| export(&e))?;
    String::from_utf8(bytes).map_err(|e| export(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{ExitReason, TradeSide};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn trade() -> Trade {
        let day = |d| {
            NaiveDate::from_ymd_opt(2023, 1, d)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        };
        Trade {
            id: Uuid::nil(),
            side: TradeSide::Short,
            entry_bar: 3,
            exit_bar: 7,
            entry_time: day(3),
            exit_time: day(7),
            entry_price: 100.0,
            exit_price: 90.0,
            quantity: 2.0,
            commission: 0.5,
            pnl: 19.5,
            return_pct: 9.75,
            exit_reason: ExitReason::EndOfData,
        }
    }

    #[test]
    fn test_empty_trade_log_keeps_header() {
        let csv = trades_to_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), TRADE_CSV_HEADERS.join(","));
    }

    #[test]
    fn test_trade_row_layout() {
        let csv = trades_to_csv(&[trade()]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);

        let row: Vec<_> = lines[1].split(',').collect();
        assert_eq!(row.len(), TRADE_CSV_HEADERS.len());
        assert_eq!(row[0], Uuid::nil().to_string());
        assert_eq!(row[1], "short");
        assert_eq!(row[4], "2023-01-03T09:00:00");
        assert_eq!(row[12], "end_of_data");
    }
}
