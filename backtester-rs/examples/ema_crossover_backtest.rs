//! Example: EMA crossover backtest over a CSV file
//!
//! Pass a CSV path as the first argument, or run without one to use a
//! synthetic sine-wave series.

use backtester_rs::prelude::*;
use chrono::{Duration, NaiveDate};
use serde_json::json;

fn synthetic_candles(count: usize) -> CandleSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    let candles = (0..count)
        .map(|i| {
            let price = 100.0 + 10.0 * (i as f64 / 15.0).sin();
            Candle::new(
                start + Duration::hours(i as i64),
                price,
                price + 0.5,
                price - 0.5,
                price,
                1_000.0,
            )
        })
        .collect();

    CandleSeries::from_vec(candles)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== EMA Crossover Backtest Example ===\n");

    let candles = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading candles from {}...", path);
            load_csv_str(&std::fs::read_to_string(path)?)?
        }
        None => {
            println!("Creating synthetic candle data...");
            synthetic_candles(300)
        }
    };

    let registry = StrategyRegistry::new();
    let mut params = StrategyParams::new();
    params.insert("fast_ema".to_string(), json!(5));
    params.insert("slow_ema".to_string(), json!(20));
    let strategy = registry.create(EmaCrossover::NAME, &params)?;

    let engine = BacktestEngine::new(BacktestConfig {
        initial_cash: 10_000.0,
        ..BacktestConfig::default()
    });

    for mode in TradeMode::ALL {
        let result = engine.run(strategy.as_ref(), mode, &candles)?;
        println!("\n=== {} ===", mode);
        println!("{}", BacktestReport::new(result).format());
    }

    Ok(())
}
