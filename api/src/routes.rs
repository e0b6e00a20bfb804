//! HTTP handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use backtester_rs::backtest::{
    trades_to_csv, BacktestConfig, BacktestEngine, BacktestResult, TRADES_CSV_FILENAME,
};
use backtester_rs::data::{example_csv, load_csv_str, Candle};
use backtester_rs::strategy::{StrategyDescriptor, StrategyParams, StrategyRegistry, TradeMode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::Config;
use tracing::info;

use crate::error::ApiError;

pub const MIN_INITIAL_CASH: f64 = 1_000.0;
pub const MAX_INITIAL_CASH: f64 = 1_000_000_000.0;
const PREVIEW_ROWS: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StrategyRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(StrategyRegistry::new()),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BacktestRequest {
    pub strategy: String,
    #[serde(default)]
    pub params: StrategyParams,
    pub trade_mode: TradeMode,
    pub initial_cash: Option<f64>,
    /// Raw OHLCV CSV text
    pub csv: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub rows: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub head: Vec<Candle>,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_strategies(State(state): State<AppState>) -> Json<Vec<StrategyDescriptor>> {
    Json(state.registry.descriptors())
}

pub async fn trade_modes() -> Json<Vec<&'static str>> {
    Json(TradeMode::ALL.iter().map(TradeMode::as_str).collect())
}

pub async fn download_example_csv() -> impl IntoResponse {
    csv_attachment("example_ohlcv.csv", example_csv().to_string())
}

pub async fn preview_data(body: String) -> Result<Json<PreviewResponse>, ApiError> {
    let candles = load_csv_str(&body).map_err(backtester_rs::Error::from)?;
    Ok(Json(PreviewResponse {
        rows: candles.len(),
        start: candles.first().map(|c| c.timestamp),
        end: candles.last().map(|c| c.timestamp),
        head: candles.head(PREVIEW_ROWS).to_vec(),
    }))
}

pub async fn run_backtest(
    State(state): State<AppState>,
    payload: Result<Json<BacktestRequest>, JsonRejection>,
) -> Result<Json<BacktestResult>, ApiError> {
    let Json(request) = payload?;
    let result = execute(&state, request).await?;
    Ok(Json(result))
}

pub async fn download_trades(
    State(state): State<AppState>,
    payload: Result<Json<BacktestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let result = execute(&state, request).await?;
    let csv = trades_to_csv(&result.trades)?;
    Ok(csv_attachment(TRADES_CSV_FILENAME, csv))
}

fn csv_attachment(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}

/// Validate the request and run it on the blocking pool
async fn execute(state: &AppState, request: BacktestRequest) -> Result<BacktestResult, ApiError> {
    let initial_cash = request
        .initial_cash
        .unwrap_or(state.config.default_initial_cash);
    if !(MIN_INITIAL_CASH..=MAX_INITIAL_CASH).contains(&initial_cash) {
        return Err(ApiError::BadRequest(format!(
            "Initial cash must be between {} and {}",
            MIN_INITIAL_CASH, MAX_INITIAL_CASH
        )));
    }

    let strategy = state.registry.create(&request.strategy, &request.params)?;
    let engine = BacktestEngine::new(BacktestConfig {
        initial_cash,
        commission: state.config.commission_rate,
    });
    info!(
        strategy = %request.strategy,
        trade_mode = %request.trade_mode,
        initial_cash,
        "Backtest requested"
    );

    tokio::task::spawn_blocking(move || {
        let candles = load_csv_str(&request.csv)?;
        engine.run(strategy.as_ref(), request.trade_mode, &candles)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Backtest task failed: {}", e)))?
    .map_err(ApiError::from)
}
