use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{
    download_example_csv, download_trades, health_check, list_strategies, preview_data,
    run_backtest, trade_modes, AppState,
};

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/strategies", get(list_strategies))
        .route("/api/trade-modes", get(trade_modes))
        .route("/api/example.csv", get(download_example_csv))
        .route("/api/data/preview", post(preview_data))
        .route("/api/backtest", post(run_backtest))
        .route("/api/backtest/trades.csv", post(download_trades))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
