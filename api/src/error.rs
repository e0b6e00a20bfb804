use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use backtester_rs::strategy::StrategyError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<backtester_rs::Error> for ApiError {
    fn from(err: backtester_rs::Error) -> Self {
        match &err {
            backtester_rs::Error::Strategy(StrategyError::UnknownStrategy(_)) => {
                ApiError::NotFound(err.to_string())
            }
            e if e.is_user_error() => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(format!("Backtest failed: {}", err)),
        }
    }
}

impl From<StrategyError> for ApiError {
    fn from(err: StrategyError) -> Self {
        backtester_rs::Error::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
