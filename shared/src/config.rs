use std::str::FromStr;

use anyhow::Context;
use dotenv::dotenv;
use serde::Serialize;

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format '{}' (expected pretty or json)", other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub default_initial_cash: f64,
    pub commission_rate: f64,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_host: "0.0.0.0".to_string(),
            api_port: 9999,
            default_initial_cash: 100_000.0,
            commission_rate: 0.001,
            max_upload_bytes: 10 * 1024 * 1024,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            api_host: lookup("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_var(&lookup, "API_PORT", defaults.api_port)?,
            default_initial_cash: parse_var(
                &lookup,
                "DEFAULT_INITIAL_CASH",
                defaults.default_initial_cash,
            )?,
            commission_rate: parse_var(&lookup, "COMMISSION_RATE", defaults.commission_rate)?,
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            log_format: parse_var(&lookup, "LOG_FORMAT", defaults.log_format)?,
        };

        anyhow::ensure!(
            (0.0..1.0).contains(&config.commission_rate),
            "COMMISSION_RATE must be in [0, 1), got {}",
            config.commission_rate
        );
        anyhow::ensure!(
            config.default_initial_cash > 0.0,
            "DEFAULT_INITIAL_CASH must be positive, got {}",
            config.default_initial_cash
        );

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
