//! OHLCV CSV loading and validation

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{Candle, CandleSeries};

/// Columns every uploaded file must carry
pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Date-time layouts tried in order; the first one that fits the first row
/// is preferred for the rest of the column.
const DATETIME_FORMATS: [&str; 4] = [
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%Y/%m/%d"];

const FALLBACK_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const EXAMPLE_CSV: &str = "date,open,high,low,close,volume
01-01-2023 09:00,100.0,101.0,99.0,100.5,1000
01-01-2023 09:01,100.5,102.0,100.0,101.5,1200
01-01-2023 09:02,101.0,102.5,100.5,102.0,1100
";

/// Errors raised while turning an uploaded file into candles
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Error loading CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Error parsing date column: row {row} has unrecognised date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("No valid data rows found after processing")]
    Empty,
}

/// Sample file offered to users who don't have one yet
pub fn example_csv() -> &'static str {
    EXAMPLE_CSV
}

/// Load and validate OHLCV rows from a CSV string
pub fn load_csv_str(input: &str) -> Result<CandleSeries, DataError> {
    load_csv(input.as_bytes())
}

/// Load and validate OHLCV rows from any reader.
///
/// Header names are matched case-insensitively. Rows whose numeric fields
/// can't be parsed are dropped; an unparseable date fails the whole load.
/// The returned series is sorted by timestamp and never empty.
pub fn load_csv<R: Read>(reader: R) -> Result<CandleSeries, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();

    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h == column) {
            Some(index) => *slot = index,
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }
    let [date_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] = indices;

    let mut candles = Vec::new();
    let mut preferred: Option<&'static str> = None;
    let mut dropped = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = row + 2;

        let raw_date = record.get(date_idx).unwrap_or_default();
        let (timestamp, format) =
            parse_date(raw_date, preferred).ok_or_else(|| DataError::InvalidDate {
                row: line,
                value: raw_date.to_string(),
            })?;
        if preferred.is_none() {
            debug!(format, "Detected date format");
            preferred = Some(format);
        }

        let field = |index: usize| record.get(index).and_then(parse_number);
        match (
            field(open_idx),
            field(high_idx),
            field(low_idx),
            field(close_idx),
            field(volume_idx),
        ) {
            (Some(open), Some(high), Some(low), Some(close), Some(volume)) => {
                candles.push(Candle::new(timestamp, open, high, low, close, volume));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "Dropped rows with missing or non-numeric values");
    }
    if candles.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(CandleSeries::from_vec(candles))
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell, trying `preferred` before every known layout
fn parse_date(
    value: &str,
    preferred: Option<&'static str>,
) -> Option<(NaiveDateTime, &'static str)> {
    if let Some(format) = preferred {
        if let Some(parsed) = parse_with(value, format) {
            return Some((parsed, format));
        }
    }

    DATETIME_FORMATS
        .iter()
        .chain(DATE_FORMATS.iter())
        .chain(FALLBACK_DATETIME_FORMATS.iter())
        .find_map(|format| parse_with(value, format).map(|parsed| (parsed, *format)))
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| (dt.naive_utc(), "rfc3339"))
        })
}

fn parse_with(value: &str, format: &str) -> Option<NaiveDateTime> {
    if format == "rfc3339" {
        return DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_utc());
    }
    if DATE_FORMATS.contains(&format) {
        return NaiveDate::parse_from_str(value, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    NaiveDateTime::parse_from_str(value, format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_example_csv_loads() {
        let series = load_csv_str(example_csv()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![100.5, 101.5, 102.0]);

        let first = series.first().unwrap().timestamp;
        assert_eq!((first.day(), first.month(), first.year()), (1, 1, 2023));
        assert_eq!((first.hour(), first.minute()), (9, 0));
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let err = load_csv_str("date,open,close\n2023-01-01,1,2\n").unwrap_err();
        match &err {
            DataError::MissingColumns(cols) => assert_eq!(cols, &["high", "low", "volume"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Missing required columns: high, low, volume");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let csv = "Date,Open,High,Low,Close,Volume\n2023-01-02,1,2,0.5,1.5,10\n";
        let series = load_csv_str(csv).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_rows_sorted_and_bad_numbers_dropped() {
        let csv = "date,open,high,low,close,volume
2023/01/03,1,1,1,3,1
2023/01/01,1,1,1,1,1
2023/01/02,1,abc,1,2,1
2023/01/04,1,1,1,,1
";
        let series = load_csv_str(csv).unwrap();
        assert_eq!(series.closes(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_mixed_date_layouts_fall_back() {
        let csv = "date,open,high,low,close,volume
01/02/2023 10:30,1,1,1,1,1
2023-02-02T10:30:00,1,1,1,2,1
";
        let series = load_csv_str(csv).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().timestamp.month(), 2);
    }

    #[test]
    fn test_unparseable_date_fails() {
        let csv = "date,open,high,low,close,volume\nyesterday,1,1,1,1,1\n";
        match load_csv_str(csv).unwrap_err() {
            DataError::InvalidDate { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_all_rows_invalid_is_empty() {
        let csv = "date,open,high,low,close,volume\n2023-01-01,x,x,x,x,x\n";
        assert!(matches!(load_csv_str(csv), Err(DataError::Empty)));
    }
}
