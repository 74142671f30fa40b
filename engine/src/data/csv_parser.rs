use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::{Candle, TimeFrame};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::data::source::CandleSource;
use crate::error::EngineError;

// Timestamp formats accepted in the first column
pub mod timestamp_format {
    use anyhow::{anyhow, Result};
    use chrono::{DateTime, NaiveDateTime, Utc};

    // Epoch milliseconds ("1704067200000"), RFC 3339, or "YYYY-MM-DD HH:MM:SS" taken as UTC
    pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(millis) = s.parse::<i64>() {
            return DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| anyhow!("Epoch milliseconds '{}' out of range", s));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
            .map_err(|e| anyhow!("Failed to parse timestamp '{}': {}", s, e))
    }

}

pub struct OhlcvCsvParser;

impl OhlcvCsvParser {
    // CSV Header: timestamp,open,high,low,close,volume (column order is free)
    // Example Row: 2024-01-01T00:00:00Z,42283.58,42554.57,42261.02,42475.23,1271.68
    pub fn load_candles_from_csv(file_path: &Path) -> Result<Vec<Candle>> {
        let file = File::open(file_path)
            .map_err(|e| anyhow!("Failed to open CSV file '{}': {}", file_path.display(), e))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let mut candles = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.with_context(|| format!("Error reading CSV record at line {}", line))?;

            let timestamp_str = Self::required_field(&record, &headers, "timestamp", line)?;
            let timestamp = timestamp_format::parse_timestamp(timestamp_str)
                .map_err(|e| anyhow!("Error parsing 'timestamp' at line {}: {}", line, e))?;

            candles.push(Candle {
                timestamp,
                open: Self::number_field(&record, &headers, "open", line)?,
                high: Self::number_field(&record, &headers, "high", line)?,
                low: Self::number_field(&record, &headers, "low", line)?,
                close: Self::number_field(&record, &headers, "close", line)?,
                volume: Self::number_field(&record, &headers, "volume", line)?,
            });
        }
        Ok(candles)
    }

    fn number_field(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<f64> {
        let raw = Self::required_field(record, headers, name, line)?;
        raw.parse::<f64>()
            .map_err(|e| anyhow!("Error parsing '{}' at line {}: '{}' ({})", name, line, raw, e))
    }

    // Header lookup is case-insensitive so exports from different tools load unchanged.
    fn required_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .and_then(|pos| record.get(pos))
            .ok_or_else(|| anyhow!("Missing '{}' field in CSV record at line {}", name, line))
    }
}

/// Offline candle source backed by a single-symbol CSV file.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CandleSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: TimeFrame, limit: usize) -> crate::error::Result<Vec<Candle>> {
        tracing::info!(symbol, %timeframe, path = %self.path.display(), "Loading candles from CSV file");
        let mut candles = OhlcvCsvParser::load_candles_from_csv(&self.path).map_err(classify_csv_error)?;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }
}

// Reader failures keep their csv::Error; everything else is a content problem.
fn classify_csv_error(err: anyhow::Error) -> EngineError {
    match err.downcast::<csv::Error>() {
        Ok(source) => EngineError::CsvSystemError { source },
        Err(err) => EngineError::CsvDataFormatError(format!("{:#}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_candles_from_csv_valid_data() {
        let csv_content = "\
timestamp,open,high,low,close,volume
2024-01-01T00:00:00Z,42283.58,42554.57,42261.02,42475.23,1271.68
1704070800000,42475.23,42775.00,42431.65,42613.56,1196.37";
        let tmp_file = create_test_csv(csv_content);
        let candles = OhlcvCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1704067200000);
        assert_eq!(candles[0].open, 42283.58);
        assert_eq!(candles[0].volume, 1271.68);
        assert_eq!(candles[1].timestamp.timestamp_millis(), 1704070800000);
        assert_eq!(candles[1].close, 42613.56);
    }

    #[test]
    fn test_load_candles_reordered_and_uppercase_headers() {
        let csv_content = "\
Close,Open,High,Low,Volume,Timestamp
10.5,10,11,9,3,2024-01-01 00:00:00";
        let tmp_file = create_test_csv(csv_content);
        let candles = OhlcvCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 10.0);
        assert_eq!(candles[0].close, 10.5);
    }

    #[test]
    fn test_load_candles_from_csv_empty_file() {
        let tmp_file = create_test_csv("timestamp,open,high,low,close,volume");
        let candles = OhlcvCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();
        assert!(candles.is_empty());
    }

    #[test]
    fn test_load_candles_from_csv_missing_field() {
        let csv_content = "\
timestamp,open,high,low,close
2024-01-01T00:00:00Z,1,2,0.5,1.5";
        let tmp_file = create_test_csv(csv_content);
        let result = OhlcvCsvParser::load_candles_from_csv(tmp_file.path());
        assert!(result.unwrap_err().to_string().contains("Missing 'volume' field"));
    }

    #[test]
    fn test_load_candles_from_csv_invalid_number() {
        let csv_content = "\
timestamp,open,high,low,close,volume
2024-01-01T00:00:00Z,invalid,2,0.5,1.5,10";
        let tmp_file = create_test_csv(csv_content);
        let result = OhlcvCsvParser::load_candles_from_csv(tmp_file.path());
        assert!(result.unwrap_err().to_string().contains("Error parsing 'open' at line 2"));
    }

    #[tokio::test]
    async fn test_csv_source_keeps_most_recent_rows() {
        let csv_content = "\
timestamp,open,high,low,close,volume
1704067200000,1,1,1,1,1
1704070800000,2,2,2,2,1
1704074400000,3,3,3,3,1";
        let tmp_file = create_test_csv(csv_content);
        let source = CsvSource::new(tmp_file.path());

        let candles = source.fetch_candles("BTC/USDT", TimeFrame::Hour1, 2).await.unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 2.0);
        assert_eq!(candles[1].close, 3.0);
    }

    #[tokio::test]
    async fn test_csv_source_missing_file_is_an_error() {
        let source = CsvSource::new("non_existent_file.csv");
        let err = source.fetch_candles("BTC/USDT", TimeFrame::Hour1, 10).await.unwrap_err();
        assert!(matches!(err, EngineError::CsvDataFormatError(_)));
        assert!(err.to_string().contains("Failed to open CSV file"));
    }

    #[tokio::test]
    async fn test_csv_source_ragged_row_is_a_reader_error() {
        let csv_content = "\
timestamp,open,high,low,close,volume
1704067200000,1,1,1";
        let tmp_file = create_test_csv(csv_content);
        let source = CsvSource::new(tmp_file.path());
        let err = source.fetch_candles("BTC/USDT", TimeFrame::Hour1, 10).await.unwrap_err();
        assert!(matches!(err, EngineError::CsvSystemError { .. }));
        assert!(err.to_string().contains("CSV parsing system error"));
    }
}
