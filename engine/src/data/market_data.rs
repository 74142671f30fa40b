// Fetches candle history from a primary source with an optional fallback
use shared::models::{Candle, TimeFrame};
use std::sync::Arc;

use crate::config::DataSettings;
use crate::data::binance::BinanceSource;
use crate::data::csv_parser::CsvSource;
use crate::data::source::{CandleSource, Paginated};
use crate::data::yahoo::YahooSource;
use crate::error::Result;

pub struct MarketDataFetcher {
    primary: Arc<dyn CandleSource>,
    fallback: Option<Arc<dyn CandleSource>>,
}

impl MarketDataFetcher {
    pub fn new(primary: Arc<dyn CandleSource>, fallback: Option<Arc<dyn CandleSource>>) -> Self {
        MarketDataFetcher { primary, fallback }
    }

    /// Binance with a Yahoo fallback, or the CSV file alone when `csv_path` is set.
    pub fn from_settings(settings: &DataSettings) -> Result<Self> {
        if let Some(path) = &settings.csv_path {
            return Ok(Self::new(Arc::new(CsvSource::new(path.clone())), None));
        }
        let primary = Paginated::new(BinanceSource::new(settings)?);
        let fallback = YahooSource::new(settings)?;
        Ok(Self::new(Arc::new(primary), Some(Arc::new(fallback))))
    }

    /// Never fails: an exhausted chain of sources yields an empty series.
    pub async fn fetch(&self, symbol: &str, timeframe: TimeFrame, limit: usize) -> Vec<Candle> {
        match self.primary.fetch_candles(symbol, timeframe, limit).await {
            Ok(candles) if !candles.is_empty() => {
                tracing::info!(source = self.primary.name(), symbol, %timeframe, count = candles.len(), "Fetched candles");
                return normalize_series(candles, limit);
            }
            Ok(_) => {
                tracing::warn!(source = self.primary.name(), symbol, %timeframe, "Primary source returned no candles");
            }
            Err(e) => {
                tracing::warn!(source = self.primary.name(), symbol, %timeframe, error = %e, "Primary source failed");
            }
        }

        let Some(fallback) = &self.fallback else {
            return Vec::new();
        };
        tracing::info!(source = fallback.name(), symbol, %timeframe, "Trying fallback source");
        match fallback.fetch_candles(symbol, timeframe, limit).await {
            Ok(candles) => {
                tracing::info!(source = fallback.name(), symbol, %timeframe, count = candles.len(), "Fetched candles from fallback");
                normalize_series(candles, limit)
            }
            Err(e) => {
                tracing::error!(source = fallback.name(), symbol, %timeframe, error = %e, "Fallback source failed, no data available");
                Vec::new()
            }
        }
    }
}

/// Drops inconsistent candles, sorts ascending, removes duplicate timestamps
/// and keeps at most the `limit` most recent rows.
pub fn normalize_series(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    let received = candles.len();
    candles.retain(Candle::is_consistent);
    let dropped = received - candles.len();
    if dropped > 0 {
        tracing::warn!(dropped, "Dropped inconsistent candles");
    }

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);

    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::test_support::{hourly_candles, HistoryPages};
    use crate::error::EngineError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        name: &'static str,
        result: std::result::Result<Vec<Candle>, String>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn ok(name: &'static str, candles: Vec<Candle>) -> Arc<Self> {
            Arc::new(Self { name, result: Ok(candles), calls: AtomicUsize::new(0) })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, result: Err("connection refused".to_string()), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl CandleSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_candles(&self, _symbol: &str, _timeframe: TimeFrame, _limit: usize) -> Result<Vec<Candle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(EngineError::MarketDataError)
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = FixedSource::ok("primary", hourly_candles(&[1.0, 2.0, 3.0]));
        let fallback = FixedSource::ok("fallback", hourly_candles(&[9.0]));
        let fetcher = MarketDataFetcher::new(primary.clone(), Some(fallback.clone()));

        let candles = fetcher.fetch("BTC/USDT", TimeFrame::Hour1, 10).await;

        assert_eq!(candles.len(), 3);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_error_uses_fallback() {
        let primary = FixedSource::failing("primary");
        let fallback = FixedSource::ok("fallback", hourly_candles(&[9.0, 10.0]));
        let fetcher = MarketDataFetcher::new(primary.clone(), Some(fallback.clone()));

        let candles = fetcher.fetch("BTC/USDT", TimeFrame::Hour1, 10).await;

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 10.0);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_primary_empty_uses_fallback() {
        let primary = FixedSource::ok("primary", Vec::new());
        let fallback = FixedSource::ok("fallback", hourly_candles(&[9.0]));
        let fetcher = MarketDataFetcher::new(primary, Some(fallback.clone()));

        let candles = fetcher.fetch("BTC/USDT", TimeFrame::Hour1, 10).await;

        assert_eq!(candles.len(), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_sources_fail_returns_empty() {
        let fetcher = MarketDataFetcher::new(FixedSource::failing("primary"), Some(FixedSource::failing("fallback")));
        assert!(fetcher.fetch("BTC/USDT", TimeFrame::Hour4, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_fallback_configured_returns_empty() {
        let fetcher = MarketDataFetcher::new(FixedSource::failing("primary"), None);
        assert!(fetcher.fetch("BTC/USDT", TimeFrame::Hour1, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_paginated_primary_through_fetcher() {
        let closes: Vec<f64> = (0..2500).map(|i| 100.0 + (i % 7) as f64).collect();
        let primary = Arc::new(Paginated::new(HistoryPages::new(hourly_candles(&closes), 1000)));
        let fetcher = MarketDataFetcher::new(primary, None);

        let candles = fetcher.fetch("BTC/USDT", TimeFrame::Hour1, 1200).await;

        assert_eq!(candles.len(), 1200);
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_normalize_sorts_dedups_and_trims() {
        let base = hourly_candles(&[1.0, 2.0, 3.0, 4.0]);
        let shuffled = vec![base[2], base[0], base[3], base[1], base[2]];

        let normalized = normalize_series(shuffled, 3);

        let closes: Vec<f64> = normalized.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_normalize_drops_inconsistent_candles() {
        let mut candles = hourly_candles(&[1.0, 2.0, 3.0]);
        candles[1].high = 0.5; // below the close
        candles[2].close = f64::NAN;

        let normalized = normalize_series(candles, 10);

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].close, 1.0);
    }
}
