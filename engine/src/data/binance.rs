//! Binance spot klines, the primary candle source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use shared::models::{Candle, TimeFrame};
use std::time::Duration;
use url::Url;

use crate::config::DataSettings;
use crate::data::source::PageSource;
use crate::error::{EngineError, Result};

/// Binance rejects kline requests above this many rows.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

pub struct BinanceSource {
    http: Client,
    base_url: Url,
    page_size: usize,
}

impl BinanceSource {
    pub fn new(settings: &DataSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(&settings.user_agent)
            .build()?;
        let base_url = Url::parse(&settings.binance_base_url)?;

        Ok(Self {
            http,
            base_url,
            page_size: settings.page_size.clamp(1, MAX_KLINES_PER_REQUEST),
        })
    }
}

/// `BTC/USDT` -> `BTCUSDT`.
pub fn exchange_symbol(symbol: &str) -> String {
    symbol.replace(['/', '-'], "").to_uppercase()
}

/// Parses the `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]` rows
/// returned by `/api/v3/klines`. Malformed rows are skipped.
pub fn parse_klines(raw: &[serde_json::Value]) -> Vec<Candle> {
    let candles: Vec<Candle> = raw
        .iter()
        .filter_map(|row| {
            let arr = row.as_array()?;
            if arr.len() < 6 {
                return None;
            }
            let field = |i: usize| -> Option<f64> {
                match &arr[i] {
                    serde_json::Value::String(s) => s.parse().ok(),
                    other => other.as_f64(),
                }
            };
            Some(Candle {
                timestamp: DateTime::from_timestamp_millis(arr[0].as_i64()?)?,
                open: field(1)?,
                high: field(2)?,
                low: field(3)?,
                close: field(4)?,
                volume: field(5)?,
            })
        })
        .collect();

    let skipped = raw.len() - candles.len();
    if skipped > 0 {
        tracing::warn!(skipped, "Skipped malformed kline rows");
    }
    candles
}

#[async_trait]
impl PageSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn max_page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>> {
        let mut url = self.base_url.join("/api/v3/klines")?;
        url.query_pairs_mut()
            .append_pair("symbol", &exchange_symbol(symbol))
            .append_pair("interval", timeframe.as_str())
            .append_pair("limit", &limit.to_string());
        if let Some(end) = end_time {
            url.query_pairs_mut()
                .append_pair("endTime", &end.timestamp_millis().to_string());
        }

        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(EngineError::MarketDataError(format!(
                "Binance klines request for '{}' failed with {}: {}",
                symbol, status, body
            )));
        }

        let raw: Vec<serde_json::Value> = res.json().await?;
        Ok(parse_klines(&raw))
    }
}
