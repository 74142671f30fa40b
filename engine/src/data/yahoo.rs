//! Yahoo Finance chart API, the fallback candle source.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use shared::models::{Candle, TimeFrame};
use std::time::Duration;
use url::Url;

use crate::config::DataSettings;
use crate::data::source::CandleSource;
use crate::error::{EngineError, Result};

pub struct YahooSource {
    http: Client,
    base_url: Url,
}

impl YahooSource {
    pub fn new(settings: &DataSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(&settings.user_agent)
            .build()?;
        let base_url = Url::parse(&settings.yahoo_base_url)?;
        Ok(Self { http, base_url })
    }
}

/// `BTC/USDT` -> `BTC-USD`.
pub fn yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('/', "-").replace("USDT", "USD")
}

/// Yahoo has no 4-hour bars.
pub fn yahoo_interval(timeframe: TimeFrame) -> Option<&'static str> {
    match timeframe {
        TimeFrame::Minute15 => Some("15m"),
        TimeFrame::Hour1 => Some("1h"),
        TimeFrame::Hour4 => None,
        TimeFrame::Day1 => Some("1d"),
    }
}

/// Longest lookback Yahoo serves for each interval.
fn yahoo_range(timeframe: TimeFrame) -> &'static str {
    match timeframe {
        TimeFrame::Minute15 => "60d",
        TimeFrame::Hour1 | TimeFrame::Hour4 => "730d",
        TimeFrame::Day1 => "10y",
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Rows with a missing price are dropped; a missing volume counts as zero.
pub fn parse_chart(body: &str) -> Result<Vec<Candle>> {
    let response: ChartResponse = serde_json::from_str(body)?;
    if let Some(err) = response.chart.error {
        return Err(EngineError::MarketDataError(format!(
            "Yahoo chart error {}: {}",
            err.code, err.description
        )));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();
    let candles = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(Candle {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: at(&quote.open, i)?,
                high: at(&quote.high, i)?,
                low: at(&quote.low, i)?,
                close: at(&quote.close, i)?,
                volume: at(&quote.volume, i).unwrap_or(0.0),
            })
        })
        .collect();
    Ok(candles)
}

#[async_trait]
impl CandleSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: TimeFrame, limit: usize) -> Result<Vec<Candle>> {
        let interval = yahoo_interval(timeframe).ok_or_else(|| EngineError::UnsupportedTimeframe {
            source_name: self.name().to_string(),
            timeframe,
        })?;
        let ticker = yahoo_symbol(symbol);

        let mut url = self.base_url.join(&format!("/v8/finance/chart/{}", ticker))?;
        url.query_pairs_mut()
            .append_pair("interval", interval)
            .append_pair("range", yahoo_range(timeframe));

        tracing::info!(symbol, ticker = %ticker, interval, "Fetching candles from Yahoo Finance");
        let res = self.http.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(EngineError::MarketDataError(format!(
                "Yahoo chart request for '{}' failed with {}: {}",
                ticker, status, body
            )));
        }

        let mut candles = parse_chart(&body)?;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }
}
