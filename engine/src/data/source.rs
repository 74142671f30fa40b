//! Candle source traits and backward pagination over page-limited sources.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::models::{Candle, TimeFrame};

use crate::error::Result;

/// Anything that can return up to `limit` of the most recent candles for a symbol.
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_candles(&self, symbol: &str, timeframe: TimeFrame, limit: usize) -> Result<Vec<Candle>>;
}

/// A source that serves at most `max_page_size` candles per request, ending at an optional boundary.
#[async_trait]
pub trait PageSource: Send + Sync {
    fn name(&self) -> &str;

    fn max_page_size(&self) -> usize;

    /// Most recent candles (ascending) whose open time is at or before `end_time`.
    async fn fetch_page(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>>;
}

/// Walks a [`PageSource`] backward from "now" until `limit` candles are collected
/// or the history runs out.
pub struct Paginated<S> {
    inner: S,
}

impl<S: PageSource> Paginated<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: PageSource> CandleSource for Paginated<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: TimeFrame, limit: usize) -> Result<Vec<Candle>> {
        let page_size = self.inner.max_page_size().max(1);
        let mut collected: Vec<Candle> = Vec::new();
        let mut remaining = limit;
        let mut end_time: Option<DateTime<Utc>> = None;

        while remaining > 0 {
            let requested = remaining.min(page_size);
            let page = self.inner.fetch_page(symbol, timeframe, requested, end_time).await?;
            let received = page.len();
            tracing::debug!(
                source = self.inner.name(),
                symbol,
                %timeframe,
                requested,
                received,
                end_time = ?end_time,
                "Fetched candle page"
            );

            let Some(earliest) = page.iter().map(|c| c.timestamp).min() else {
                break;
            };

            // Pages arrive newest-first in walk order, so each one goes in front.
            let mut merged = page;
            merged.append(&mut collected);
            collected = merged;

            remaining = remaining.saturating_sub(received);
            if received < requested {
                break;
            }
            end_time = Some(earliest - Duration::milliseconds(1));
        }

        Ok(collected)
    }
}
