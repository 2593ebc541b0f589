use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::domain::Candle;

/// Abstract interface for fetching price history.
///
/// An empty vector means "no data"; an `Err` is a transport or availability fault.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn signature(&self) -> &'static str;

    /// Fetch bars for a symbol at `interval_ms`, optionally starting from a timestamp.
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval_ms: i64,
        start_time: Option<i64>,
    ) -> Result<Vec<Candle>>;
}

/// Source backed by bars held in memory. Symbols marked unavailable fail every fetch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    candles: HashMap<String, Vec<Candle>>,
    unavailable: HashSet<String>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candles(mut self, symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.into(), candles);
        self
    }

    pub fn with_unavailable(mut self, symbol: impl Into<String>) -> Self {
        self.unavailable.insert(symbol.into());
        self
    }
}

#[async_trait]
impl PriceSource for InMemoryPriceSource {
    fn signature(&self) -> &'static str {
        "In Memory"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        _interval_ms: i64,
        start_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        if self.unavailable.contains(symbol) {
            bail!("{} is unavailable", symbol);
        }
        let start = start_time.unwrap_or(i64::MIN);
        Ok(self
            .candles
            .get(symbol)
            .map(|c| {
                c.iter()
                    .filter(|c| c.timestamp_ms >= start)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
