use {
    crate::domain::{AnalysisError, Candle, Result, SymbolInterval},
    serde::{Deserialize, Serialize},
    std::ops::Range,
};

/// Column-oriented price history for one symbol.
///
/// Timestamps are strictly increasing. The series is immutable once built;
/// the pipeline only ever borrows it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol_interval: SymbolInterval,

    pub timestamps: Vec<i64>,

    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
    pub close_prices: Vec<f64>,

    pub volumes: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from bars, rejecting unordered or duplicate timestamps and non-finite values.
    pub fn from_candles(symbol_interval: SymbolInterval, candles: Vec<Candle>) -> Result<Self> {
        let len = candles.len();

        let mut ts_vec = Vec::with_capacity(len);
        let mut open_vec = Vec::with_capacity(len);
        let mut high_vec = Vec::with_capacity(len);
        let mut low_vec = Vec::with_capacity(len);
        let mut close_vec = Vec::with_capacity(len);
        let mut volume_vec = Vec::with_capacity(len);

        let mut prev_ts: Option<i64> = None;
        for (i, c) in candles.iter().enumerate() {
            if let Some(prev) = prev_ts {
                if c.timestamp_ms <= prev {
                    return Err(AnalysisError::InvalidSeries(format!(
                        "{}: timestamp {} at index {} does not follow {}",
                        symbol_interval.name, c.timestamp_ms, i, prev
                    )));
                }
            }
            if !c.is_finite() {
                return Err(AnalysisError::InvalidSeries(format!(
                    "{}: non-finite value at index {}",
                    symbol_interval.name, i
                )));
            }
            prev_ts = Some(c.timestamp_ms);

            ts_vec.push(c.timestamp_ms);
            open_vec.push(c.open_price);
            high_vec.push(c.high_price);
            low_vec.push(c.low_price);
            close_vec.push(c.close_price);
            volume_vec.push(c.volume);
        }

        Ok(Self {
            symbol_interval,
            timestamps: ts_vec,
            open_prices: open_vec,
            high_prices: high_vec,
            low_prices: low_vec,
            close_prices: close_vec,
            volumes: volume_vec,
        })
    }

    /// Close-only series at evenly spaced timestamps starting at `start_ms`.
    pub fn from_closes(symbol_interval: SymbolInterval, start_ms: i64, closes: &[f64]) -> Result<Self> {
        let step = symbol_interval.interval_ms;
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle::from_close(start_ms + i as i64 * step, close))
            .collect();
        Self::from_candles(symbol_interval, candles)
    }

    pub fn symbol(&self) -> &str {
        self.symbol_interval.name()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn closes(&self) -> &[f64] {
        &self.close_prices
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close_prices.last().copied()
    }

    /// Native sampling step. Falls back to the smallest observed spacing when the
    /// declared interval is not positive.
    pub fn interval_ms(&self) -> Option<i64> {
        if self.symbol_interval.interval_ms > 0 {
            return Some(self.symbol_interval.interval_ms);
        }
        self.timestamps.windows(2).map(|w| w[1] - w[0]).min()
    }

    pub fn get_candle(&self, idx: usize) -> Candle {
        Candle::new(
            self.timestamps[idx],
            self.open_prices[idx],
            self.high_prices[idx],
            self.low_prices[idx],
            self.close_prices[idx],
            self.volumes[idx],
        )
    }

    /// Owned copy of a positional sub-range (clamped to the series bounds).
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            symbol_interval: self.symbol_interval.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            open_prices: self.open_prices[start..end].to_vec(),
            high_prices: self.high_prices[start..end].to_vec(),
            low_prices: self.low_prices[start..end].to_vec(),
            close_prices: self.close_prices[start..end].to_vec(),
            volumes: self.volumes[start..end].to_vec(),
        }
    }

    /// Points no older than `duration_ms` before the last timestamp.
    pub fn trailing(&self, duration_ms: i64) -> Self {
        let Some(last) = self.last_timestamp() else {
            return self.clone();
        };
        let cutoff = last.saturating_sub(duration_ms);
        let start = self.timestamps.partition_point(|&ts| ts < cutoff);
        self.slice(start..self.len())
    }
}
