use serde::{Deserialize, Serialize};

// One price bar as delivered by a price source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp_ms: i64,

    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,

    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp_ms,
            open_price: open,
            high_price: high,
            low_price: low,
            close_price: close,
            volume,
        }
    }

    /// Bar where every price field is `close`. Handy when only closes are known.
    pub fn from_close(timestamp_ms: i64, close: f64) -> Self {
        Self::new(timestamp_ms, close, close, close, close, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        [
            self.open_price,
            self.high_price,
            self.low_price,
            self.close_price,
            self.volume,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
