use serde::{Deserialize, Serialize};

use crate::domain::SymbolInterval;

/// A derived column. `None` marks the warm-up gap of a rolling computation.
pub type Column = Vec<Option<f64>>;

/// Price history extended with derived indicator columns.
///
/// Every column has the same length as `timestamps`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct IndicatorFrame {
    pub symbol_interval: SymbolInterval,
    pub timestamps: Vec<i64>,
    pub closes: Vec<f64>,

    pub sma_short: Column,
    pub sma_medium: Column,
    pub sma_long: Column,

    pub ema_fast: Column,
    pub ema_slow: Column,

    pub macd: Column,
    pub macd_signal: Column,
    pub macd_histogram: Column,

    pub rsi: Column,

    pub band_middle: Column,
    pub band_upper: Column,
    pub band_lower: Column,
    pub band_width: Column,

    pub momentum: Column,

    pub daily_return: Column,
    pub cumulative_return: Column,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Latest defined value of a column, if any.
    pub fn last_defined(column: &[Option<f64>]) -> Option<f64> {
        column.iter().rev().find_map(|v| *v)
    }

    /// Number of leading undefined entries in a column.
    pub fn warm_up_len(column: &[Option<f64>]) -> usize {
        column.iter().take_while(|v| v.is_none()).count()
    }
}
