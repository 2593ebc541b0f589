use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::analysis::{PerformanceSummary, Recommendation};
use crate::domain::AnalysisError;
use crate::models::{ForecastResult, IndicatorFrame, Regressor};

/// Everything the pipeline produced for one symbol. Owned, never shared between symbols.
#[derive(Debug, Clone)]
pub struct SymbolBundle {
    pub symbol: String,
    pub candle_count: usize,
    pub indicators: IndicatorFrame,
    pub performance: Option<PerformanceSummary>,

    /// None when the forecast stage failed (see the report's failures)
    pub forecast: Option<ForecastResult>,
    pub model: Option<Regressor>,
    pub recommendation: Option<Recommendation>,

    pub duration_ms: u128,
}

impl SymbolBundle {
    pub fn last_close(&self) -> Option<f64> {
        self.indicators.closes.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum FailureStage {
    Fetch,
    Forecast,
    Persist,
}

/// A per-symbol failure recorded instead of aborting the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub stage: FailureStage,
    pub error: AnalysisError,
}

impl SymbolFailure {
    pub fn new(symbol: impl Into<String>, stage: FailureStage, error: AnalysisError) -> Self {
        Self {
            symbol: symbol.into(),
            stage,
            error,
        }
    }

    /// Skipped entirely (no bundle) rather than partially processed.
    pub fn is_skip(&self) -> bool {
        self.stage == FailureStage::Fetch
    }
}
