use serde::{Deserialize, Serialize};

use crate::models::MinMaxScaler;

/// In-sample prediction for one held-out observation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct HistoricalPoint {
    pub timestamp_ms: i64,
    pub predicted: f64,
    pub actual: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp_ms: i64,
    pub predicted: f64,
}

/// Error summary over the historical predictions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ForecastMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Mean absolute percentage error. None when any actual value is zero.
    pub mape: Option<f64>,
}

/// Terminal output of the forecaster for one symbol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub symbol: String,
    /// Aligned 1:1 with the tail of the input series covered by the test windows.
    pub historical: Vec<HistoricalPoint>,
    /// Strictly after the last input timestamp.
    pub future: Vec<ForecastPoint>,
    pub metrics: ForecastMetrics,
    pub scaler: MinMaxScaler,
}

impl ForecastResult {
    pub fn rmse(&self) -> f64 {
        self.metrics.rmse
    }

    pub fn final_prediction(&self) -> Option<f64> {
        self.future.last().map(|p| p.predicted)
    }
}
