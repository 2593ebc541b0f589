use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::config::constants::signal::THRESHOLD_PCT;

/// Informational call derived from the final forecast. Not trading advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    /// Compares the last forecast against the last close using a symmetric threshold.
    pub fn from_forecast(last_close: f64, final_forecast: f64) -> Self {
        Self::with_threshold(last_close, final_forecast, THRESHOLD_PCT)
    }

    pub fn with_threshold(last_close: f64, final_forecast: f64, threshold: f64) -> Self {
        if last_close <= 0.0 || !final_forecast.is_finite() {
            return Recommendation::Hold;
        }
        let change = final_forecast / last_close - 1.0;
        if change > threshold {
            Recommendation::Buy
        } else if change < -threshold {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(Recommendation::from_forecast(100.0, 106.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_forecast(100.0, 94.0), Recommendation::Sell);
        assert_eq!(Recommendation::from_forecast(100.0, 104.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_forecast(100.0, 96.0), Recommendation::Hold);
    }

    #[test]
    fn test_degenerate_inputs_hold() {
        assert_eq!(Recommendation::from_forecast(0.0, 10.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_forecast(10.0, f64::NAN), Recommendation::Hold);
        assert_eq!(Recommendation::Buy.to_string(), "Buy");
    }
}
