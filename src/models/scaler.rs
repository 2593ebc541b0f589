use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisError, Result};
use crate::utils::{min_max, remap};

/// Fitted range of a min-max scaler. Always `max > min`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScalerState {
    pub min: f64,
    pub max: f64,
}

/// Reversible min-max normalisation onto `[0, 1]`.
///
/// Values outside the fitted range extrapolate linearly; nothing is clamped.
/// Fit once per symbol and never share between symbols.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "ScalerState", into = "ScalerState")]
pub struct MinMaxScaler {
    state: ScalerState,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidSeries(
                "cannot fit scaler on non-finite values".to_string(),
            ));
        }
        let (min, max) = min_max(values).ok_or_else(|| AnalysisError::NoData {
            symbol: "scaler input".to_string(),
        })?;
        if max <= min {
            return Err(AnalysisError::DegenerateRange { value: min });
        }
        Ok(Self {
            state: ScalerState { min, max },
        })
    }

    pub fn from_state(state: ScalerState) -> Result<Self> {
        if !(state.min.is_finite() && state.max.is_finite() && state.max > state.min) {
            return Err(AnalysisError::DegenerateRange { value: state.min });
        }
        Ok(Self { state })
    }

    /// Fits on `values` and returns the scaler with the transformed copy.
    pub fn fit_transform(values: &[f64]) -> Result<(Self, Vec<f64>)> {
        let scaler = Self::fit(values)?;
        let scaled = scaler.transform_all(values);
        Ok((scaler, scaled))
    }

    pub fn state(&self) -> ScalerState {
        self.state
    }

    #[inline]
    pub fn transform(&self, x: f64) -> f64 {
        remap(x, self.state.min, self.state.max, 0.0, 1.0)
    }

    #[inline]
    pub fn inverse(&self, y: f64) -> f64 {
        y * (self.state.max - self.state.min) + self.state.min
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    pub fn inverse_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse(v)).collect()
    }
}

impl TryFrom<ScalerState> for MinMaxScaler {
    type Error = AnalysisError;

    fn try_from(state: ScalerState) -> Result<Self> {
        Self::from_state(state)
    }
}

impl From<MinMaxScaler> for ScalerState {
    fn from(scaler: MinMaxScaler) -> Self {
        scaler.state
    }
}
