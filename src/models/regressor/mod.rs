//! Trainable one-step-ahead models over scaled windows.

mod autoregressive;
mod recurrent;

pub use autoregressive::AutoregressiveRegressor;
pub use recurrent::LstmRegressor;

use serde::{Deserialize, Serialize};

use crate::config::{RegressorConfig, RegressorKind};
use crate::domain::{AnalysisError, Result};
use crate::models::Window;

/// Anything that can learn "next value given the last `time_steps` values".
///
/// Implementations must be deterministic for a fixed seed.
pub trait SequenceRegressor: Send {
    fn name(&self) -> &'static str;

    /// Exact window length `predict_one` accepts.
    fn time_steps(&self) -> usize;

    fn train(&mut self, windows: &[Window]) -> Result<()>;

    /// Predicts the scaled value following `window`.
    fn predict_one(&self, window: &[f64]) -> Result<f64>;

    fn is_trained(&self) -> bool;
}

/// Shared precondition for `predict_one`.
pub(crate) fn check_window(
    regressor: &dyn SequenceRegressor,
    window: &[f64],
) -> Result<()> {
    if window.len() != regressor.time_steps() {
        return Err(AnalysisError::InvalidWindow {
            expected: regressor.time_steps(),
            actual: window.len(),
        });
    }
    if !regressor.is_trained() {
        return Err(AnalysisError::TrainingFailure("model not trained".to_string()));
    }
    Ok(())
}

/// Shared precondition for `train`.
pub(crate) fn check_training_set(time_steps: usize, windows: &[Window]) -> Result<()> {
    if windows.is_empty() {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    if let Some(bad) = windows.iter().find(|w| w.values.len() != time_steps) {
        return Err(AnalysisError::InvalidWindow {
            expected: time_steps,
            actual: bad.values.len(),
        });
    }
    Ok(())
}

/// Concrete regressors, as one serialisable type for snapshots.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Regressor {
    Autoregressive(AutoregressiveRegressor),
    Lstm(LstmRegressor),
}

impl Regressor {
    pub fn build(config: &RegressorConfig, time_steps: usize, seed: u64) -> Self {
        match config.kind {
            RegressorKind::Autoregressive => {
                Regressor::Autoregressive(AutoregressiveRegressor::new(time_steps, config.ridge_lambda))
            }
            RegressorKind::Lstm => {
                Regressor::Lstm(LstmRegressor::new(time_steps, config.lstm, seed))
            }
        }
    }

    pub fn kind(&self) -> RegressorKind {
        match self {
            Regressor::Autoregressive(_) => RegressorKind::Autoregressive,
            Regressor::Lstm(_) => RegressorKind::Lstm,
        }
    }

    fn inner(&self) -> &dyn SequenceRegressor {
        match self {
            Regressor::Autoregressive(r) => r,
            Regressor::Lstm(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SequenceRegressor {
        match self {
            Regressor::Autoregressive(r) => r,
            Regressor::Lstm(r) => r,
        }
    }
}

impl SequenceRegressor for Regressor {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn time_steps(&self) -> usize {
        self.inner().time_steps()
    }

    fn train(&mut self, windows: &[Window]) -> Result<()> {
        self.inner_mut().train(windows)
    }

    fn predict_one(&self, window: &[f64]) -> Result<f64> {
        self.inner().predict_one(window)
    }

    fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }
}
