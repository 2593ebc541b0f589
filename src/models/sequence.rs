use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::domain::{AnalysisError, Result};

/// `time_steps` consecutive scaled values and the value that follows them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Window {
    pub values: Vec<f64>,
    pub target: f64,
    /// Position of `target` in the source series.
    pub target_index: usize,
}

/// Chronological split. Every test window targets a later index than every train window.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<Window>,
    pub test: Vec<Window>,
}

impl TrainTestSplit {
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Series index of the first test target, if there is a test set.
    pub fn first_test_index(&self) -> Option<usize> {
        self.test.first().map(|w| w.target_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceSplitter {
    pub time_steps: usize,
    pub train_fraction: f64,
}

impl SequenceSplitter {
    pub fn new(time_steps: usize, train_fraction: f64) -> Self {
        Self {
            time_steps,
            train_fraction,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.time_steps, config.train_fraction)
    }

    /// Every `(values[i - t..i], values[i])` for `i >= t`, in order.
    pub fn windows(&self, values: &[f64]) -> Result<Vec<Window>> {
        let t = self.time_steps;
        if values.len() < t + 1 {
            return Err(AnalysisError::InsufficientData {
                required: t + 1,
                available: values.len(),
            });
        }

        Ok(values
            .windows(t + 1)
            .enumerate()
            .map(|(start, w)| Window {
                values: w[..t].to_vec(),
                target: w[t],
                target_index: start + t,
            })
            .collect())
    }

    fn check_fraction(&self) -> Result<()> {
        let f = self.train_fraction;
        if !(f.is_finite() && f > 0.0 && f < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "train_fraction must lie strictly between 0 and 1 (got {})",
                f
            )));
        }
        Ok(())
    }

    /// Splits the windows positionally at `floor(window_count * train_fraction)`.
    pub fn split(&self, values: &[f64]) -> Result<TrainTestSplit> {
        self.check_fraction()?;
        let mut train = self.windows(values)?;
        let split_at = (train.len() as f64 * self.train_fraction).floor() as usize;
        if split_at == 0 {
            return Err(AnalysisError::InsufficientData {
                required: self.min_observations()?,
                available: values.len(),
            });
        }
        let test = train.split_off(split_at.min(train.len()));
        Ok(TrainTestSplit { train, test })
    }

    /// Smallest series length that yields at least one training window.
    pub fn min_observations(&self) -> Result<usize> {
        self.check_fraction()?;
        let mut windows = (1.0 / self.train_fraction).ceil() as usize;
        // ceil of a rounded reciprocal can land one short
        if ((windows as f64) * self.train_fraction).floor() < 1.0 {
            windows += 1;
        }
        Ok(self.time_steps.saturating_add(windows.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_window_count_is_n_minus_t() {
        let splitter = SequenceSplitter::new(10, 0.8);
        let windows = splitter.windows(&ramp(100)).unwrap();
        assert_eq!(windows.len(), 90);
        assert_eq!(windows[0].values, ramp(10));
        assert_eq!(windows[0].target, 10.0);
        assert_eq!(windows[89].target_index, 99);
    }

    #[test]
    fn test_split_sizes_and_order() {
        let splitter = SequenceSplitter::new(10, 0.8);
        let split = splitter.split(&ramp(100)).unwrap();
        assert_eq!(split.train.len(), 72);
        assert_eq!(split.test.len(), 18);
        assert_eq!(split.total(), 90);

        let last_train = split.train.last().unwrap().target_index;
        assert!(split.test.iter().all(|w| w.target_index > last_train));
        assert_eq!(split.first_test_index(), Some(82));
    }

    #[test]
    fn test_too_short_series_is_insufficient() {
        let splitter = SequenceSplitter::new(60, 0.8);
        let err = splitter.split(&ramp(50)).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: 61,
                available: 50
            }
        );
    }

    #[test]
    fn test_single_window_leaves_no_training_data() {
        let splitter = SequenceSplitter::new(5, 0.8);
        assert!(splitter.windows(&ramp(6)).is_ok());
        let err = splitter.split(&ramp(6)).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
        assert_eq!(splitter.min_observations(), Ok(7));
        assert!(splitter.split(&ramp(7)).is_ok());
    }

    #[test]
    fn test_unusable_fraction_is_rejected() {
        for f in [0.0, -0.5, 1.0, f64::NAN, f64::INFINITY] {
            let splitter = SequenceSplitter::new(5, f);
            assert!(matches!(
                splitter.split(&ramp(8)),
                Err(AnalysisError::InvalidConfig(_))
            ));
            assert!(splitter.min_observations().is_err());
        }
    }

    #[test]
    fn test_tiny_fraction_reports_bound_without_iterating() {
        let splitter = SequenceSplitter::new(5, 1e-15);
        let err = splitter.split(&ramp(8)).unwrap_err();
        match err {
            AnalysisError::InsufficientData { required, available } => {
                assert!(required >= 1_000_000_000_000_000);
                assert_eq!(available, 8);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(SequenceSplitter::new(10, 0.1).min_observations(), Ok(20));
        assert_eq!(SequenceSplitter::new(10, 0.5).min_observations(), Ok(12));
    }
}
