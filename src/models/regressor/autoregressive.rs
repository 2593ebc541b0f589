use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{SequenceRegressor, check_training_set, check_window};
use crate::config::DF;
use crate::domain::{AnalysisError, Result};
use crate::models::Window;

/// Linear AR(p) model: `y = b + sum(w_k * x_k)` over the window, fitted by ridge-regularised
/// least squares.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AutoregressiveRegressor {
    time_steps: usize,
    lambda: f64,
    /// Lag weights followed by the intercept. Empty until trained.
    coefficients: Vec<f64>,
}

impl AutoregressiveRegressor {
    pub fn new(time_steps: usize, lambda: f64) -> Self {
        Self {
            time_steps,
            lambda: lambda.max(0.0),
            coefficients: Vec::new(),
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl SequenceRegressor for AutoregressiveRegressor {
    fn name(&self) -> &'static str {
        "autoregressive"
    }

    fn time_steps(&self) -> usize {
        self.time_steps
    }

    fn train(&mut self, windows: &[Window]) -> Result<()> {
        check_training_set(self.time_steps, windows)?;

        let p = self.time_steps;
        let rows = windows.len();

        // Design matrix with a trailing column of ones for the intercept
        let x = Array2::from_shape_fn((rows, p + 1), |(r, c)| {
            if c < p { windows[r].values[c] } else { 1.0 }
        });
        let y = Array1::from_iter(windows.iter().map(|w| w.target));

        // Normal equations: (X'X + lambda*I) w = X'y, intercept unpenalised
        let mut xtx = x.t().dot(&x);
        for i in 0..p {
            xtx[[i, i]] += self.lambda;
        }
        let xty = x.t().dot(&y);

        let solution = gauss_elimination(xtx, xty)?;
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::TrainingFailure(
                "autoregressive solve produced non-finite weights".to_string(),
            ));
        }

        if DF.log_training {
            log::info!(
                "AR({}) fitted on {} windows, intercept {:.6}",
                p,
                rows,
                solution[p]
            );
        }

        self.coefficients = solution.to_vec();
        Ok(())
    }

    fn predict_one(&self, window: &[f64]) -> Result<f64> {
        check_window(self, window)?;
        let (weights, intercept) = self.coefficients.split_at(self.time_steps);
        let dot: f64 = weights.iter().zip(window).map(|(w, x)| w * x).sum();
        Ok(dot + intercept[0])
    }

    fn is_trained(&self) -> bool {
        self.coefficients.len() == self.time_steps + 1
    }
}

/// Gaussian elimination with partial pivoting on a square system.
fn gauss_elimination(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        let mut max_row = col;
        for row in (col + 1)..n {
            if a[[row, col]].abs() > a[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..n {
                a.swap([col, j], [max_row, j]);
            }
            b.swap(col, max_row);
        }

        if a[[col, col]].abs() < 1e-15 {
            return Err(AnalysisError::TrainingFailure(
                "normal equations are singular".to_string(),
            ));
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for j in col..n {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut acc = b[i];
        for j in (i + 1)..n {
            acc -= a[[i, j]] * x[j];
        }
        x[i] = acc / a[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SequenceSplitter;

    #[test]
    fn test_gauss_elimination_solves_small_system() {
        // 2x + y = 5, x + 3y = 10
        let a = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 1.0, 3.0]).unwrap();
        let b = Array1::from(vec![5.0, 10.0]);
        let x = gauss_elimination(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_system_is_a_training_failure() {
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        let b = Array1::from(vec![1.0, 2.0]);
        assert!(matches!(
            gauss_elimination(a, b),
            Err(AnalysisError::TrainingFailure(_))
        ));
    }

    #[test]
    fn test_learns_linear_continuation() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let split = SequenceSplitter::new(10, 0.8).split(&values).unwrap();

        let mut model = AutoregressiveRegressor::new(10, 1e-6);
        model.train(&split.train).unwrap();
        assert!(model.is_trained());

        for w in &split.test {
            let pred = model.predict_one(&w.values).unwrap();
            assert!((pred - w.target).abs() < 1e-4, "pred {pred} target {}", w.target);
        }
    }

    #[test]
    fn test_predict_rejects_wrong_length() {
        let mut model = AutoregressiveRegressor::new(3, 1e-6);
        let windows = SequenceSplitter::new(3, 0.8)
            .windows(&[0.0, 0.1, 0.3, 0.2, 0.5, 0.4, 0.9])
            .unwrap();
        model.train(&windows).unwrap();
        assert_eq!(
            model.predict_one(&[0.1, 0.2]),
            Err(AnalysisError::InvalidWindow {
                expected: 3,
                actual: 2
            })
        );
    }
}
