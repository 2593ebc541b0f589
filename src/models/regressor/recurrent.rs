use ndarray::{Array1, Array2, ArrayView1, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{SequenceRegressor, check_training_set, check_window};
use crate::config::constants::lstm::{BETA1, BETA2, EPSILON};
use crate::config::{DF, LstmSettings};
use crate::domain::{AnalysisError, Result};
use crate::models::Window;

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Single-input LSTM cell. Gate rows are stacked as [input, forget, candidate, output].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct LstmCell {
    hidden_size: usize,
    w_x: Array1<f64>,
    w_h: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmCell {
    fn new(hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let rows = 4 * hidden_size;

        let w_x = Array1::from_shape_fn(rows, |_| rng.gen_range(-limit..limit));
        let w_h = Array2::from_shape_fn((rows, hidden_size), |_| rng.gen_range(-limit..limit));

        // Forget gate bias starts at 1
        let mut bias = Array1::<f64>::zeros(rows);
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            hidden_size,
            w_x,
            w_h,
            bias,
        }
    }

    fn forward(&self, x: f64, h_prev: &Array1<f64>, c_prev: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let hs = self.hidden_size;
        let z = &self.w_x * x + self.w_h.dot(h_prev) + &self.bias;

        let i_gate = z.slice(s![0..hs]).mapv(sigmoid);
        let f_gate = z.slice(s![hs..2 * hs]).mapv(sigmoid);
        let g = z.slice(s![2 * hs..3 * hs]).mapv(f64::tanh);
        let o_gate = z.slice(s![3 * hs..4 * hs]).mapv(sigmoid);

        let c_next = &f_gate * c_prev + &i_gate * &g;
        let h_next = &o_gate * &c_next.mapv(f64::tanh);
        (h_next, c_next)
    }

    /// Runs the window through the cell and returns the final hidden state.
    fn encode(&self, window: &[f64]) -> Array1<f64> {
        let mut h = Array1::<f64>::zeros(self.hidden_size);
        let mut c = Array1::<f64>::zeros(self.hidden_size);
        for &x in window {
            let (h_next, c_next) = self.forward(x, &h, &c);
            h = h_next;
            c = c_next;
        }
        h
    }
}

/// Recurrent regressor: a seeded LSTM cell encodes the window, a linear readout trained with
/// Adam on mean squared error maps the encoding to the next value.
///
/// The readout sees the final hidden state plus the last input value.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LstmRegressor {
    time_steps: usize,
    settings: LstmSettings,
    seed: u64,
    cell: LstmCell,
    readout: Array1<f64>,
    readout_bias: f64,
    trained: bool,
    #[serde(skip)]
    loss_history: Vec<f64>,
}

impl LstmRegressor {
    pub fn new(time_steps: usize, settings: LstmSettings, seed: u64) -> Self {
        let hidden = settings.hidden_size.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let cell = LstmCell::new(hidden, &mut rng);

        Self {
            time_steps,
            settings,
            seed,
            cell,
            readout: Array1::zeros(hidden + 1),
            readout_bias: 0.0,
            trained: false,
            loss_history: Vec::new(),
        }
    }

    /// Mean squared error per epoch of the last training run.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn features(&self, window: &[f64]) -> Array1<f64> {
        let h = self.cell.encode(window);
        let last = window.last().copied().unwrap_or(0.0);
        let mut f = Array1::<f64>::zeros(h.len() + 1);
        f.slice_mut(s![..h.len()]).assign(&h);
        f[h.len()] = last;
        f
    }

    fn apply_readout(&self, features: ArrayView1<f64>) -> f64 {
        features.dot(&self.readout) + self.readout_bias
    }
}

impl SequenceRegressor for LstmRegressor {
    fn name(&self) -> &'static str {
        "lstm"
    }

    fn time_steps(&self) -> usize {
        self.time_steps
    }

    fn train(&mut self, windows: &[Window]) -> Result<()> {
        check_training_set(self.time_steps, windows)?;

        let rows = windows.len();
        let width = self.readout.len();

        // Cell weights stay fixed, so encode every window once
        let mut x = Array2::<f64>::zeros((rows, width));
        for (r, w) in windows.iter().enumerate() {
            x.row_mut(r).assign(&self.features(&w.values));
        }
        let y = Array1::from_iter(windows.iter().map(|w| w.target));

        let batch_size = self.settings.batch_size.clamp(1, rows);
        let lr = self.settings.learning_rate;

        let mut w = Array1::<f64>::zeros(width);
        let mut b: f64 = 0.0;
        let (mut m_w, mut v_w) = (Array1::<f64>::zeros(width), Array1::<f64>::zeros(width));
        let (mut m_b, mut v_b): (f64, f64) = (0.0, 0.0);
        let mut step = 0i32;

        self.loss_history.clear();

        for epoch in 0..self.settings.epochs {
            let mut epoch_loss = 0.0;

            for start in (0..rows).step_by(batch_size) {
                let end = (start + batch_size).min(rows);
                let xb = x.slice(s![start..end, ..]);
                let yb = y.slice(s![start..end]);
                let m = (end - start) as f64;

                let err = xb.dot(&w) + b - &yb;
                epoch_loss += err.mapv(|e| e * e).sum();

                let grad_w = xb.t().dot(&err) * (2.0 / m);
                let grad_b = err.sum() * (2.0 / m);

                step += 1;
                let bc1 = 1.0 - BETA1.powi(step);
                let bc2 = 1.0 - BETA2.powi(step);

                m_w = &m_w * BETA1 + &grad_w * (1.0 - BETA1);
                v_w = &v_w * BETA2 + &grad_w.mapv(|g| g * g) * (1.0 - BETA2);
                m_b = m_b * BETA1 + grad_b * (1.0 - BETA1);
                v_b = v_b * BETA2 + grad_b * grad_b * (1.0 - BETA2);

                let update = (&m_w / bc1) / ((&v_w / bc2).mapv(f64::sqrt) + EPSILON);
                w = w - update * lr;
                b -= lr * (m_b / bc1) / ((v_b / bc2).sqrt() + EPSILON);
            }

            let mse = epoch_loss / rows as f64;
            if !mse.is_finite() {
                return Err(AnalysisError::TrainingFailure(format!(
                    "loss diverged at epoch {}",
                    epoch
                )));
            }
            self.loss_history.push(mse);

            if DF.log_training && (epoch % 50 == 0 || epoch + 1 == self.settings.epochs) {
                log::info!("lstm epoch {:>4}: mse {:.8}", epoch, mse);
            }
        }

        if w.iter().any(|v| !v.is_finite()) || !b.is_finite() {
            return Err(AnalysisError::TrainingFailure(
                "readout weights are not finite".to_string(),
            ));
        }

        self.readout = w;
        self.readout_bias = b;
        self.trained = true;
        Ok(())
    }

    fn predict_one(&self, window: &[f64]) -> Result<f64> {
        check_window(self, window)?;
        let features = self.features(window);
        Ok(self.apply_readout(features.view()))
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
