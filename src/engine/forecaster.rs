//! Scaler + windowing + regressor, driven as `Forecaster` (untrained) ->
//! `TrainedForecaster` (history evaluation, rollout) -> `ForecastResult` (done).

use std::collections::VecDeque;

use crate::config::{DF, ForecastConfig};
use crate::domain::{AnalysisError, Result};
use crate::models::{
    ForecastPoint, ForecastResult, HistoricalPoint, MinMaxScaler, PriceSeries, SequenceRegressor,
    SequenceSplitter, TrainTestSplit,
};

use super::metrics::forecast_metrics;

/// Fixed-size sliding buffer fed back into the regressor during the rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutWindow {
    buffer: VecDeque<f64>,
}

impl RolloutWindow {
    pub fn seed(tail: &[f64]) -> Self {
        Self {
            buffer: tail.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn values(&mut self) -> &[f64] {
        self.buffer.make_contiguous()
    }

    /// Drops the oldest value and appends `next`.
    pub fn advance(&mut self, next: f64) {
        self.buffer.pop_front();
        self.buffer.push_back(next);
    }
}

/// Untrained forecaster: a regressor and the settings it will be trained with.
pub struct Forecaster<R: SequenceRegressor> {
    regressor: R,
    config: ForecastConfig,
}

impl<R: SequenceRegressor> Forecaster<R> {
    pub fn new(regressor: R, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        if regressor.time_steps() != config.time_steps {
            return Err(AnalysisError::InvalidConfig(format!(
                "regressor expects windows of {} but forecaster uses {}",
                regressor.time_steps(),
                config.time_steps
            )));
        }
        Ok(Self { regressor, config })
    }

    /// Fits the scaler on the whole close column, windows it and trains on the train windows.
    pub fn train(mut self, series: &PriceSeries) -> Result<TrainedForecaster<'_, R>> {
        if series.is_empty() {
            return Err(AnalysisError::NoData {
                symbol: series.symbol().to_string(),
            });
        }

        let (scaler, scaled) = MinMaxScaler::fit_transform(series.closes())?;
        let split = SequenceSplitter::from_config(&self.config).split(&scaled)?;

        let label = format!("train {} [{}]", self.regressor.name(), series.symbol());
        crate::trace_time!(&label, 200_000, { self.regressor.train(&split.train) })?;

        if DF.log_training {
            log::info!(
                "{}: trained {} on {} windows ({} held out)",
                series.symbol(),
                self.regressor.name(),
                split.train.len(),
                split.test.len()
            );
        }

        Ok(TrainedForecaster {
            series,
            scaler,
            scaled,
            split,
            regressor: self.regressor,
            config: self.config,
        })
    }
}

pub struct TrainedForecaster<'a, R: SequenceRegressor> {
    series: &'a PriceSeries,
    scaler: MinMaxScaler,
    scaled: Vec<f64>,
    split: TrainTestSplit,
    regressor: R,
    config: ForecastConfig,
}

impl<'a, R: SequenceRegressor> TrainedForecaster<'a, R> {
    /// Rebuilds a trained forecaster from a previously fitted scaler and regressor.
    ///
    /// The scaler is reused as-is, so prices outside its fitted range map outside [0, 1].
    pub fn restore(
        series: &'a PriceSeries,
        scaler: MinMaxScaler,
        regressor: R,
        config: ForecastConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !regressor.is_trained() {
            return Err(AnalysisError::TrainingFailure(format!(
                "{} has not been trained",
                regressor.name()
            )));
        }
        if regressor.time_steps() != config.time_steps {
            return Err(AnalysisError::InvalidConfig(format!(
                "regressor expects windows of {} but forecaster uses {}",
                regressor.time_steps(),
                config.time_steps
            )));
        }
        if series.is_empty() {
            return Err(AnalysisError::NoData {
                symbol: series.symbol().to_string(),
            });
        }

        let scaled = scaler.transform_all(series.closes());
        let split = SequenceSplitter::from_config(&config).split(&scaled)?;
        Ok(Self {
            series,
            scaler,
            scaled,
            split,
            regressor,
            config,
        })
    }
}

impl<R: SequenceRegressor> TrainedForecaster<'_, R> {
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    fn predict(&self, window: &[f64]) -> Result<f64> {
        let y = self.regressor.predict_one(window)?;
        if !y.is_finite() {
            return Err(AnalysisError::TrainingFailure(format!(
                "{} produced a non-finite prediction",
                self.regressor.name()
            )));
        }
        Ok(y)
    }

    /// One-step predictions over the test windows, back in price units, aligned to their targets.
    pub fn evaluate_history(&self) -> Result<Vec<HistoricalPoint>> {
        self.split
            .test
            .iter()
            .map(|w| {
                let predicted = self.scaler.inverse(self.predict(&w.values)?);
                Ok(HistoricalPoint {
                    timestamp_ms: self.series.timestamps[w.target_index],
                    predicted,
                    actual: self.series.close_prices[w.target_index],
                })
            })
            .collect()
    }

    /// Autoregressive rollout of `horizon_steps` beyond the last observation.
    ///
    /// Each scaled prediction is fed back as the newest input. Timestamps step at the
    /// series' native interval with no calendar gaps.
    pub fn rollout(&self) -> Result<Vec<ForecastPoint>> {
        let t = self.config.time_steps;
        let horizon = self.config.horizon_steps;

        let interval = self
            .series
            .interval_ms()
            .filter(|i| *i > 0)
            .ok_or_else(|| {
                AnalysisError::InvalidSeries(format!(
                    "{}: cannot infer a sampling interval",
                    self.series.symbol()
                ))
            })?;
        let last_ts = self.series.last_timestamp().ok_or_else(|| AnalysisError::NoData {
            symbol: self.series.symbol().to_string(),
        })?;

        let mut window = RolloutWindow::seed(&self.scaled[self.scaled.len() - t..]);
        let mut scaled_path = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = self.predict(window.values())?;
            scaled_path.push(next);
            window.advance(next);
        }

        Ok(self
            .scaler
            .inverse_all(&scaled_path)
            .into_iter()
            .enumerate()
            .map(|(k, predicted)| ForecastPoint {
                timestamp_ms: last_ts + (k as i64 + 1) * interval,
                predicted,
            })
            .collect())
    }

    /// Runs both passes and hands back the result together with the trained regressor.
    pub fn finish(self) -> Result<(ForecastResult, R)> {
        let historical = self.evaluate_history()?;
        let label = format!("rollout [{}]", self.series.symbol());
        let future = crate::trace_time!(&label, 50_000, { self.rollout() })?;
        let metrics = forecast_metrics(&historical);

        let result = ForecastResult {
            symbol: self.series.symbol().to_string(),
            historical,
            future,
            metrics,
            scaler: self.scaler,
        };
        Ok((result, self.regressor))
    }
}
