//! Analysis and computation configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::constants::{forecast, indicators, lstm, ridge};
use crate::domain::AnalysisError;
use crate::utils::TimeUtils;

/// Window sizes for the indicator transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_short: usize,
    pub sma_medium: usize,
    pub sma_long: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub band_period: usize,
    /// Band half-width in standard deviations
    pub band_width_k: f64,
    pub momentum_lag: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        ANALYSIS.indicators
    }
}

/// Windowing, split and rollout settings for the forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Length of every input window
    pub time_steps: usize,
    /// Share of windows used for training (0 < f < 1)
    pub train_fraction: f64,
    /// Number of future steps produced by the rollout
    pub horizon_steps: usize,
    pub seed: u64,
}

impl ForecastConfig {
    pub fn validate(&self) -> crate::domain::Result<()> {
        if self.time_steps == 0 {
            return Err(AnalysisError::InvalidConfig(
                "time_steps must be at least 1".to_string(),
            ));
        }
        if !(self.train_fraction >= forecast::MIN_TRAIN_FRACTION && self.train_fraction < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "train_fraction must lie in [{}, 1) (got {})",
                forecast::MIN_TRAIN_FRACTION,
                self.train_fraction
            )));
        }
        if self.horizon_steps == 0 {
            return Err(AnalysisError::InvalidConfig(
                "horizon_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }

    pub fn with_horizon(mut self, horizon_steps: usize) -> Self {
        self.horizon_steps = horizon_steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ANALYSIS.forecast
    }
}

/// Which sequence regressor the engine trains per symbol.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegressorKind {
    #[default]
    Autoregressive,
    Lstm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmSettings {
    pub hidden_size: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for LstmSettings {
    fn default() -> Self {
        ANALYSIS.regressor.lstm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressorConfig {
    pub kind: RegressorKind,
    /// Ridge penalty for the autoregressive solve
    pub ridge_lambda: f64,
    pub lstm: LstmSettings,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        ANALYSIS.regressor
    }
}

/// The Master Analysis Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Native sampling interval requested from the price source
    pub interval_ms: i64,
    /// How much history to request per symbol
    pub lookback_days: u32,

    pub indicators: IndicatorConfig,
    pub forecast: ForecastConfig,
    pub regressor: RegressorConfig,
}

impl AnalysisConfig {
    /// Reads a (possibly partial) JSON override. Missing fields keep their defaults.
    pub fn load_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.forecast.validate()?;
        Ok(config)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        ANALYSIS
    }
}

pub const ANALYSIS: AnalysisConfig = AnalysisConfig {
    interval_ms: TimeUtils::MS_IN_D,
    lookback_days: 365,

    indicators: IndicatorConfig {
        sma_short: indicators::SMA_SHORT,
        sma_medium: indicators::SMA_MEDIUM,
        sma_long: indicators::SMA_LONG,
        ema_fast: indicators::EMA_FAST,
        ema_slow: indicators::EMA_SLOW,
        macd_signal: indicators::MACD_SIGNAL,
        rsi_period: indicators::RSI_PERIOD,
        band_period: indicators::BAND_PERIOD,
        band_width_k: indicators::BAND_WIDTH_K,
        momentum_lag: indicators::MOMENTUM_LAG,
    },

    forecast: ForecastConfig {
        time_steps: forecast::TIME_STEPS,
        train_fraction: forecast::TRAIN_FRACTION,
        horizon_steps: forecast::HORIZON_STEPS,
        seed: forecast::SEED,
    },

    regressor: RegressorConfig {
        kind: RegressorKind::Autoregressive,
        ridge_lambda: ridge::LAMBDA,
        lstm: LstmSettings {
            hidden_size: lstm::HIDDEN_SIZE,
            epochs: lstm::EPOCHS,
            batch_size: lstm::BATCH_SIZE,
            learning_rate: lstm::LEARNING_RATE,
        },
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn test_defaults_match_documented_windows() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.indicators.sma_short, 20);
        assert_eq!(cfg.indicators.sma_long, 200);
        assert_eq!(cfg.forecast.time_steps, 60);
        assert!((cfg.forecast.train_fraction - 0.8).abs() < f64::EPSILON);
        assert!(cfg.forecast.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let cfg = ForecastConfig {
            train_fraction: 1.0,
            ..ForecastConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
        let cfg = ForecastConfig::default().with_time_steps(0);
        assert!(cfg.validate().is_err());

        for train_fraction in [0.0, 1e-15, f64::NAN] {
            let cfg = ForecastConfig {
                train_fraction,
                ..ForecastConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));
        }
        let cfg = ForecastConfig {
            train_fraction: forecast::MIN_TRAIN_FRACTION,
            ..ForecastConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "forecast": {{ "time_steps": 10, "horizon_steps": 5 }}, "regressor": {{ "kind": "lstm" }} }}"#
        )
        .unwrap();

        let cfg = AnalysisConfig::load_json(file.path()).unwrap();
        assert_eq!(cfg.forecast.time_steps, 10);
        assert_eq!(cfg.forecast.horizon_steps, 5);
        assert_eq!(cfg.forecast.seed, forecast::SEED);
        assert_eq!(cfg.regressor.kind, RegressorKind::Lstm);
        assert_eq!(cfg.indicators, IndicatorConfig::default());
    }

    #[test]
    fn test_regressor_kind_strings() {
        assert_eq!(RegressorKind::Autoregressive.to_string(), "autoregressive");
        assert_eq!(RegressorKind::from_str("lstm").unwrap(), RegressorKind::Lstm);
    }
}
