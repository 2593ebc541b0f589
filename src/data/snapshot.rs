use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::config::{ForecastConfig, PERSISTENCE, RegressorKind, model_snapshot_filename};
use crate::engine::TrainedForecaster;
use crate::models::{ForecastResult, MinMaxScaler, PriceSeries, Regressor, SequenceRegressor};
use crate::utils::now_timestamp_ms;

/// Trained model plus the scaler it was trained behind, keyed by symbol.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelSnapshot {
    pub version: f64,
    pub created_ms: i64,
    pub symbol: String,
    pub time_steps: usize,
    pub scaler: MinMaxScaler,
    pub regressor: Regressor,
}

impl ModelSnapshot {
    pub fn new(forecast: &ForecastResult, regressor: Regressor) -> Self {
        Self {
            version: PERSISTENCE.models.version,
            created_ms: now_timestamp_ms(),
            symbol: forecast.symbol.clone(),
            time_steps: regressor.time_steps(),
            scaler: forecast.scaler,
            regressor,
        }
    }

    pub fn kind(&self) -> RegressorKind {
        self.regressor.kind()
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(model_snapshot_filename(&self.symbol, self.kind()))
    }

    /// Forecaster over `series` using the stored scaler and model. Window length comes from the snapshot.
    pub fn into_forecaster(
        self,
        series: &PriceSeries,
        config: ForecastConfig,
    ) -> crate::domain::Result<TrainedForecaster<'_, Regressor>> {
        let config = config.with_time_steps(self.time_steps);
        TrainedForecaster::restore(series, self.scaler, self.regressor, config)
    }
}

// Helper function to create a new file and any missing parent directories.
fn create_file_with_parents(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))
}

/// Writes the snapshot with bincode under `dir` and returns the file path.
pub fn save_snapshot(dir: &Path, snapshot: &ModelSnapshot) -> Result<PathBuf> {
    let full_path = snapshot.path_in(dir);
    let file = create_file_with_parents(&full_path)?;
    let writer = BufWriter::new(file);

    bincode::serialize_into(writer, snapshot)
        .with_context(|| format!("Failed to serialize snapshot to: {}", full_path.display()))?;

    log::info!("Model snapshot written: {}", full_path.display());
    Ok(full_path)
}

pub fn load_snapshot(path: &Path) -> Result<ModelSnapshot> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let mut reader = BufReader::new(file);

    let snapshot: ModelSnapshot = bincode::deserialize_from(&mut reader)
        .with_context(|| format!("Failed to deserialize snapshot from: {:?}", path))?;

    if snapshot.version != PERSISTENCE.models.version {
        bail!(
            "Snapshot version mismatch: file v{} vs required v{}",
            snapshot.version,
            PERSISTENCE.models.version
        );
    }

    Ok(snapshot)
}

/// Async wrapper for save_snapshot (bincode is CPU-bound)
pub async fn save_snapshot_async(dir: PathBuf, snapshot: ModelSnapshot) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || save_snapshot(&dir, &snapshot))
        .await
        .context("Snapshot write task panicked")?
}
