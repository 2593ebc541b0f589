#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod report;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries)
pub use config::{ANALYSIS, AnalysisConfig, PERSISTENCE, RegressorKind};
pub use domain::{AnalysisError, Candle, SymbolInterval};
pub use engine::{AnalysisReport, ForecastEngine};
pub use models::PriceSeries;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::constants::{BENCHMARK_SYMBOL, DEFAULT_SYMBOLS};
use crate::data::{
    ModelSnapshot, PriceSource, SqliteStorage, fetch_series, fetch_symbol_series,
    save_snapshot_async,
};
use crate::engine::{FailureStage, SymbolFailure, SymbolInput};
use crate::utils::TimeUtils;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Indicators and price forecasts from a local price store", long_about = None)]
pub struct Cli {
    /// SQLite price store (fill it with `import_prices`)
    #[arg(long, default_value = PERSISTENCE.prices.db_path)]
    pub db: String,

    /// Comma-separated symbols to analyse
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Number of future steps to forecast
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Input window length for the regressor
    #[arg(long)]
    pub time_steps: Option<usize>,

    #[arg(long, value_enum)]
    pub regressor: Option<RegressorKind>,

    /// JSON file overriding any part of the analysis config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Index used for comparative statistics
    #[arg(long, default_value = BENCHMARK_SYMBOL)]
    pub benchmark: String,

    /// Write each trained model to the snapshot directory
    #[arg(long, default_value_t = false)]
    pub save_models: bool,
}

impl Cli {
    /// Defaults, then the config file, then individual flags.
    pub fn resolve_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load_json(path)?,
            None => ANALYSIS,
        };
        if let Some(h) = self.horizon {
            config.forecast = config.forecast.with_horizon(h);
        }
        if let Some(t) = self.time_steps {
            config.forecast = config.forecast.with_time_steps(t);
        }
        if let Some(kind) = self.regressor {
            config.regressor.kind = kind;
        }
        config.forecast.validate()?;
        Ok(config)
    }

    /// Trimmed, upper-cased and de-duplicated. Falls back to the default list.
    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in &self.symbols {
            let s = s.trim().to_uppercase();
            if !s.is_empty() && !out.contains(&s) {
                out.push(s);
            }
        }
        if out.is_empty() {
            out = DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect();
        }
        out
    }
}

/// Fetches, analyses and optionally persists every requested symbol.
pub async fn run(args: Cli) -> Result<AnalysisReport> {
    let config = args.resolve_config()?;
    let storage = SqliteStorage::open(&args.db).await?;
    run_with_source(&storage, &args, config).await
}

async fn run_with_source(
    source: &dyn PriceSource,
    args: &Cli,
    config: AnalysisConfig,
) -> Result<AnalysisReport> {
    let symbols = args.symbols();
    let lookback_ms = i64::from(config.lookback_days) * TimeUtils::MS_IN_D;

    let inputs: Vec<SymbolInput> = fetch_symbol_series(source, &symbols, config.interval_ms, None)
        .await
        .into_iter()
        .map(|(symbol, outcome)| (symbol, outcome.map(|s| s.trailing(lookback_ms))))
        .collect();

    let benchmark = match fetch_series(source, &args.benchmark, config.interval_ms, None).await {
        Ok(series) => Some(series.trailing(lookback_ms)),
        Err(e) => {
            log::warn!("Benchmark unavailable: {}", e);
            None
        }
    };

    let mut report = tokio::task::spawn_blocking(move || {
        ForecastEngine::new(config).run_batch(inputs, benchmark.as_ref())
    })
    .await
    .context("Analysis task panicked")?;

    if args.save_models {
        persist_models(&mut report, Path::new(PERSISTENCE.models.directory)).await;
    }

    Ok(report)
}

/// Saves every trained model. A failed write is recorded against its symbol.
async fn persist_models(report: &mut AnalysisReport, dir: &Path) {
    let mut failures = Vec::new();

    for bundle in report.bundles.values() {
        let (Some(forecast), Some(model)) = (&bundle.forecast, &bundle.model) else {
            continue;
        };
        let snapshot = ModelSnapshot::new(forecast, model.clone());
        if let Err(e) = save_snapshot_async(dir.to_path_buf(), snapshot).await {
            log::error!("Failed to save model for {}: {:#}", bundle.symbol, e);
            failures.push(SymbolFailure::new(
                &bundle.symbol,
                FailureStage::Persist,
                AnalysisError::Persistence(format!("{:#}", e)),
            ));
        }
    }

    report.failures.extend(failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryPriceSource;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["ticker-forecast"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    fn candles(n: usize, phase: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.2 + phase).sin() * 4.0;
                Candle::from_close(i as i64 * TimeUtils::MS_IN_D, close)
            })
            .collect()
    }

    #[test]
    fn test_cli_defaults() {
        let args = cli(&[]);
        assert_eq!(args.db, PERSISTENCE.prices.db_path);
        assert_eq!(args.benchmark, BENCHMARK_SYMBOL);
        assert_eq!(args.symbols().len(), DEFAULT_SYMBOLS.len());
        assert_eq!(args.resolve_config().unwrap(), ANALYSIS);
    }

    #[test]
    fn test_cli_overrides() {
        let args = cli(&[
            "--symbols",
            "aapl, msft,AAPL",
            "--horizon",
            "5",
            "--time-steps",
            "12",
            "--regressor",
            "lstm",
        ]);
        assert_eq!(args.symbols(), vec!["AAPL".to_string(), "MSFT".to_string()]);

        let config = args.resolve_config().unwrap();
        assert_eq!(config.forecast.horizon_steps, 5);
        assert_eq!(config.forecast.time_steps, 12);
        assert_eq!(config.regressor.kind, RegressorKind::Lstm);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        assert!(cli(&["--horizon", "0"]).resolve_config().is_err());
    }

    #[tokio::test]
    async fn test_run_with_source_end_to_end() {
        let source = InMemoryPriceSource::new()
            .with_candles("AAA", candles(120, 0.0))
            .with_candles("BBB", candles(120, 1.5))
            .with_candles(BENCHMARK_SYMBOL, candles(120, 0.7))
            .with_unavailable("DOWN");

        let args = cli(&["--symbols", "AAA,BBB,DOWN,MISSING", "--time-steps", "10"]);
        let config = args.resolve_config().unwrap();
        let report = run_with_source(&source, &args, config).await.unwrap();

        assert_eq!(report.bundles.len(), 2);
        assert!(report.bundles["AAA"].forecast.is_some());
        assert_eq!(report.skipped().count(), 2);
        assert_eq!(report.benchmark.as_ref().unwrap().symbol, BENCHMARK_SYMBOL);
        assert_eq!(report.correlations.as_ref().unwrap().symbols.len(), 3);
    }

    #[tokio::test]
    async fn test_persist_failure_is_recorded() {
        let source = InMemoryPriceSource::new().with_candles("AAA", candles(80, 0.0));
        let args = cli(&["--symbols", "AAA", "--time-steps", "10"]);
        let config = args.resolve_config().unwrap();
        let mut report = run_with_source(&source, &args, config).await.unwrap();

        // A file where the directory should be makes every write fail
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();
        persist_models(&mut report, &blocker).await;

        let failure = report.failure_for("AAA").unwrap();
        assert_eq!(failure.stage, FailureStage::Persist);
        assert_eq!(failure.error.kind(), "persistence");
    }

    #[tokio::test]
    async fn test_persist_writes_snapshots() {
        let source = InMemoryPriceSource::new().with_candles("AAA", candles(80, 0.0));
        let args = cli(&["--symbols", "AAA", "--time-steps", "10"]);
        let config = args.resolve_config().unwrap();
        let mut report = run_with_source(&source, &args, config).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        persist_models(&mut report, dir.path()).await;
        assert!(report.failures.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
