use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

use rayon::prelude::*;

use crate::analysis::{CorrelationMatrix, PerformanceSummary, correlation_matrix, summarise};
use crate::config::{AnalysisConfig, DF};
use crate::domain::AnalysisError;
use crate::models::PriceSeries;

use super::messages::{JobRequest, JobResult};
use super::state::{FailureStage, SymbolBundle, SymbolFailure};
use super::worker;

/// Per-symbol outcome of fetching from a price source.
pub type SymbolInput = (String, Result<PriceSeries, AnalysisError>);

/// Aggregated output of one batch: partial results plus every failed symbol.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub bundles: BTreeMap<String, SymbolBundle>,
    pub failures: Vec<SymbolFailure>,
    pub benchmark: Option<PerformanceSummary>,
    pub correlations: Option<CorrelationMatrix>,
}

impl AnalysisReport {
    pub fn skipped(&self) -> impl Iterator<Item = &SymbolFailure> {
        self.failures.iter().filter(|f| f.is_skip())
    }

    pub fn failure_for(&self, symbol: &str) -> Option<&SymbolFailure> {
        self.failures.iter().find(|f| f.symbol == symbol)
    }
}

/// Runs the pipeline over many symbols. Symbols share nothing, so they run in parallel.
pub struct ForecastEngine {
    pub config: AnalysisConfig,

    // Background worker channels, opened on the first dispatch
    job_tx: Option<Sender<JobRequest>>,
    result_rx: Option<Receiver<JobResult>>,
    worker: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl ForecastEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            job_tx: None,
            result_rx: None,
            worker: None,
            in_flight: 0,
        }
    }

    fn ensure_worker(&mut self) -> &Sender<JobRequest> {
        let tx = match self.job_tx.take() {
            Some(tx) => tx,
            None => {
                let (job_tx, job_rx) = channel::<JobRequest>();
                let (result_tx, result_rx) = channel::<JobResult>();
                self.worker = Some(worker::spawn_worker_thread(job_rx, result_tx));
                self.result_rx = Some(result_rx);
                job_tx
            }
        };
        self.job_tx.insert(tx)
    }

    fn request(config: AnalysisConfig, symbol: String, series: PriceSeries) -> JobRequest {
        JobRequest {
            symbol,
            series: Arc::new(series),
            config,
        }
    }

    /// Splits fetch outcomes into runnable series and recorded skips.
    fn partition_inputs(inputs: Vec<SymbolInput>) -> (Vec<(String, PriceSeries)>, Vec<SymbolFailure>) {
        let mut ready = Vec::new();
        let mut failures = Vec::new();
        for (symbol, outcome) in inputs {
            match outcome {
                Ok(series) if series.is_empty() => failures.push(SymbolFailure::new(
                    &symbol,
                    FailureStage::Fetch,
                    AnalysisError::NoData { symbol: symbol.clone() },
                )),
                Ok(series) => ready.push((symbol, series)),
                Err(e) => failures.push(SymbolFailure::new(symbol, FailureStage::Fetch, e)),
            }
        }
        (ready, failures)
    }

    /// Processes every symbol on the rayon pool and joins into one report.
    pub fn run_batch(&self, inputs: Vec<SymbolInput>, benchmark: Option<&PriceSeries>) -> AnalysisReport {
        let (ready, mut failures) = Self::partition_inputs(inputs);
        for f in &failures {
            log::warn!("Skipping {}: {}", f.symbol, f.error);
        }

        let series_for_stats: Vec<PriceSeries> = ready.iter().map(|(_, s)| s.clone()).collect();

        // Receiver is not Sync, so the pool only sees a copy of the config
        let config = self.config;
        let results: Vec<JobResult> = crate::trace_time!("run_batch", 1_000_000, {
            ready
                .into_par_iter()
                .map(|(symbol, series)| worker::run_job(Self::request(config, symbol, series)))
                .collect()
        });

        let mut report = AnalysisReport::default();
        for result in results {
            if let Some(f) = result.failure {
                failures.push(f);
            }
            report.bundles.insert(result.symbol, result.bundle);
        }
        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        report.failures = failures;

        report.benchmark = benchmark.and_then(summarise);
        let mut all: Vec<&PriceSeries> = series_for_stats.iter().collect();
        if let Some(b) = benchmark {
            all.push(b);
        }
        if all.len() > 1 {
            report.correlations = Some(correlation_matrix(&all));
        }

        if DF.log_engine {
            log::info!(
                "Batch finished: {} processed, {} failures",
                report.bundles.len(),
                report.failures.len()
            );
        }
        report
    }

    /// Queues one symbol on the background worker.
    pub fn dispatch_job(&mut self, symbol: String, series: PriceSeries) -> anyhow::Result<()> {
        let req = Self::request(self.config, symbol, series);
        self.ensure_worker()
            .send(req)
            .map_err(|e| anyhow::anyhow!("worker channel closed: {}", e))?;
        self.in_flight += 1;
        Ok(())
    }

    pub fn get_queue_len(&self) -> usize {
        self.in_flight
    }

    /// Results that are ready now, without blocking.
    pub fn poll_results(&mut self) -> Vec<JobResult> {
        let Some(rx) = &self.result_rx else {
            return Vec::new();
        };
        let ready: Vec<JobResult> = rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(ready.len());
        ready
    }

    /// Blocks until every dispatched job has reported back.
    pub fn wait_all(&mut self) -> Vec<JobResult> {
        let mut out = Vec::with_capacity(self.in_flight);
        let Some(rx) = &self.result_rx else {
            return out;
        };
        while self.in_flight > 0 {
            match rx.recv() {
                Ok(r) => {
                    out.push(r);
                    self.in_flight -= 1;
                }
                Err(_) => break,
            }
        }
        out
    }
}

impl Drop for ForecastEngine {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.job_tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANALYSIS;
    use crate::domain::SymbolInterval;

    fn engine() -> ForecastEngine {
        let mut config = ANALYSIS;
        config.forecast = config.forecast.with_time_steps(10).with_horizon(5);
        ForecastEngine::new(config)
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(SymbolInterval::daily(symbol), 0, closes).unwrap()
    }

    fn wave(n: usize, phase: f64) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.2 + phase).sin() * 3.0).collect()
    }

    #[test]
    fn test_empty_and_failing_symbols_do_not_stop_others() {
        let inputs: Vec<SymbolInput> = vec![
            ("AAA".to_string(), Ok(series("AAA", &wave(80, 0.0)))),
            ("EMPTY".to_string(), Ok(series("EMPTY", &[]))),
            (
                "DOWN".to_string(),
                Err(AnalysisError::SourceUnavailable {
                    symbol: "DOWN".to_string(),
                    reason: "timeout".to_string(),
                }),
            ),
            ("FLAT".to_string(), Ok(series("FLAT", &[7.0; 80]))),
            ("BBB".to_string(), Ok(series("BBB", &wave(80, 1.0)))),
        ];

        let report = engine().run_batch(inputs, None);

        assert!(report.bundles["AAA"].forecast.is_some());
        assert!(report.bundles["BBB"].forecast.is_some());
        assert!(report.bundles["FLAT"].forecast.is_none());
        assert!(!report.bundles.contains_key("EMPTY"));

        let empty = report.failure_for("EMPTY").unwrap();
        assert_eq!(empty.stage, FailureStage::Fetch);
        assert!(matches!(empty.error, AnalysisError::NoData { .. }));
        assert_eq!(report.skipped().count(), 2);
        assert_eq!(report.failure_for("FLAT").unwrap().stage, FailureStage::Forecast);
        assert!(report.failure_for("AAA").is_none());
    }

    #[test]
    fn test_batch_with_benchmark_builds_correlations() {
        let bench = series("^GSPC", &wave(80, 0.5));
        let inputs = vec![("AAA".to_string(), Ok(series("AAA", &wave(80, 0.0))))];
        let report = engine().run_batch(inputs, Some(&bench));
        assert_eq!(report.benchmark.as_ref().unwrap().symbol, "^GSPC");
        let corr = report.correlations.unwrap();
        assert_eq!(corr.symbols, vec!["AAA", "^GSPC"]);
    }

    #[test]
    fn test_worker_starts_on_first_dispatch() {
        let mut engine = engine();
        assert!(engine.worker.is_none());
        assert!(engine.poll_results().is_empty());
        assert!(engine.wait_all().is_empty());

        let inputs = vec![("AAA".to_string(), Ok(series("AAA", &wave(80, 0.0))))];
        engine.run_batch(inputs, None);
        assert!(engine.worker.is_none());

        engine.dispatch_job("A".to_string(), series("A", &wave(50, 0.0))).unwrap();
        assert!(engine.worker.is_some());
        assert_eq!(engine.wait_all().len(), 1);
    }

    #[test]
    fn test_background_dispatch() {
        let mut engine = engine();
        engine.dispatch_job("A".to_string(), series("A", &wave(50, 0.0))).unwrap();
        engine.dispatch_job("B".to_string(), series("B", &wave(50, 2.0))).unwrap();
        let results = engine.wait_all();
        assert_eq!(results.len(), 2);
        assert_eq!(engine.get_queue_len(), 0);
        assert!(engine.poll_results().is_empty());
    }
}
