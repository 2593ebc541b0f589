use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Instant;

use super::forecaster::Forecaster;
use super::messages::{JobRequest, JobResult};
use super::state::{FailureStage, SymbolBundle, SymbolFailure};

use crate::analysis::{Recommendation, compute_indicators, summarise};
use crate::config::DF;
use crate::models::Regressor;

/// Spawns a background thread that processes jobs until the request channel closes
pub fn spawn_worker_thread(rx: Receiver<JobRequest>, tx: Sender<JobResult>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(req) = rx.recv() {
            process_request_sync(req, tx.clone());
        }
    })
}

pub fn process_request_sync(req: JobRequest, tx: Sender<JobResult>) {
    let response = run_job(req);
    if tx.send(response).is_err() {
        log::warn!("Worker: result receiver dropped");
    }
}

/// Indicators, performance and forecast for one symbol. Forecast errors are recorded, not raised.
pub fn run_job(req: JobRequest) -> JobResult {
    let label = format!("Total JOB [{}] ({} candles)", req.symbol, req.series.len());

    crate::trace_time!(&label, 500_000, {
        let start = Instant::now();
        let series = req.series.as_ref();

        // 1. Indicators (infallible)
        let indicators = crate::trace_time!(&format!("1. Indicators [{}]", req.symbol), 5_000, {
            compute_indicators(series, &req.config.indicators)
        });

        // 2. Performance
        let performance = summarise(series);

        // 3. Forecast
        let regressor = Regressor::build(
            &req.config.regressor,
            req.config.forecast.time_steps,
            req.config.forecast.seed,
        );
        let forecast = Forecaster::new(regressor, req.config.forecast)
            .and_then(|f| f.train(series))
            .and_then(|trained| trained.finish());

        let (forecast, model, failure) = match forecast {
            Ok((result, model)) => (Some(result), Some(model), None),
            Err(e) => {
                log::warn!("Forecast failed for {}: {}", req.symbol, e);
                (
                    None,
                    None,
                    Some(SymbolFailure::new(&req.symbol, FailureStage::Forecast, e)),
                )
            }
        };

        let recommendation = match (series.last_close(), forecast.as_ref()) {
            (Some(last), Some(f)) => f
                .final_prediction()
                .map(|p| Recommendation::from_forecast(last, p)),
            _ => None,
        };

        let duration_ms = start.elapsed().as_millis();
        if DF.log_engine {
            log::info!(
                "Worker: {} done in {}ms (forecast: {})",
                req.symbol,
                duration_ms,
                if failure.is_none() { "ok" } else { "skipped" }
            );
        }

        JobResult {
            symbol: req.symbol.clone(),
            duration_ms,
            bundle: SymbolBundle {
                symbol: req.symbol.clone(),
                candle_count: series.len(),
                indicators,
                performance,
                forecast,
                model,
                recommendation,
                duration_ms,
            },
            failure,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANALYSIS;
    use crate::domain::{AnalysisError, SymbolInterval};
    use crate::models::PriceSeries;
    use std::sync::Arc;
    use std::sync::mpsc::channel;

    fn request(symbol: &str, closes: &[f64]) -> JobRequest {
        let mut config = ANALYSIS;
        config.forecast = config.forecast.with_time_steps(10).with_horizon(5);
        JobRequest {
            symbol: symbol.to_string(),
            series: Arc::new(
                PriceSeries::from_closes(SymbolInterval::daily(symbol), 0, closes).unwrap(),
            ),
            config,
        }
    }

    #[test]
    fn test_run_job_produces_bundle() {
        let closes: Vec<f64> = (0..90).map(|i| 20.0 + i as f64 * 0.1).collect();
        let res = run_job(request("UP", &closes));
        assert!(res.failure.is_none());
        let bundle = res.bundle;
        assert_eq!(bundle.candle_count, 90);
        assert_eq!(bundle.forecast.as_ref().unwrap().future.len(), 5);
        assert!(bundle.model.is_some());
        assert!(bundle.recommendation.is_some());
        assert!(bundle.performance.is_some());
    }

    #[test]
    fn test_forecast_failure_keeps_indicators() {
        let res = run_job(request("FLAT", &[5.0; 40]));
        let failure = res.failure.unwrap();
        assert_eq!(failure.stage, FailureStage::Forecast);
        assert!(matches!(failure.error, AnalysisError::DegenerateRange { .. }));
        assert_eq!(res.bundle.indicators.len(), 40);
        assert!(res.bundle.forecast.is_none());
        assert!(res.bundle.recommendation.is_none());
    }

    #[test]
    fn test_worker_thread_round_trip() {
        let (job_tx, job_rx) = channel();
        let (result_tx, result_rx) = channel();
        let handle = spawn_worker_thread(job_rx, result_tx);

        let closes: Vec<f64> = (0..60).map(|i| 10.0 + (i as f64 * 0.4).sin()).collect();
        job_tx.send(request("A", &closes)).unwrap();
        job_tx.send(request("B", &closes)).unwrap();
        drop(job_tx);

        let names: Vec<String> = result_rx.iter().map(|r| r.symbol).collect();
        assert_eq!(names, vec!["A", "B"]);
        handle.join().unwrap();
    }
}
