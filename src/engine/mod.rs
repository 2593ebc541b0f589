mod core;
mod forecaster;
mod messages;
pub mod metrics;
mod state;
mod worker;

pub use core::{AnalysisReport, ForecastEngine, SymbolInput};
pub use forecaster::{Forecaster, RolloutWindow, TrainedForecaster};
pub use messages::{JobRequest, JobResult};
pub use state::{FailureStage, SymbolBundle, SymbolFailure};
pub use worker::{process_request_sync, run_job, spawn_worker_thread};
