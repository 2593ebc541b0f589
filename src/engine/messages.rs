use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::models::PriceSeries;

use super::state::{SymbolBundle, SymbolFailure};

/// A request to run the pipeline for one symbol
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub symbol: String,
    pub series: Arc<PriceSeries>,
    pub config: AnalysisConfig,
}

/// The result returned by the worker
#[derive(Debug, Clone)]
pub struct JobResult {
    pub symbol: String,
    pub duration_ms: u128,

    /// Always present: indicators never fail for a well-formed series
    pub bundle: SymbolBundle,

    /// Set when the forecast stage failed
    pub failure: Option<SymbolFailure>,
}
