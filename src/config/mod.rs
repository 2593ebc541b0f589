//! Configuration module for the forecast pipeline.

mod analysis;
mod debug;
mod persistence;

// Public
pub mod constants;

// Re-export commonly used items
pub use analysis::{
    ANALYSIS, AnalysisConfig, ForecastConfig, IndicatorConfig, LstmSettings, RegressorConfig,
    RegressorKind,
};
pub use debug::DF;
pub use persistence::{PERSISTENCE, model_snapshot_filename};
