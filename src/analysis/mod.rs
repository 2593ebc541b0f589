// Indicator transforms and summary statistics
pub mod performance;
pub mod returns;
pub mod signal;
pub mod window_stats;

pub use performance::{CorrelationMatrix, PerformanceSummary, correlation_matrix, summarise};
pub use signal::Recommendation;
pub use window_stats::compute_indicators;
