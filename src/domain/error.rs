use thiserror::Error;

/// Per-symbol failures of the indicator / forecast pipeline.
///
/// Every variant is scoped to a single symbol: the engine records it against
/// that symbol and keeps going with the rest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("no data returned for {symbol}")]
    NoData { symbol: String },

    #[error("degenerate price range: every value equals {value}")]
    DegenerateRange { value: f64 },

    #[error("insufficient data: need at least {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("training failed: {0}")]
    TrainingFailure(String),

    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    #[error("window has {actual} values, model expects {expected}")]
    InvalidWindow { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("price source unavailable for {symbol}: {reason}")]
    SourceUnavailable { symbol: String, reason: String },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl AnalysisError {
    /// Short machine-friendly label, used in logs and the failure table.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoData { .. } => "no_data",
            Self::DegenerateRange { .. } => "degenerate_range",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::TrainingFailure(_) => "training_failure",
            Self::InvalidSeries(_) => "invalid_series",
            Self::InvalidWindow { .. } => "invalid_window",
            Self::InvalidConfig(_) => "invalid_config",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::Persistence(_) => "persistence",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_symbol() {
        let err = AnalysisError::NoData {
            symbol: "AAPL".to_string(),
        };
        assert_eq!(err.to_string(), "no data returned for AAPL");
        assert_eq!(err.kind(), "no_data");

        let err = AnalysisError::InsufficientData {
            required: 61,
            available: 50,
        };
        assert!(err.to_string().contains("61"));
        assert!(err.to_string().contains("50"));
    }
}
