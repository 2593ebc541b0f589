// Async loading that runs before the engine starts (so the engine only ever sees materialised series)

use futures::future::join_all;

use crate::config::DF;
use crate::data::provider::PriceSource;
use crate::domain::{AnalysisError, SymbolInterval};
use crate::engine::SymbolInput;
use crate::models::PriceSeries;

/// Fetches one symbol and validates it into a series.
///
/// Empty history becomes `NoData`, transport faults become `SourceUnavailable`.
pub async fn fetch_series(
    source: &dyn PriceSource,
    symbol: &str,
    interval_ms: i64,
    start_time: Option<i64>,
) -> Result<PriceSeries, AnalysisError> {
    let candles = source
        .fetch_candles(symbol, interval_ms, start_time)
        .await
        .map_err(|e| AnalysisError::SourceUnavailable {
            symbol: symbol.to_string(),
            reason: format!("{:#}", e),
        })?;

    if candles.is_empty() {
        return Err(AnalysisError::NoData {
            symbol: symbol.to_string(),
        });
    }

    PriceSeries::from_candles(SymbolInterval::new(symbol, interval_ms), candles)
}

/// Fetches every symbol concurrently. One failure never affects the others.
pub async fn fetch_symbol_series(
    source: &dyn PriceSource,
    symbols: &[String],
    interval_ms: i64,
    start_time: Option<i64>,
) -> Vec<SymbolInput> {
    if DF.log_source {
        log::info!(
            "Fetching {} symbols from {}...",
            symbols.len(),
            source.signature()
        );
    }

    let fetches = symbols
        .iter()
        .map(|symbol| fetch_series(source, symbol, interval_ms, start_time));
    let outcomes = join_all(fetches).await;

    symbols.iter().cloned().zip(outcomes).collect()
}
