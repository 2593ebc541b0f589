//! File persistence and serialization configuration
use crate::config::RegressorKind;

/// Local price store (SQLite)
pub struct PriceStoreConfig {
    pub db_path: &'static str,
}

/// Trained model snapshots (bincode)
pub struct ModelCacheConfig {
    /// Directory for snapshot files
    pub directory: &'static str,
    /// Base filename for snapshot files (without extension)
    pub filename_base: &'static str,
    /// Current version of the snapshot serialization format
    pub version: f64,
}

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    pub prices: PriceStoreConfig,
    pub models: ModelCacheConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    prices: PriceStoreConfig {
        db_path: "prices.sqlite",
    },
    models: ModelCacheConfig {
        directory: "model_cache",
        filename_base: "model",
        version: 1.0,
    },
};

/// Snapshot filename for a symbol and regressor.
/// Example: "model_AAPL_autoregressive_v1.bin"
pub fn model_snapshot_filename(symbol: &str, kind: RegressorKind) -> String {
    let safe_symbol: String = symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    format!(
        "{}_{}_{}_v{}.bin",
        PERSISTENCE.models.filename_base, safe_symbol, kind, PERSISTENCE.models.version
    )
}
