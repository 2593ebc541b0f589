// Domain types and value objects
mod candle;
mod error;
mod symbol_interval;

pub use candle::Candle;
pub use error::{AnalysisError, Result};
pub use symbol_interval::SymbolInterval;
