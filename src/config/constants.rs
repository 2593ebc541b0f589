// Top Level Constants

/// Benchmark index fetched alongside the symbols for comparative statistics.
pub const BENCHMARK_SYMBOL: &str = "^GSPC";

/// Symbols analysed when none are given on the command line.
pub const DEFAULT_SYMBOLS: &[&str] = &["AAPL", "MSFT", "AMZN", "GOOGL", "META"];

/// Trading days per year, used to annualise daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub mod indicators {
    pub const SMA_SHORT: usize = 20;
    pub const SMA_MEDIUM: usize = 50;
    pub const SMA_LONG: usize = 200;
    pub const EMA_FAST: usize = 12;
    pub const EMA_SLOW: usize = 26;
    pub const MACD_SIGNAL: usize = 9;
    pub const RSI_PERIOD: usize = 14;
    pub const BAND_PERIOD: usize = 20;
    pub const BAND_WIDTH_K: f64 = 2.0;
    pub const MOMENTUM_LAG: usize = 10;

    /// Oscillator value reported when the average loss over the window is zero.
    pub const RSI_CEILING: f64 = 100.0;
}

pub mod forecast {
    pub const TIME_STEPS: usize = 60;
    pub const TRAIN_FRACTION: f64 = 0.8;
    /// Smallest accepted train fraction; below it nearly every window is held out.
    pub const MIN_TRAIN_FRACTION: f64 = 0.05;
    pub const HORIZON_STEPS: usize = 30;
    pub const SEED: u64 = 42;
}

pub mod ridge {
    pub const LAMBDA: f64 = 1e-6;
}

pub mod lstm {
    pub const HIDDEN_SIZE: usize = 32;
    pub const EPOCHS: usize = 200;
    pub const BATCH_SIZE: usize = 32;
    pub const LEARNING_RATE: f64 = 0.01;

    // Adam
    pub const BETA1: f64 = 0.9;
    pub const BETA2: f64 = 0.999;
    pub const EPSILON: f64 = 1e-8;
}

pub mod signal {
    /// Forecast must beat the last close by this fraction to flag a Buy (or miss it for a Sell).
    pub const THRESHOLD_PCT: f64 = 0.05;
}

pub mod performance {
    /// Look-back for the short-term return column.
    pub const ONE_MONTH_DAYS: i64 = 30;
}
