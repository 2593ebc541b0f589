use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use ticker_forecast::PERSISTENCE;
use ticker_forecast::data::{PriceStorage, SqliteStorage, load_price_csv};
use ticker_forecast::utils::TimeUtils;

/// Load `date,open,high,low,close[,volume]` CSV files into the local price store.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite price store
    #[arg(long, default_value = PERSISTENCE.prices.db_path)]
    db: String,

    /// Bar interval of the files (1m, 1h, 1d, ...)
    #[arg(long, default_value = "1d")]
    interval: String,

    /// Symbol to store under. Defaults to each file's stem.
    #[arg(long)]
    symbol: Option<String>,

    /// CSV files to import
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(interval_ms) = TimeUtils::interval_from_str(&args.interval) else {
        bail!("Unknown interval: {}", args.interval);
    };
    if args.symbol.is_some() && args.files.len() > 1 {
        bail!("--symbol can only be used with a single file");
    }

    // 2. Connect to DB
    let storage = SqliteStorage::open(&args.db)
        .await
        .with_context(|| format!("Failed to open price store: {}", args.db))?;
    log::info!("Importing {} file(s) into {} at {}", args.files.len(), args.db, args.interval);

    // 3. Parse and insert
    let mut total = 0u64;
    for path in &args.files {
        let symbol = match &args.symbol {
            Some(s) => s.trim().to_uppercase(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_uppercase())
                .with_context(|| format!("Cannot derive a symbol from {:?}", path))?,
        };

        let candles = load_price_csv(path)?;
        if candles.is_empty() {
            log::warn!("No rows in {:?}. Skipping.", path);
            continue;
        }

        let inserted = storage.insert_candles(&symbol, interval_ms, &candles).await?;
        total += inserted;
        log::info!(
            "{}: {} rows read, {} new (last bar {:?})",
            symbol,
            candles.len(),
            inserted,
            storage.get_last_candle_time(&symbol, interval_ms).await?
        );
    }

    log::info!(
        "Done: {} new rows. Symbols in store: {:?}",
        total,
        storage.list_symbols(interval_ms).await?
    );
    Ok(())
}
