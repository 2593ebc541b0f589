use std::panic;

use anyhow::Result;
use clap::Parser;
use ticker_forecast::{Cli, report, run};

fn init_log() {
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Error)
    };

    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, global_level)
        .filter(Some("ticker_forecast"), my_code_level)
        // RUST_LOG still wins when set
        .parse_env("RUST_LOG")
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    init_log();

    let args = Cli::parse();
    let report = run(args).await?;

    println!("{}", report::render(&report));

    if report.bundles.is_empty() {
        log::warn!("No symbol produced results");
    }
    Ok(())
}
