mod csv_import;
mod pre_main_async;
mod provider;
mod snapshot;
mod storage;

pub use {
    csv_import::{load_price_csv, parse_timestamp, read_price_csv},
    pre_main_async::{fetch_series, fetch_symbol_series},
    provider::{InMemoryPriceSource, PriceSource},
    snapshot::{ModelSnapshot, load_snapshot, save_snapshot, save_snapshot_async},
    storage::{PriceStorage, SqliteStorage},
};
