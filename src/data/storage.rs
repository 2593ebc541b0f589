use {
    crate::{config::DF, data::provider::PriceSource, domain::Candle},
    anyhow::{Context, Result},
    async_trait::async_trait,
    sqlx::{
        ConnectOptions, Pool, QueryBuilder, Row, Sqlite,
        sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    },
    std::{str::FromStr, time::Duration},
};

#[async_trait]
pub trait PriceStorage: Send + Sync {
    async fn initialize(&self) -> Result<()>;
    async fn get_last_candle_time(&self, symbol: &str, interval_ms: i64) -> Result<Option<i64>>;
    async fn insert_candles(&self, symbol: &str, interval_ms: i64, candles: &[Candle]) -> Result<u64>;
    async fn load_candles(
        &self,
        symbol: &str,
        interval_ms: i64,
        start_time: Option<i64>,
    ) -> Result<Vec<Candle>>;
    async fn list_symbols(&self, interval_ms: i64) -> Result<Vec<String>>;
}

pub struct SqliteStorage {
    pool: Pool<Sqlite>,
}

impl SqliteStorage {
    pub async fn new(db_path: &str) -> Result<Self> {
        let connection_options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))
            .with_context(|| format!("Invalid database path: {}", db_path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(60))
            .synchronous(SqliteSynchronous::Normal)
            .log_slow_statements(log::LevelFilter::Warn, Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .with_context(|| format!("Failed to open price store: {}", db_path))?;

        Ok(Self { pool })
    }

    /// Opens the store and creates the schema if needed.
    pub async fn open(db_path: &str) -> Result<Self> {
        let storage = Self::new(db_path).await?;
        storage.initialize().await?;
        Ok(storage)
    }
}

#[async_trait]
impl PriceStorage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                interval_ms INTEGER NOT NULL,
                open_time INTEGER NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (symbol, interval_ms, open_time)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_last_candle_time(&self, symbol: &str, interval_ms: i64) -> Result<Option<i64>> {
        let result = sqlx::query(
            r#"
            SELECT MAX(open_time) as last_time
            FROM prices
            WHERE symbol = ? AND interval_ms = ?
            "#,
        )
        .bind(symbol)
        .bind(interval_ms)
        .fetch_one(&self.pool)
        .await?;

        let last_time: Option<i64> = result.try_get("last_time")?;
        Ok(last_time)
    }

    /// Batches candles in chunks of 3000 to stay within SQLite's 32k parameter limit.
    async fn insert_candles(&self, symbol: &str, interval_ms: i64, candles: &[Candle]) -> Result<u64> {
        if candles.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0u64;
        for chunk in candles.chunks(3000) {
            let mut query_builder = QueryBuilder::new(
                "INSERT OR IGNORE INTO prices (symbol, interval_ms, open_time, open, high, low, close, volume) ",
            );

            query_builder.push_values(chunk, |mut b, c| {
                b.push_bind(symbol)
                    .push_bind(interval_ms)
                    .push_bind(c.timestamp_ms)
                    .push_bind(c.open_price)
                    .push_bind(c.high_price)
                    .push_bind(c.low_price)
                    .push_bind(c.close_price)
                    .push_bind(c.volume);
            });

            inserted += query_builder
                .build()
                .execute(&self.pool)
                .await?
                .rows_affected();
        }

        Ok(inserted)
    }

    async fn load_candles(
        &self,
        symbol: &str,
        interval_ms: i64,
        start_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let query_str = if start_time.is_some() {
            r#"
            SELECT open_time, open, high, low, close, volume
            FROM prices
            WHERE symbol = ? AND interval_ms = ? AND open_time >= ?
            ORDER BY open_time ASC
            "#
        } else {
            r#"
            SELECT open_time, open, high, low, close, volume
            FROM prices
            WHERE symbol = ? AND interval_ms = ?
            ORDER BY open_time ASC
            "#
        };

        let mut query = sqlx::query(query_str).bind(symbol).bind(interval_ms);

        if let Some(ts) = start_time {
            query = query.bind(ts);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let candles = rows
            .iter()
            .map(|row| {
                Candle::new(
                    row.get("open_time"),
                    row.get("open"),
                    row.get("high"),
                    row.get("low"),
                    row.get("close"),
                    row.get("volume"),
                )
            })
            .collect();

        Ok(candles)
    }

    async fn list_symbols(&self, interval_ms: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT symbol
            FROM prices
            WHERE interval_ms = ?
            ORDER BY symbol ASC
            "#,
        )
        .bind(interval_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("symbol")).collect())
    }
}

#[async_trait]
impl PriceSource for SqliteStorage {
    fn signature(&self) -> &'static str {
        "SQLite Store"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval_ms: i64,
        start_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let candles = self.load_candles(symbol, interval_ms, start_time).await?;
        if DF.log_source {
            log::info!("Store: {} candles for {}", candles.len(), symbol);
        }
        Ok(candles)
    }
}
