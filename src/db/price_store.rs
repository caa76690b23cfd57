use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::errors::Result;

/// One persisted price observation. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub symbol: String,
    pub price: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Append-only price history keyed by coin id, backed by SQLite.
///
/// All queries are short and run under one connection lock; the monitor is
/// the only writer, so there is no per-symbol write contention.
pub struct PriceStore {
    conn: Mutex<Connection>,
}

impl PriceStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        info!("Connected to price history database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        info!("Connected to in-memory price history database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                price REAL NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_price_history_symbol_ts
                ON price_history(symbol, timestamp);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("price store lock poisoned")
    }

    pub fn insert(&self, symbol: &str, price: f64, timestamp: i64) -> Result<()> {
        self.conn().execute(
            "INSERT INTO price_history (symbol, price, timestamp) VALUES (?1, ?2, ?3)",
            params![symbol, price, timestamp],
        )?;
        Ok(())
    }

    /// Most recent sample for a coin.
    pub fn latest(&self, symbol: &str) -> Result<Option<PriceSample>> {
        let sample = self
            .conn()
            .query_row(
                "SELECT symbol, price, timestamp FROM price_history
                 WHERE symbol = ?1 ORDER BY timestamp DESC LIMIT 1",
                params![symbol],
                Self::row_to_sample,
            )
            .optional()?;
        Ok(sample)
    }

    /// Most recent sample at or before `timestamp`. Used for the
    /// "price one hour ago" lookup.
    pub fn latest_at_or_before(&self, symbol: &str, timestamp: i64) -> Result<Option<PriceSample>> {
        let sample = self
            .conn()
            .query_row(
                "SELECT symbol, price, timestamp FROM price_history
                 WHERE symbol = ?1 AND timestamp <= ?2
                 ORDER BY timestamp DESC LIMIT 1",
                params![symbol, timestamp],
                Self::row_to_sample,
            )
            .optional()?;
        Ok(sample)
    }

    /// All samples strictly newer than `timestamp`, oldest first.
    pub fn range_since(&self, symbol: &str, timestamp: i64) -> Result<Vec<PriceSample>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT symbol, price, timestamp FROM price_history
             WHERE symbol = ?1 AND timestamp > ?2
             ORDER BY timestamp ASC",
        )?;
        let samples = stmt
            .query_map(params![symbol, timestamp], Self::row_to_sample)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    /// Delete samples strictly older than `cutoff`. A sample at exactly the
    /// cutoff is retained.
    pub fn delete_older_than(&self, cutoff: i64) -> Result<usize> {
        let deleted = self.conn().execute(
            "DELETE FROM price_history WHERE timestamp < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    fn row_to_sample(row: &rusqlite::Row<'_>) -> rusqlite::Result<PriceSample> {
        Ok(PriceSample {
            symbol: row.get(0)?,
            price: row.get(1)?,
            timestamp: row.get(2)?,
        })
    }
}
