//! Durable, transactional store for imported insight packets.
//!
//! One SQLite table keyed by the derived `insight:<date>:<type>` key, with a
//! secondary index on the payload date. Writes follow last-write-wins on the
//! envelope's `created_at`, compared as an opaque string.

use insight_contracts::{Envelope, StoredRecord};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DB_FILE: &str = "insights.sqlite";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
    #[error("stored record {key} is unreadable: {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl StoreError {
    fn unavailable(err: impl Display) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }

    fn aborted(err: impl Display) -> Self {
        StoreError::TransactionAborted(err.to_string())
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// SQLite `synchronous` level applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    #[default]
    Full,
    Normal,
}

impl Synchronous {
    fn pragma(self) -> &'static str {
        match self {
            Synchronous::Full => "FULL",
            Synchronous::Normal => "NORMAL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long a writer waits for a competing transaction before aborting.
    pub busy_timeout: Duration,
    pub synchronous: Synchronous,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            synchronous: Synchronous::Full,
        }
    }
}

/// Result of an upsert: the derived key, and whether the incoming record
/// replaced what was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub key: String,
    pub written: bool,
}

#[derive(Clone)]
pub struct Store {
    db_path: PathBuf,
    options: StoreOptions,
}

impl Store {
    /// Open (creating on first use) the store under `dir`. Idempotent.
    pub fn open(dir: &Path, options: StoreOptions) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(StoreError::unavailable)?;
        let db_path = dir.join(DB_FILE);
        let store = Self { db_path, options };
        let conn = store.conn()?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(StoreError::unavailable)?;
        Self::init_schema(&conn)?;
        debug!(target: "insight::store", path = %store.db_path.display(), "store opened");
        Ok(store)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS insights (
              key TEXT PRIMARY KEY,
              type TEXT NOT NULL,
              date TEXT,                 -- payload.date, NULL when absent
              created_at TEXT NOT NULL,
              record TEXT NOT NULL       -- JSON: {key, ...envelope}
            );
            CREATE INDEX IF NOT EXISTS idx_insights_date ON insights(date);
            "#,
        )
        .map_err(StoreError::unavailable)
    }

    fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).map_err(StoreError::unavailable)?;
        conn.busy_timeout(self.options.busy_timeout)
            .map_err(StoreError::unavailable)?;
        conn.pragma_update(None, "synchronous", self.options.synchronous.pragma())
            .map_err(StoreError::unavailable)?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Write `envelope` under its derived key unless the stored record has a
    /// strictly newer `created_at`. The read, compare and write run in one
    /// immediate transaction, so concurrent upserts on a key are linearised.
    pub fn upsert(&self, envelope: &Envelope) -> Result<UpsertOutcome> {
        let record = StoredRecord::new(envelope.clone());
        let body = serde_json::to_string(&record).map_err(StoreError::aborted)?;
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::aborted)?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT created_at FROM insights WHERE key=?1",
                params![record.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::aborted)?;
        let incoming = record.envelope.created_at.as_str();
        let written = existing.as_deref().map_or(true, |prev| prev <= incoming);
        if written {
            tx.execute(
                "INSERT INTO insights(key,type,date,created_at,record) VALUES(?1,?2,?3,?4,?5)
                 ON CONFLICT(key) DO UPDATE SET
                   type=excluded.type, date=excluded.date,
                   created_at=excluded.created_at, record=excluded.record",
                params![
                    record.key,
                    record.envelope.kind.as_str(),
                    record.envelope.payload_date(),
                    incoming,
                    body
                ],
            )
            .map_err(StoreError::aborted)?;
        }
        tx.commit().map_err(StoreError::aborted)?;
        debug!(
            target: "insight::store",
            key = %record.key,
            written,
            previous = existing.as_deref().unwrap_or(""),
            "upsert committed"
        );
        Ok(UpsertOutcome {
            key: record.key,
            written,
        })
    }

    /// Every stored record, in storage order.
    pub fn list_all(&self) -> Result<Vec<StoredRecord>> {
        self.read_records("SELECT key, record FROM insights", params![])
    }

    /// Records whose payload date lies in `[start, end]`, ascending by date.
    pub fn list_between(&self, start: &str, end: &str) -> Result<Vec<StoredRecord>> {
        self.read_records(
            "SELECT key, record FROM insights WHERE date >= ?1 AND date <= ?2 ORDER BY date, key",
            params![start, end],
        )
    }

    pub fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT record FROM insights WHERE key=?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::aborted)?;
        body.map(|b| decode_record(key, &b)).transpose()
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(1) FROM insights", [], |row| row.get(0))
            .map_err(StoreError::aborted)?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Empty the collection in one transaction; returns how many records went.
    pub fn clear_all(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::aborted)?;
        let removed = tx
            .execute("DELETE FROM insights", [])
            .map_err(StoreError::aborted)?;
        tx.commit().map_err(StoreError::aborted)?;
        info!(target: "insight::store", removed, "store cleared");
        Ok(removed)
    }

    fn read_records(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<StoredRecord>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(StoreError::aborted)?;
        let rows: Vec<(String, String)> = {
            let mut stmt = tx.prepare(sql).map_err(StoreError::aborted)?;
            let mapped = stmt
                .query_map(args, |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(StoreError::aborted)?;
            mapped
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::aborted)?
        };
        tx.commit().map_err(StoreError::aborted)?;
        rows.iter()
            .map(|(key, body)| decode_record(key, body))
            .collect()
    }

    // ---------------- Async wrappers (spawn_blocking) ----------------
    // These helpers keep rusqlite work off the async executor.

    pub async fn open_async(dir: PathBuf, options: StoreOptions) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::open(&dir, options))
            .await
            .map_err(|e| StoreError::StorageUnavailable(format!("join error: {e}")))?
    }

    pub async fn upsert_async(&self, envelope: &Envelope) -> Result<UpsertOutcome> {
        let store = self.clone();
        let envelope = envelope.clone();
        tokio::task::spawn_blocking(move || store.upsert(&envelope))
            .await
            .map_err(join_error)?
    }

    pub async fn list_all_async(&self) -> Result<Vec<StoredRecord>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.list_all())
            .await
            .map_err(join_error)?
    }

    pub async fn list_between_async(&self, start: &str, end: &str) -> Result<Vec<StoredRecord>> {
        let store = self.clone();
        let start = start.to_string();
        let end = end.to_string();
        tokio::task::spawn_blocking(move || store.list_between(&start, &end))
            .await
            .map_err(join_error)?
    }

    pub async fn clear_all_async(&self) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.clear_all())
            .await
            .map_err(join_error)?
    }
}

fn join_error(err: tokio::task::JoinError) -> StoreError {
    StoreError::TransactionAborted(format!("join error: {err}"))
}

fn decode_record(key: &str, body: &str) -> Result<StoredRecord> {
    serde_json::from_str(body).map_err(|e| StoreError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
