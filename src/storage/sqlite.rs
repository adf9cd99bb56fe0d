//! SQLite storage backend for price observations

use super::traits::{ItemRanking, ObservationFilter, OpenStore, PriceStore, StorageError, StorageResult};
use crate::observation::PriceObservation;
use crate::sources::ListingRecord;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Format SQLite's `CURRENT_TIMESTAMP` default produces
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Widening applied to time bounds before they reach SQL
const TIME_FILTER_SLACK_SECS: i64 = 1;

/// SQLite-backed price store
///
/// Observations live in a flat, append-only `item_price_tracking` table
/// in the same database file as the receipt data, so the ranking query can
/// read `receipt_items` directly. Thread-safe via internal mutex on the
/// connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // Older databases name the timestamp column `timestamp`
        Self::migrate_rename_timestamp(conn)?;

        conn.execute_batch(
            r#"
            -- One row per listing seen during a scrape. No key: repeated
            -- observations are the time series.
            CREATE TABLE IF NOT EXISTS item_price_tracking (
                observed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                source TEXT,
                item_name TEXT,
                price TEXT,
                searched_item TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_price_tracking_item_source
                ON item_price_tracking(searched_item, source);

            -- Dashboard reads must not block on an in-flight batch
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    /// Migration: rename `timestamp` to `observed_at` in pre-existing tables
    ///
    /// SQLite has no conditional rename, so the column list is checked
    /// through the table_info pragma first.
    fn migrate_rename_timestamp(conn: &Connection) -> StorageResult<()> {
        let has_legacy_column: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('item_price_tracking') WHERE name = 'timestamp'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if has_legacy_column {
            conn.execute(
                "ALTER TABLE item_price_tracking RENAME COLUMN timestamp TO observed_at",
                [],
            )?;
        }

        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// RFC 3339 UTC, full sub-second precision
    fn format_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Parse a stored timestamp: RFC 3339 as written by this crate, or the
    /// `CURRENT_TIMESTAMP` format (UTC) for rows written by other tools.
    fn parse_observed_at(raw: &str) -> StorageResult<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|e| StorageError::DateParse(format!("{raw:?}: {e}")))
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PriceStore for SqliteStore {
    fn append(&self, records: &[ListingRecord], searched_item: &str) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let observed_at = Self::format_timestamp(Utc::now());
        let mut conn = self.conn()?;

        // Dropping an uncommitted transaction rolls it back, so an error
        // anywhere below leaves earlier batches untouched and this one absent.
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO item_price_tracking (observed_at, source, item_name, price, searched_item)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                stmt.execute(params![
                    observed_at,
                    record.source.label(),
                    record.name,
                    record.price,
                    searched_item,
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    fn observations(&self, filter: &ObservationFilter) -> StorageResult<Vec<PriceObservation>> {
        let conn = self.conn()?;

        let mut sql = String::from(
            "SELECT observed_at, source, item_name, price, searched_item FROM item_price_tracking WHERE 1 = 1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref item) = filter.searched_item {
            sql.push_str(" AND searched_item = ?");
            params_vec.push(Box::new(item.clone()));
        }

        if let Some(ref source) = filter.source {
            sql.push_str(" AND source = ?");
            params_vec.push(Box::new(source.clone()));
        }

        // julianday() reads both stored formats but only to the millisecond,
        // so SQL narrows with some slack and `covers` decides exactly below.
        if let Some(since) = filter.since {
            sql.push_str(" AND julianday(observed_at) >= julianday(?)");
            params_vec.push(Box::new(Self::format_timestamp(since - chrono::Duration::seconds(TIME_FILTER_SLACK_SECS))));
        }

        if let Some(until) = filter.until {
            sql.push_str(" AND julianday(observed_at) <= julianday(?)");
            params_vec.push(Box::new(Self::format_timestamp(until + chrono::Duration::seconds(TIME_FILTER_SLACK_SECS))));
        }

        // Newest first so a limit keeps the most recent rows
        sql.push_str(" ORDER BY julianday(observed_at) DESC, rowid DESC");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut observations = Vec::new();
        for row in rows {
            if filter.limit.is_some_and(|limit| observations.len() >= limit) {
                break;
            }

            let (observed_at, source, item_name, price, searched_item) = row?;
            let observed_at = match observed_at.as_deref().map(Self::parse_observed_at) {
                Some(Ok(at)) => at,
                Some(Err(e)) => {
                    warn!(error = %e, "skipping observation with unreadable timestamp");
                    continue;
                }
                None => {
                    warn!("skipping observation without timestamp");
                    continue;
                }
            };
            if !filter.covers(&observed_at) {
                continue;
            }
            observations.push(PriceObservation {
                observed_at,
                source: source.unwrap_or_default(),
                item_name: item_name.unwrap_or_default(),
                price: price.unwrap_or_default(),
                searched_item: searched_item.unwrap_or_default(),
            });
        }

        // Back to oldest first. Stable, so rows sharing a timestamp keep
        // insertion order.
        observations.reverse();
        observations.sort_by_key(|o| o.observed_at);

        Ok(observations)
    }

    fn observation_count(&self) -> StorageResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM item_price_tracking", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl ItemRanking for SqliteStore {
    fn top_items(&self, n: usize) -> StorageResult<Vec<String>> {
        let conn = self.conn()?;

        // receipt_items belongs to the receipt subsystem and may not exist yet
        let has_receipts: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'receipt_items'",
            [],
            |row| row.get(0),
        )?;
        if !has_receipts {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT description, COUNT(*) AS purchases
            FROM receipt_items
            WHERE description IS NOT NULL AND TRIM(description) != ''
            GROUP BY description
            ORDER BY purchases DESC, description ASC
            LIMIT ?1
            "#,
        )?;
        let items = stmt
            .query_map(params![n as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}
