//! SQLite database store implementation.

use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::models::*;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;

        Ok(())
    }

    // --- Samples ---

    /// Persist a sample, coalescing duplicates in the same interval bucket.
    ///
    /// The natural key is (kind, bucket) where bucket is the sample's
    /// timestamp aligned down to the probe interval. Two concurrent probes
    /// landing in the same bucket converge to a single row carrying the
    /// later values.
    pub fn record(&self, sample: &Sample, interval_seconds: i64) -> Result<(), DbError> {
        let width = interval_seconds.max(1);
        let bucket = sample.timestamp - sample.timestamp.rem_euclid(width);

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO samples (kind, bucket, timestamp, status, latency_ms, http_code, message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(kind, bucket) DO UPDATE SET
             timestamp=excluded.timestamp, status=excluded.status,
             latency_ms=excluded.latency_ms, http_code=excluded.http_code,
             message=excluded.message",
            params![
                sample.kind.as_str(),
                bucket,
                sample.timestamp,
                sample.status as i64,
                sample.latency_ms,
                sample.http_code,
                sample.message,
            ],
        )?;
        Ok(())
    }

    /// Get the most recent sample for a component kind.
    pub fn latest(&self, kind: ComponentKind) -> Result<Option<Sample>, DbError> {
        let conn = self.conn.lock().unwrap();
        let sample = conn
            .query_row(
                "SELECT kind, timestamp, status, latency_ms, http_code, message
                 FROM samples WHERE kind = ?1
                 ORDER BY timestamp DESC, id DESC LIMIT 1",
                params![kind.as_str()],
                sample_from_row,
            )
            .optional()?;
        Ok(sample)
    }

    /// Get all samples with timestamp in [start, end), ascending.
    pub fn samples_in_range(&self, start: i64, end: i64) -> Result<Vec<Sample>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT kind, timestamp, status, latency_ms, http_code, message
             FROM samples WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp ASC, id ASC",
        )?;

        let samples = stmt
            .query_map(params![start, end], sample_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(samples)
    }

    /// Delete samples older than the cutoff. Returns the number removed.
    pub fn delete_samples_before(&self, cutoff: i64) -> Result<usize, DbError> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM samples WHERE timestamp < ?1", params![cutoff])?;
        Ok(n)
    }

    // --- Hourly rollups ---

    /// Insert or update the rollup for its hour.
    pub fn upsert_rollup(&self, rollup: &HourlyRollup) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO hourly_rollups (hour_start, samples_expected, samples_ok, uptime_pct)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(hour_start) DO UPDATE SET
             samples_expected=excluded.samples_expected,
             samples_ok=excluded.samples_ok, uptime_pct=excluded.uptime_pct",
            params![
                rollup.hour_start,
                rollup.samples_expected,
                rollup.samples_ok,
                rollup.uptime_pct,
            ],
        )?;
        Ok(())
    }

    /// Get the rollup for an hour, if one exists.
    pub fn rollup_for_hour(&self, hour_start: i64) -> Result<Option<HourlyRollup>, DbError> {
        let conn = self.conn.lock().unwrap();
        let rollup = conn
            .query_row(
                "SELECT hour_start, samples_expected, samples_ok, uptime_pct
                 FROM hourly_rollups WHERE hour_start = ?1",
                params![hour_start],
                rollup_from_row,
            )
            .optional()?;
        Ok(rollup)
    }

    /// Get rollups with hour_start in [start, end), ascending.
    pub fn rollups_in_range(&self, start: i64, end: i64) -> Result<Vec<HourlyRollup>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT hour_start, samples_expected, samples_ok, uptime_pct
             FROM hourly_rollups WHERE hour_start >= ?1 AND hour_start < ?2
             ORDER BY hour_start ASC",
        )?;

        let rollups = stmt
            .query_map(params![start, end], rollup_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(rollups)
    }

    /// Delete rollups older than the cutoff. Returns the number removed.
    pub fn delete_rollups_before(&self, cutoff: i64) -> Result<usize, DbError> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM hourly_rollups WHERE hour_start < ?1",
            params![cutoff],
        )?;
        Ok(n)
    }

    /// Round-trip check used by the health endpoint and the db probe.
    pub fn ping(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    }
}

fn sample_from_row(row: &Row<'_>) -> SqlResult<Sample> {
    let kind: String = row.get(0)?;
    let kind = kind.parse::<ComponentKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Sample {
        kind,
        timestamp: row.get(1)?,
        status: row.get::<_, i64>(2)? != 0,
        latency_ms: row.get(3)?,
        http_code: row.get(4)?,
        message: row.get(5)?,
    })
}

fn rollup_from_row(row: &Row<'_>) -> SqlResult<HourlyRollup> {
    Ok(HourlyRollup {
        hour_start: row.get(0)?,
        samples_expected: row.get(1)?,
        samples_ok: row.get(2)?,
        uptime_pct: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample(kind: ComponentKind, ts: i64, status: bool) -> Sample {
        Sample {
            kind,
            timestamp: ts,
            status,
            latency_ms: 42,
            http_code: if status { 200 } else { 0 },
            message: if status { "HTTP OK" } else { "HTTP error: 0" }.to_string(),
        }
    }

    #[test]
    fn test_record_and_latest() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        store.record(&sample(ComponentKind::Http, 1000, true), 300).unwrap();
        store.record(&sample(ComponentKind::Http, 1400, false), 300).unwrap();

        let latest = store.latest(ComponentKind::Http).unwrap().unwrap();
        assert_eq!(latest.timestamp, 1400);
        assert!(!latest.status);

        assert!(store.latest(ComponentKind::Db).unwrap().is_none());
    }

    #[test]
    fn test_record_coalesces_same_bucket() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        // Two probes landing in the same 300s bucket keep one row with the
        // later values.
        store.record(&sample(ComponentKind::Http, 1205, false), 300).unwrap();
        store.record(&sample(ComponentKind::Http, 1299, true), 300).unwrap();

        let all = store.samples_in_range(0, 10_000).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].timestamp, 1299);
        assert!(all[0].status);
    }

    #[test]
    fn test_samples_in_range_bounds() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        for ts in [900, 1000, 1500, 2000] {
            store.record(&sample(ComponentKind::Http, ts, true), 60).unwrap();
        }

        // Half-open [start, end): 2000 is excluded, 1000 included.
        let in_range = store.samples_in_range(1000, 2000).unwrap();
        let times: Vec<i64> = in_range.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![1000, 1500]);
    }

    #[test]
    fn test_delete_samples_before() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        store.record(&sample(ComponentKind::Http, 1000, true), 60).unwrap();
        store.record(&sample(ComponentKind::Http, 5000, true), 60).unwrap();

        let removed = store.delete_samples_before(3600).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.samples_in_range(0, 10_000).unwrap().len(), 1);

        // Purge with no matching rows is still a success.
        assert_eq!(store.delete_samples_before(3600).unwrap(), 0);
    }

    #[test]
    fn test_rollup_upsert_and_lookup() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        let hour = 1_700_000_000 - (1_700_000_000 % 3600);
        store
            .upsert_rollup(&HourlyRollup {
                hour_start: hour,
                samples_expected: 12,
                samples_ok: 10,
                uptime_pct: 83.33,
            })
            .unwrap();

        // Re-upsert replaces in place.
        store
            .upsert_rollup(&HourlyRollup {
                hour_start: hour,
                samples_expected: 12,
                samples_ok: 12,
                uptime_pct: 100.0,
            })
            .unwrap();

        let fetched = store.rollup_for_hour(hour).unwrap().unwrap();
        assert_eq!(fetched.samples_ok, 12);
        assert_eq!(fetched.uptime_pct, 100.0);
        assert!(store.rollup_for_hour(hour + 3600).unwrap().is_none());
    }

    #[test]
    fn test_delete_rollups_before() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        for i in 0..3 {
            store
                .upsert_rollup(&HourlyRollup {
                    hour_start: i * 3600,
                    samples_expected: 12,
                    samples_ok: 12,
                    uptime_pct: 100.0,
                })
                .unwrap();
        }

        assert_eq!(store.delete_rollups_before(2 * 3600).unwrap(), 2);
        let left = store.rollups_in_range(0, 10 * 3600).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].hour_start, 2 * 3600);
    }

    #[test]
    fn test_ping() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        store.ping().unwrap();
    }
}
