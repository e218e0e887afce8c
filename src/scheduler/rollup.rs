//! Rollup engine: aggregates raw samples into hourly uptime records.

use crate::config::Config;
use crate::db::{ComponentKind, DbError, HourlyRollup, Sample, Store};

use super::retention;

/// How many trailing hours each cycle re-processes. Rolling up is
/// idempotent, so re-visiting already-rolled hours covers invocations the
/// scheduler missed.
const CATCHUP_HOURS: i64 = 24;

/// Truncate a timestamp to the start of its containing hour.
pub fn hour_floor(ts: i64) -> i64 {
    ts - ts.rem_euclid(3600)
}

/// Round to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Aggregate one clock hour of samples into a rollup.
///
/// The hour [hour_start, hour_start+3600) is partitioned into
/// `max(1, 3600 / interval_seconds)` buckets. A bucket counts as OK only
/// if every monitored kind had at least one up sample in it; samples
/// outside the hour or its bucket range are ignored.
pub fn aggregate_hour(
    samples: &[Sample],
    hour_start: i64,
    interval_seconds: i64,
    monitored: &[ComponentKind],
) -> HourlyRollup {
    let width = interval_seconds.max(1);
    let expected = (3600 / width).max(1);

    let mut bucket_up = vec![vec![false; monitored.len()]; expected as usize];
    for sample in samples {
        if sample.timestamp < hour_start || sample.timestamp >= hour_start + 3600 {
            continue;
        }
        let index = (sample.timestamp - hour_start) / width;
        if index < 0 || index >= expected {
            continue;
        }
        if !sample.status {
            continue;
        }
        if let Some(pos) = monitored.iter().position(|k| *k == sample.kind) {
            bucket_up[index as usize][pos] = true;
        }
    }

    let samples_ok = if monitored.is_empty() {
        0
    } else {
        bucket_up.iter().filter(|ups| ups.iter().all(|up| *up)).count() as i64
    };

    let uptime_pct =
        round2(samples_ok as f64 / expected as f64 * 100.0).clamp(0.0, 100.0);

    HourlyRollup {
        hour_start,
        samples_expected: expected,
        samples_ok,
        uptime_pct,
    }
}

/// Roll up one fully-elapsed hour and upsert the result.
///
/// Idempotent: re-running for the same hour over the same samples writes
/// the same record.
pub fn rollup_hour(
    store: &Store,
    hour_start: i64,
    interval_seconds: i64,
    monitored: &[ComponentKind],
) -> Result<HourlyRollup, DbError> {
    let samples = store.samples_in_range(hour_start, hour_start + 3600)?;
    let rollup = aggregate_hour(&samples, hour_start, interval_seconds, monitored);
    store.upsert_rollup(&rollup)?;
    Ok(rollup)
}

/// Run one rollup cycle: re-process the trailing fully-elapsed hours, then
/// purge data past retention. Per-hour failures are logged and skipped.
pub fn run_rollup_cycle(store: &Store, cfg: &Config, now: i64) {
    let current_hour = hour_floor(now);

    for i in (1..=CATCHUP_HOURS).rev() {
        let hour_start = current_hour - i * 3600;
        match rollup_hour(store, hour_start, cfg.interval_seconds(), &cfg.monitored) {
            Ok(rollup) => {
                tracing::debug!(
                    "rollup: hour {} ok={}/{} ({}%)",
                    hour_start,
                    rollup.samples_ok,
                    rollup.samples_expected,
                    rollup.uptime_pct
                );
            }
            Err(e) => {
                tracing::error!("rollup: failed for hour {}: {}", hour_start, e);
            }
        }
    }

    retention::purge(store, cfg.retention_days, now);
}
