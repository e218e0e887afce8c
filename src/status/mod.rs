//! Status aggregator: derives current and historical state from the store.
//!
//! Reads never fail at this boundary. Missing or unreadable data degrades
//! to down/stale defaults so an outage of the pipeline itself still shows
//! up as downtime.

use crate::db::{ComponentKind, Sample, Store};
use crate::scheduler::{hour_floor, round2};

use serde::Serialize;
use std::collections::BTreeMap;

/// Overall service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Operational,
    Partial,
    Down,
}

/// Color class for one history bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarClass {
    Ok,
    Good,
    Warn,
    Bad,
    Down,
}

/// Per-component state within a snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComponentStatus {
    pub up: bool,
    pub fresh: bool,
}

/// The answer to "what is the state right now".
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub overall: Overall,
    pub components: BTreeMap<ComponentKind, ComponentStatus>,
    pub samples: BTreeMap<ComponentKind, Sample>,
}

/// One hour of the status-history chart.
#[derive(Debug, Clone, Serialize)]
pub struct HourBar {
    pub hour_start: i64,
    pub uptime_pct: f64,
    pub class: BarClass,
}

/// Compute the current status snapshot.
///
/// A sample is fresh iff it is at most twice the probe interval old; a
/// component with no fresh evidence of being up counts as down, never as
/// "assume still up". Components with no sample at all get a synthesized
/// stale placeholder so callers always have something to render.
pub fn current_status(
    store: &Store,
    monitored: &[ComponentKind],
    interval_minutes: i64,
    now: i64,
) -> StatusSnapshot {
    let threshold = 2 * interval_minutes * 60;

    let mut components = BTreeMap::new();
    let mut samples = BTreeMap::new();
    let mut fresh_up = 0usize;

    for kind in monitored {
        let latest = store.latest(*kind).unwrap_or_else(|e| {
            tracing::error!("status: failed to read latest {} sample: {}", kind, e);
            None
        });

        let sample = latest.unwrap_or_else(|| placeholder(*kind, now));
        let fresh = now - sample.timestamp <= threshold;

        if fresh && sample.status {
            fresh_up += 1;
        }
        components.insert(
            *kind,
            ComponentStatus {
                up: sample.status,
                fresh,
            },
        );
        samples.insert(*kind, sample);
    }

    let overall = if !monitored.is_empty() && fresh_up == monitored.len() {
        Overall::Operational
    } else if fresh_up > 0 {
        Overall::Partial
    } else {
        Overall::Down
    };

    StatusSnapshot {
        overall,
        components,
        samples,
    }
}

/// Stand-in sample for a component with no recorded data: down and stale,
/// stamped at the current hour boundary.
fn placeholder(kind: ComponentKind, now: i64) -> Sample {
    Sample {
        kind,
        timestamp: hour_floor(now),
        status: false,
        latency_ms: 0,
        http_code: 0,
        message: "no recent samples".to_string(),
    }
}

/// Build the trailing `window_hours` complete hour bars, oldest first.
/// An hour with no rollup reads as 0% / down.
pub fn historical_bars(store: &Store, window_hours: i64, now: i64) -> Vec<HourBar> {
    let window = window_hours.max(1);
    let current_hour = hour_floor(now);

    let rollups = store
        .rollups_in_range(current_hour - window * 3600, current_hour)
        .unwrap_or_else(|e| {
            tracing::error!("status: failed to read rollups: {}", e);
            Vec::new()
        });
    let by_hour: BTreeMap<i64, f64> = rollups
        .into_iter()
        .map(|r| (r.hour_start, r.uptime_pct))
        .collect();

    (1..=window)
        .rev()
        .map(|i| {
            let hour_start = current_hour - i * 3600;
            let uptime_pct = by_hour.get(&hour_start).copied().unwrap_or(0.0);
            HourBar {
                hour_start,
                uptime_pct,
                class: bar_class(uptime_pct),
            }
        })
        .collect()
}

/// Mean uptime over the trailing 24 complete hours, missing hours as 0.
pub fn uptime_24h(store: &Store, now: i64) -> f64 {
    let current_hour = hour_floor(now);
    let sum: f64 = store
        .rollups_in_range(current_hour - 24 * 3600, current_hour)
        .unwrap_or_else(|e| {
            tracing::error!("status: failed to read rollups: {}", e);
            Vec::new()
        })
        .iter()
        .map(|r| r.uptime_pct)
        .sum();

    round2(sum / 24.0)
}

fn bar_class(pct: f64) -> BarClass {
    if pct >= 99.0 {
        BarClass::Ok
    } else if pct >= 95.0 {
        BarClass::Good
    } else if pct >= 80.0 {
        BarClass::Warn
    } else if pct > 0.0 {
        BarClass::Bad
    } else {
        BarClass::Down
    }
}
