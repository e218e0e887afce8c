//! Database model types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A monitored subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Http,
    Db,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Http => "http",
            ComponentKind::Db => "db",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(ComponentKind::Http),
            "db" => Ok(ComponentKind::Db),
            other => Err(format!("unknown component kind: {}", other)),
        }
    }
}

/// One recorded check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub kind: ComponentKind,
    /// UTC seconds when the check ran.
    pub timestamp: i64,
    /// Up (true) or down (false).
    pub status: bool,
    pub latency_ms: i64,
    /// HTTP response code, 0 when none was obtainable.
    pub http_code: i64,
    pub message: String,
}

/// Aggregated uptime for one clock hour.
///
/// `hour_start` is UTC seconds aligned to an hour boundary and is the
/// unique key. Invariant: `samples_ok <= samples_expected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRollup {
    pub hour_start: i64,
    pub samples_expected: i64,
    pub samples_ok: i64,
    pub uptime_pct: f64,
}
