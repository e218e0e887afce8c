//! Configuration module for pulseboard.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Malformed or non-positive values fall back to the default silently.

use std::env;

use crate::db::ComponentKind;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "pulseboard.db")
    pub db_path: String,
    /// Health endpoint probed by the http check (default: own /health)
    pub health_url: String,
    /// Optional shared secret appended to probe requests and required by
    /// the health endpoint when set
    pub health_token: Option<String>,
    /// Probe cadence in minutes (default: 5)
    pub interval_minutes: i64,
    /// Retention window in days for samples and rollups (default: 30)
    pub retention_days: i64,
    /// Which component kinds are monitored (default: http)
    pub monitored: Vec<ComponentKind>,
    /// Default status-history window in days (default: 5)
    pub status_page_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "pulseboard.db".to_string(),
            health_url: "http://127.0.0.1:8080/health".to_string(),
            health_token: None,
            interval_minutes: 5,
            retention_days: 30,
            monitored: vec![ComponentKind::Http],
            status_page_days: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PULSEBOARD_HTTP_PORT`: HTTP port (default: 8080)
    /// - `PULSEBOARD_DB_PATH`: database file path (default: "pulseboard.db")
    /// - `PULSEBOARD_HEALTH_URL`: probe target (default: own /health)
    /// - `PULSEBOARD_HEALTH_TOKEN`: shared health secret (default: unset)
    /// - `PULSEBOARD_INTERVAL_MINUTES`: probe cadence (default: 5)
    /// - `PULSEBOARD_RETENTION_DAYS`: retention window (default: 30)
    /// - `PULSEBOARD_MONITOR`: comma list from {http, db} (default: "http")
    /// - `PULSEBOARD_STATUS_PAGE_DAYS`: history window (default: 5)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("PULSEBOARD_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(db_path) = env::var("PULSEBOARD_DB_PATH") {
            cfg.db_path = db_path;
        }

        cfg.health_url = env::var("PULSEBOARD_HEALTH_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}/health", cfg.http_port));

        if let Ok(token) = env::var("PULSEBOARD_HEALTH_TOKEN") {
            if !token.is_empty() {
                cfg.health_token = Some(token);
            }
        }

        if let Ok(minutes) = env::var("PULSEBOARD_INTERVAL_MINUTES") {
            if let Ok(minutes) = minutes.parse::<i64>() {
                if minutes > 0 {
                    cfg.interval_minutes = minutes;
                }
            }
        }

        if let Ok(days) = env::var("PULSEBOARD_RETENTION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                if days > 0 {
                    cfg.retention_days = days;
                }
            }
        }

        if let Ok(list) = env::var("PULSEBOARD_MONITOR") {
            let monitored = parse_monitored(&list);
            if !monitored.is_empty() {
                cfg.monitored = monitored;
            }
        }

        if let Ok(days) = env::var("PULSEBOARD_STATUS_PAGE_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                if days > 0 {
                    cfg.status_page_days = days;
                }
            }
        }

        cfg
    }

    /// Probe cadence in seconds.
    pub fn interval_seconds(&self) -> i64 {
        self.interval_minutes * 60
    }
}

/// Parse a comma-separated monitored-components list, ignoring unknown
/// names and duplicates.
fn parse_monitored(list: &str) -> Vec<ComponentKind> {
    let mut monitored = Vec::new();
    for name in list.split(',') {
        if let Ok(kind) = name.trim().parse::<ComponentKind>() {
            if !monitored.contains(&kind) {
                monitored.push(kind);
            }
        }
    }
    monitored
}
