//! Scheduler module: drives the probe and rollup cycles.

mod retention;
mod rollup;

pub use retention::*;
pub use rollup::*;

use crate::config::Config;
use crate::db::{ComponentKind, Store};
use crate::probe::{DbProbe, HttpProbe, ProbeError};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Interval gate: whether enough time has passed since the last run.
///
/// The last-run timestamp is owned by the calling loop and passed in
/// explicitly; a cycle that has never run is always due.
pub fn should_run(last_run: Option<i64>, now: i64, interval_seconds: i64) -> bool {
    match last_run {
        None => true,
        Some(t) => now - t >= interval_seconds,
    }
}

/// Orchestrates the background probe and rollup loops.
pub struct Scheduler {
    store: Arc<Store>,
    cfg: Config,
    stop: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(store: Arc<Store>, cfg: Config) -> Self {
        let (stop, _) = broadcast::channel(1);
        Self { store, cfg, stop }
    }

    /// Spawn the probe and rollup loops.
    pub fn start(&self) -> Result<(), ProbeError> {
        let http = HttpProbe::new(&self.cfg.health_url, self.cfg.health_token.as_deref())?;
        let db = DbProbe::new((*self.store).clone());

        tracing::info!(
            "Scheduler: probing {} every {}m, monitoring [{}]",
            self.cfg.health_url,
            self.cfg.interval_minutes,
            self.cfg
                .monitored
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        tokio::spawn(run_probe_loop(
            self.store.clone(),
            self.cfg.clone(),
            http,
            db,
            self.stop.subscribe(),
        ));
        tokio::spawn(run_rollup_loop(
            self.store.clone(),
            self.cfg.clone(),
            self.stop.subscribe(),
        ));

        Ok(())
    }

    /// Stop both loops.
    pub fn stop(&self) {
        let _ = self.stop.send(());
    }
}

/// Tick once a minute and run a probe cycle whenever the configured
/// interval has elapsed.
async fn run_probe_loop(
    store: Arc<Store>,
    cfg: Config,
    http: HttpProbe,
    db: DbProbe,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut last_run: Option<i64> = None;

    let mut interval = tokio::time::interval(Duration::from_secs(60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = interval.tick() => {
                let now = Utc::now().timestamp();
                if !should_run(last_run, now, cfg.interval_seconds()) {
                    continue;
                }
                last_run = Some(now);

                // Jitter so probes don't land exactly on the tick.
                let jitter = rand::random::<u64>() % 100;
                tokio::time::sleep(Duration::from_millis(jitter)).await;

                run_probe_cycle(&store, &cfg, &http, &db, now).await;
            }
        }
    }
}

/// Probe every monitored kind once and record the samples. A storage
/// failure ends the cycle early; the next tick retries.
async fn run_probe_cycle(
    store: &Store,
    cfg: &Config,
    http: &HttpProbe,
    db: &DbProbe,
    now: i64,
) {
    for kind in &cfg.monitored {
        let sample = match kind {
            ComponentKind::Http => http.probe(now).await,
            ComponentKind::Db => db.probe(now),
        };

        if !sample.status {
            tracing::warn!(
                "probe: {} down (code {}): {}",
                kind,
                sample.http_code,
                sample.message
            );
        }

        if let Err(e) = store.record(&sample, cfg.interval_seconds()) {
            tracing::error!("probe: failed to record {} sample: {}", kind, e);
            return;
        }
    }
}

/// Tick once a minute and run a rollup cycle once per elapsed hour.
async fn run_rollup_loop(store: Arc<Store>, cfg: Config, mut stop_rx: broadcast::Receiver<()>) {
    let mut last_run: Option<i64> = None;

    let mut interval = tokio::time::interval(Duration::from_secs(60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = interval.tick() => {
                let now = Utc::now().timestamp();
                if !should_run(last_run, now, 3600) {
                    continue;
                }
                // Anchor to the hour so the next run lands just past the
                // next boundary rather than drifting through the hour.
                last_run = Some(hour_floor(now));

                run_rollup_cycle(&store, &cfg, now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_run_first_invocation() {
        assert!(should_run(None, 1_700_000_000, 300));
    }

    #[test]
    fn test_should_run_gates_on_interval() {
        let now = 1_700_000_000;
        assert!(!should_run(Some(now - 299), now, 300));
        assert!(should_run(Some(now - 300), now, 300));
        assert!(should_run(Some(now - 301), now, 300));
    }

    #[test]
    fn test_should_run_hour_anchor() {
        // Anchored to an hour start, the gate reopens at the next boundary.
        let hour = 1_699_999_200;
        assert!(!should_run(Some(hour), hour + 3599, 3600));
        assert!(should_run(Some(hour), hour + 3600, 3600));
    }
}
