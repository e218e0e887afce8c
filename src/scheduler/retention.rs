//! Retention: purges raw samples and expired rollups.

use crate::db::Store;

use super::rollup::hour_floor;

/// Delete data past retention. Raw samples are kept only for the hour
/// still being accumulated; rollups are kept for `retention_days`.
/// Zero-match purges are fine; failures are logged and skipped.
pub fn purge(store: &Store, retention_days: i64, now: i64) {
    let current_hour = hour_floor(now);

    match store.delete_samples_before(current_hour) {
        Ok(n) if n > 0 => tracing::debug!("retention: purged {} raw samples", n),
        Ok(_) => {}
        Err(e) => tracing::error!("retention: failed to purge raw samples: {}", e),
    }

    let days = if retention_days > 0 { retention_days } else { 30 };
    let cutoff = hour_floor(now - days * 86400);

    match store.delete_rollups_before(cutoff) {
        Ok(n) if n > 0 => tracing::debug!("retention: purged {} hourly rollups", n),
        Ok(_) => {}
        Err(e) => tracing::error!("retention: failed to purge rollups: {}", e),
    }
}
