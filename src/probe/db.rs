//! Storage round-trip probe.

use std::time::Instant;

use crate::db::{ComponentKind, Sample, Store};

/// Measures a storage round trip and reports it as a `db` sample.
pub struct DbProbe {
    store: Store,
}

impl DbProbe {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn probe(&self, now: i64) -> Sample {
        let start = Instant::now();
        let result = self.store.ping();
        let latency_ms = start.elapsed().as_millis() as i64;

        let (status, message) = match result {
            Ok(()) => (true, "DB OK".to_string()),
            Err(e) => (false, e.to_string()),
        };

        Sample {
            kind: ComponentKind::Db,
            timestamp: now,
            status,
            latency_ms,
            http_code: 0,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_db_probe_up() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();

        let sample = DbProbe::new(store).probe(1_700_000_000);
        assert_eq!(sample.kind, ComponentKind::Db);
        assert!(sample.status);
        assert_eq!(sample.http_code, 0);
        assert_eq!(sample.message, "DB OK");
    }
}
