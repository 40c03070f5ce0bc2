//! Engine Statistics
//!
//! Running counters for observability. Cheap atomics bumped inside the
//! batch pipeline, snapshotted on demand for status surfaces.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters (interior mutability, shared freely)
#[derive(Debug, Default)]
pub struct EngineCounters {
    pub batches_applied: AtomicU64,
    pub sightings_ingested: AtomicU64,
    pub sightings_dropped: AtomicU64,
    pub records_created: AtomicU64,
    pub identities_merged: AtomicU64,
    pub alerts_fired: AtomicU64,
}

impl EngineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> EngineStats {
        EngineStats {
            batches_applied: self.batches_applied.load(Ordering::Relaxed),
            sightings_ingested: self.sightings_ingested.load(Ordering::Relaxed),
            sightings_dropped: self.sightings_dropped.load(Ordering::Relaxed),
            records_created: self.records_created.load(Ordering::Relaxed),
            identities_merged: self.identities_merged.load(Ordering::Relaxed),
            alerts_fired: self.alerts_fired.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.batches_applied.store(0, Ordering::Relaxed);
        self.sightings_ingested.store(0, Ordering::Relaxed);
        self.sightings_dropped.store(0, Ordering::Relaxed);
        self.records_created.store(0, Ordering::Relaxed);
        self.identities_merged.store(0, Ordering::Relaxed);
        self.alerts_fired.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub batches_applied: u64,
    pub sightings_ingested: u64,
    pub sightings_dropped: u64,
    pub records_created: u64,
    pub identities_merged: u64,
    pub alerts_fired: u64,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let counters = EngineCounters::new();
        counters.batches_applied.fetch_add(3, Ordering::Relaxed);
        counters.alerts_fired.fetch_add(1, Ordering::Relaxed);

        let stats = counters.snapshot();
        assert_eq!(stats.batches_applied, 3);
        assert_eq!(stats.alerts_fired, 1);

        counters.reset();
        assert_eq!(counters.snapshot().batches_applied, 0);
    }
}
