//! Engine - Single-Writer Batch Pipeline
//!
//! Owns the device store and the proximity monitor behind one writer lock
//! and runs each ingestion batch through the full pass:
//! correlate -> store update -> escalation -> proximity alerting.
//!
//! Readers never touch the live store: every mutation publishes a fresh
//! copy-on-write snapshot, so a render/export collaborator observes the
//! pre-batch or post-batch state, never a half-updated record.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::logic::config::EngineConfig;
use crate::logic::device::{DeviceRecord, SightingBatch};
use crate::logic::escalation;
use crate::logic::events::{AlertBus, AlertEvent};
use crate::logic::proximity::ProximityMonitor;
use crate::logic::snapshot::{RecordSnapshot, SnapshotError};
use crate::logic::stats::{EngineCounters, EngineStats};
use crate::logic::store::DeviceStore;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Command referenced an identifier the store does not hold
    UnknownDevice(String),
    /// Snapshot load/persist failure
    Snapshot(SnapshotError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDevice(id) => write!(f, "Unknown device: {}", id),
            Self::Snapshot(e) => write!(f, "Snapshot error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<SnapshotError> for EngineError {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}

// ============================================================================
// BATCH REPORT
// ============================================================================

/// Summary of one applied batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub updated: u64,
    pub created: u64,
    pub merged: u64,
    pub dropped: u64,
    /// Alerts armed during this batch (also published on the event bus)
    pub alerts: Vec<AlertEvent>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Mutable state guarded by the single writer lock
struct EngineInner {
    store: DeviceStore,
    monitor: ProximityMonitor,
}

/// The counter-surveillance core. One instance per session; cheap to share
/// behind an `Arc`.
pub struct Engine {
    inner: Mutex<EngineInner>,
    /// Published read snapshot, swapped whole after every mutation
    view: RwLock<Arc<HashMap<String, DeviceRecord>>>,
    alert_bus: AlertBus,
    counters: EngineCounters,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                store: DeviceStore::new(),
                monitor: ProximityMonitor::new(),
            }),
            view: RwLock::new(Arc::new(HashMap::new())),
            alert_bus: AlertBus::new(),
            counters: EngineCounters::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // BATCH PIPELINE
    // ========================================================================

    /// Apply one ingestion batch at the current wall clock
    pub fn apply_batch(&self, batch: &SightingBatch) -> BatchReport {
        self.apply_batch_at(batch, Utc::now())
    }

    /// Apply one ingestion batch at an explicit timestamp (replay, tests).
    ///
    /// Batches are serialized: the writer lock is held for the whole pass,
    /// and the operator snapshot inside `batch` is the only position every
    /// record in it sees.
    pub fn apply_batch_at(&self, batch: &SightingBatch, now: DateTime<Utc>) -> BatchReport {
        let mut inner = self.inner.lock();

        let outcome = inner.store.apply_batch(
            batch,
            now,
            &self.config.correlation,
            &self.config.signature,
        );

        // Alert lifecycle follows identity transfers so a rotated address
        // keeps its suppression state
        for (old_id, new_id) in &outcome.merges {
            inner.monitor.rename(old_id, new_id);
        }

        // Escalation + proximity for every record the batch touched
        let mut alerts = Vec::new();
        for id in &outcome.updated_ids {
            let EngineInner { store, monitor } = &mut *inner;
            if let Some(record) = store.get_mut(id) {
                escalation::run(record, batch.operator_position, now, &self.config.escalation);
                if let Some(event) = monitor.check(record, now, &self.config.proximity) {
                    self.alert_bus.emit(event.clone());
                    alerts.push(event);
                }
            }
        }

        self.counters.batches_applied.fetch_add(1, Ordering::Relaxed);
        self.counters
            .sightings_ingested
            .fetch_add(outcome.updated_ids.len() as u64, Ordering::Relaxed);
        self.counters
            .sightings_dropped
            .fetch_add(outcome.dropped, Ordering::Relaxed);
        self.counters
            .records_created
            .fetch_add(outcome.created, Ordering::Relaxed);
        self.counters
            .identities_merged
            .fetch_add(outcome.merges.len() as u64, Ordering::Relaxed);
        self.counters
            .alerts_fired
            .fetch_add(alerts.len() as u64, Ordering::Relaxed);

        let report = BatchReport {
            updated: outcome.updated_ids.len() as u64,
            created: outcome.created,
            merged: outcome.merges.len() as u64,
            dropped: outcome.dropped,
            alerts,
        };

        self.publish_view(&inner);
        log::debug!(
            "batch applied: {} updated, {} created, {} merged, {} dropped, {} alerts",
            report.updated,
            report.created,
            report.merged,
            report.dropped,
            report.alerts.len()
        );

        report
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    /// Current record set. The returned map is an immutable snapshot; it
    /// stays coherent however long the caller holds it.
    pub fn records(&self) -> Arc<HashMap<String, DeviceRecord>> {
        self.view.read().clone()
    }

    pub fn device(&self, id: &str) -> Option<DeviceRecord> {
        self.view.read().get(id).cloned()
    }

    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    /// Subscribe to alert-armed events
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alert_bus.subscribe()
    }

    // ========================================================================
    // EXTERNAL COMMANDS
    // ========================================================================

    /// Mute a device. Clears tracking and suppresses future escalation.
    pub fn ignore(&self, id: &str) -> Result<(), EngineError> {
        self.with_record(id, |record, _| record.set_ignored(true))
    }

    /// Flag a device for active monitoring
    pub fn track(&self, id: &str) -> Result<(), EngineError> {
        self.with_record(id, |record, _| record.set_tracked(true))
    }

    /// Acknowledge a proximity alert. The identifier stays quiet until the
    /// session resets.
    pub fn dismiss_alert(&self, id: &str) {
        let mut inner = self.inner.lock();
        inner.monitor.dismiss(id);
        log::info!("alert dismissed for {}", id);
    }

    /// Track the device and acknowledge its alert in one step
    pub fn engage(&self, id: &str) -> Result<(), EngineError> {
        self.with_record(id, |record, monitor| {
            record.set_tracked(true);
            monitor.dismiss(id);
        })
    }

    /// Clear alert lifecycle state. Records are untouched.
    pub fn reset_session(&self) {
        let mut inner = self.inner.lock();
        inner.monitor.reset();
        log::info!("session alert state reset");
    }

    /// Full purge: records, alert state, counters
    pub fn reset_all(&self) {
        let mut inner = self.inner.lock();
        inner.store.clear();
        inner.monitor.reset();
        self.counters.reset();
        self.publish_view(&inner);
        log::info!("engine state purged");
    }

    // ========================================================================
    // PERSISTENCE HOOKS
    // ========================================================================

    /// Restore the record set from a snapshot handed in by the storage
    /// collaborator
    pub fn load_records(&self, snapshot: RecordSnapshot) {
        let mut inner = self.inner.lock();
        let count = snapshot.devices.len();
        inner.store.replace_all(snapshot.devices);
        self.publish_view(&inner);
        log::info!("loaded {} records from snapshot", count);
    }

    /// Capture the record set for the storage collaborator
    pub fn persist_records(&self) -> RecordSnapshot {
        let inner = self.inner.lock();
        let devices = inner.store.records().values().cloned().collect();
        RecordSnapshot::new(devices, Utc::now())
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    fn with_record<F>(&self, id: &str, mutate: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut DeviceRecord, &mut ProximityMonitor),
    {
        let mut inner = self.inner.lock();
        let EngineInner { store, monitor } = &mut *inner;
        let record = store
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownDevice(id.to_string()))?;
        mutate(record, monitor);
        self.publish_view(&inner);
        Ok(())
    }

    /// Swap in a fresh read snapshot; called with the writer lock held so
    /// the published view always reflects a fully-applied state
    fn publish_view(&self, inner: &EngineInner) {
        let snapshot = Arc::new(inner.store.records().clone());
        *self.view.write() = snapshot;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
