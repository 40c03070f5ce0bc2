//! Engine Commands - API for External Collaborators
//!
//! Flattened record views for rendering/export plus the operator command
//! set: ignore, track, dismiss, engage, session reset, purge, and the
//! snapshot persistence hooks.

use serde::{Deserialize, Serialize};

use crate::logic::device::DeviceRecord;
use crate::logic::engine::{Engine, EngineError};
use crate::logic::geo::GeoPoint;
use crate::logic::snapshot::RecordSnapshot;
use crate::logic::stats::EngineStats;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Display-friendly view of one device record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceView {
    pub id: String,
    pub prior_ids: Vec<String>,
    pub display_name: Option<String>,
    pub vendor: String,
    pub device_class: String,
    pub signal_dbm: i32,
    pub first_seen_at: String,
    pub last_seen_at: String,
    pub current_position: Option<GeoPoint>,
    pub trail_points: usize,
    pub probed_networks: Vec<String>,
    pub persistence_score: f32,
    pub recency_bucket: String,
    pub threat_level: String,
    pub is_ignored: bool,
    pub is_tracked: bool,
    pub note: Option<String>,
}

impl From<&DeviceRecord> for DeviceView {
    fn from(r: &DeviceRecord) -> Self {
        Self {
            id: r.id.clone(),
            prior_ids: r.prior_ids.clone(),
            display_name: r.display_name.clone(),
            vendor: r.vendor.clone(),
            device_class: r.device_class.as_str().to_string(),
            signal_dbm: r.signal_dbm,
            first_seen_at: r.first_seen_at.to_rfc3339(),
            last_seen_at: r.last_seen_at.to_rfc3339(),
            current_position: r.current_position,
            trail_points: r.position_history.len(),
            probed_networks: r.probed_networks.iter().cloned().collect(),
            persistence_score: r.persistence_score,
            recency_bucket: r.recency_bucket.as_str().to_string(),
            threat_level: r.threat_level.as_str().to_string(),
            is_ignored: r.is_ignored,
            is_tracked: r.is_tracked,
            note: r.note.clone(),
        }
    }
}

/// Engine status for dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub device_count: usize,
    pub tracked_count: usize,
    pub high_threat_count: usize,
    pub stats: EngineStats,
}

// ============================================================================
// READ COMMANDS
// ============================================================================

/// Full record set, most recently seen first
pub fn get_devices(engine: &Engine) -> Vec<DeviceView> {
    let records = engine.records();
    let mut sorted: Vec<&DeviceRecord> = records.values().collect();
    sorted.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
    sorted.into_iter().map(DeviceView::from).collect()
}

pub fn get_device(engine: &Engine, id: &str) -> Option<DeviceView> {
    engine.device(id).map(|r| DeviceView::from(&r))
}

pub fn get_engine_status(engine: &Engine) -> EngineStatus {
    let records = engine.records();
    EngineStatus {
        device_count: records.len(),
        tracked_count: records.values().filter(|r| r.is_tracked).count(),
        high_threat_count: records
            .values()
            .filter(|r| r.threat_level.as_str() == "high")
            .count(),
        stats: engine.stats(),
    }
}

// ============================================================================
// OPERATOR COMMANDS
// ============================================================================

pub fn ignore_device(engine: &Engine, id: &str) -> Result<(), EngineError> {
    engine.ignore(id)
}

pub fn track_device(engine: &Engine, id: &str) -> Result<(), EngineError> {
    engine.track(id)
}

pub fn dismiss_alert(engine: &Engine, id: &str) {
    engine.dismiss_alert(id)
}

pub fn engage_device(engine: &Engine, id: &str) -> Result<(), EngineError> {
    engine.engage(id)
}

pub fn reset_session(engine: &Engine) {
    engine.reset_session()
}

/// Full purge of accumulated device state
pub fn reset_all(engine: &Engine) {
    engine.reset_all()
}

// ============================================================================
// PERSISTENCE COMMANDS
// ============================================================================

pub fn load_records(engine: &Engine, snapshot: RecordSnapshot) {
    engine.load_records(snapshot)
}

pub fn persist_records(engine: &Engine) -> RecordSnapshot {
    engine.persist_records()
}

// ============================================================================
// TESTS
// ============================================================================
