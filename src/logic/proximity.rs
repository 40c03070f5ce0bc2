//! Proximity Alert Monitor
//!
//! Close-range high-threat encounter alerting. Each identifier walks a
//! small state machine: idle -> armed -> dismissed. Arming emits exactly
//! one alert per not-dismissed epoch; repeated strong sightings of an
//! already-armed device stay silent. Dismissed identifiers stay suppressed
//! until an explicit session reset.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::device::DeviceRecord;
use crate::logic::events::AlertEvent;
use crate::logic::threat::ThreatLevel;

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Signal stronger than this counts as close range (dBm)
pub const PROXIMITY_SIGNAL_DBM: i32 = -65;

/// Proximity knobs (configurable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityThresholds {
    pub proximity_signal_dbm: i32,
}

impl Default for ProximityThresholds {
    fn default() -> Self {
        Self {
            proximity_signal_dbm: PROXIMITY_SIGNAL_DBM,
        }
    }
}

// ============================================================================
// ALERT STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertState {
    Idle,
    Armed,
    Dismissed,
}

// ============================================================================
// MONITOR
// ============================================================================

/// Per-session alert lifecycle state
#[derive(Debug, Default)]
pub struct ProximityMonitor {
    armed: HashSet<String>,
    dismissed: HashSet<String>,
}

impl ProximityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one record during the batch pass. Returns the alert event
    /// if the identifier transitioned idle -> armed.
    pub fn check(
        &mut self,
        record: &DeviceRecord,
        now: DateTime<Utc>,
        thresholds: &ProximityThresholds,
    ) -> Option<AlertEvent> {
        if record.threat_level != ThreatLevel::High {
            return None;
        }
        if record.signal_dbm <= thresholds.proximity_signal_dbm {
            return None;
        }
        if record.is_ignored {
            return None;
        }
        if self.dismissed.contains(&record.id) || self.armed.contains(&record.id) {
            return None;
        }

        self.armed.insert(record.id.clone());
        Some(AlertEvent::new(
            record.id.clone(),
            record.threat_level,
            record.signal_dbm,
            now,
        ))
    }

    /// Operator acknowledged the alert. The identifier stays suppressed
    /// until the session resets.
    pub fn dismiss(&mut self, id: &str) {
        self.armed.remove(id);
        self.dismissed.insert(id.to_string());
    }

    /// Carry alert state across an identity rename so a device cannot
    /// clear its own alert suppression by rotating its address
    pub fn rename(&mut self, old_id: &str, new_id: &str) {
        if self.armed.remove(old_id) {
            self.armed.insert(new_id.to_string());
        }
        if self.dismissed.remove(old_id) {
            self.dismissed.insert(new_id.to_string());
        }
    }

    pub fn state(&self, id: &str) -> AlertState {
        if self.armed.contains(id) {
            AlertState::Armed
        } else if self.dismissed.contains(id) {
            AlertState::Dismissed
        } else {
            AlertState::Idle
        }
    }

    /// Identifiers currently armed
    pub fn armed_ids(&self) -> Vec<String> {
        self.armed.iter().cloned().collect()
    }

    /// Clear all alert lifecycle state (session reset)
    pub fn reset(&mut self) {
        self.armed.clear();
        self.dismissed.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
