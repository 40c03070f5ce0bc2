//! Device Data Model
//!
//! One `DeviceRecord` per physical radio identity as currently understood.
//! Records are created on first sighting, mutated on every later batch,
//! and renamed in place when the identity correlator decides a new address
//! is an old device. Nothing here is deleted automatically.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MIN_MOVEMENT_METERS, POSITION_HISTORY_CAP};
use crate::logic::geo::{self, GeoPoint};
use crate::logic::threat::ThreatLevel;

/// Vendor string used when the manufacturer cannot be resolved
pub const VENDOR_UNKNOWN: &str = "Unknown";

/// Accepted signal strength range (dBm). Receivers report negative values;
/// anything outside this range is sensor garbage and the sighting is dropped.
pub const SIGNAL_DBM_MIN: i32 = -120;
pub const SIGNAL_DBM_MAX: i32 = 0;

// ============================================================================
// RADIO CLASSIFICATION
// ============================================================================

/// Radio technology class reported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Wi-Fi infrastructure access point
    AccessPoint,
    /// Wi-Fi client station
    ClientStation,
    /// Classic Bluetooth (BR/EDR)
    BluetoothClassic,
    /// Bluetooth Low Energy
    BluetoothLe,
    Unknown,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::AccessPoint => "access-point",
            DeviceClass::ClientStation => "client-station",
            DeviceClass::BluetoothClassic => "bt-classic",
            DeviceClass::BluetoothLe => "bt-le",
            DeviceClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RECENCY
// ============================================================================

/// Age bucket derived from time since first observation.
/// Derived by the escalation engine, never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecencyBucket {
    Recent,
    Medium,
    Old,
    Oldest,
}

impl RecencyBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecencyBucket::Recent => "recent",
            RecencyBucket::Medium => "medium",
            RecencyBucket::Old => "old",
            RecencyBucket::Oldest => "oldest",
        }
    }
}

// ============================================================================
// RAW SIGHTING (input)
// ============================================================================

/// One raw telemetry report of a device's radio signature at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSighting {
    /// Hardware address as reported by the sensor
    pub id: String,
    /// Manufacturer, if the sensor already resolved it
    pub vendor: Option<String>,
    /// Advertised network name; absent means hidden
    pub display_name: Option<String>,
    pub signal_dbm: i32,
    pub device_class: DeviceClass,
    /// Network names the device has probed for
    pub probed_networks: Vec<String>,
    /// Device-associated GPS fix, if the sensor provides one
    pub position: Option<GeoPoint>,
}

/// Why a sighting was rejected during sanitization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SightingError {
    MissingId,
    InvalidSignal(i32),
}

impl std::fmt::Display for SightingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "sighting has no identifier"),
            Self::InvalidSignal(dbm) => write!(f, "signal {} dBm outside accepted range", dbm),
        }
    }
}

impl std::error::Error for SightingError {}

impl RawSighting {
    /// Normalize and validate one raw report.
    ///
    /// Identifier is trimmed and upper-cased (the canonical form used as
    /// the store key). Out-of-range coordinates degrade to no-position;
    /// a missing identifier or nonsense signal rejects the sighting.
    pub fn sanitized(mut self) -> Result<RawSighting, SightingError> {
        self.id = self.id.trim().to_ascii_uppercase();
        if self.id.is_empty() {
            return Err(SightingError::MissingId);
        }
        if !(SIGNAL_DBM_MIN..=SIGNAL_DBM_MAX).contains(&self.signal_dbm) {
            return Err(SightingError::InvalidSignal(self.signal_dbm));
        }
        self.position = self.position.and_then(GeoPoint::validated);
        Ok(self)
    }
}

/// One ingestion batch: the sightings plus the operator GPS snapshot taken
/// at batch start. Every record in the batch is processed against this one
/// snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SightingBatch {
    pub sightings: Vec<RawSighting>,
    pub operator_position: Option<GeoPoint>,
}

impl SightingBatch {
    pub fn new(sightings: Vec<RawSighting>, operator_position: Option<GeoPoint>) -> Self {
        Self {
            sightings,
            operator_position: operator_position.and_then(GeoPoint::validated),
        }
    }
}

// ============================================================================
// DEVICE RECORD
// ============================================================================

/// The rolling behavioral model of one observed device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Canonical hardware address (upper-cased, store key)
    pub id: String,
    /// Superseded identifiers, oldest first (identity continuity across
    /// address randomization)
    pub prior_ids: Vec<String>,
    /// Advertised network name; None = hidden
    pub display_name: Option<String>,
    /// Manufacturer, or "Unknown"
    pub vendor: String,
    pub device_class: DeviceClass,
    /// Latest received signal strength (closer to 0 = stronger)
    pub signal_dbm: i32,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Operator GPS at the moment of first observation. Captured once,
    /// immutable afterwards; anchor for follow-detection displacement.
    pub first_seen_operator_position: Option<GeoPoint>,
    /// Last known device-associated fix (may be an operator-position
    /// fallback when the sensor gives none)
    pub current_position: Option<GeoPoint>,
    /// Movement trail: fixes recorded only when the device moved more than
    /// 10 m from the last recorded fix. Ring buffer, oldest dropped first.
    pub position_history: VecDeque<GeoPoint>,
    /// Whether any real (sensor-provided) fix was ever recorded. Guards the
    /// operator-position fallback out of movement tracking.
    #[serde(default)]
    pub has_device_fix: bool,
    /// Distinct network names the device has searched for. Accumulates.
    pub probed_networks: BTreeSet<String>,
    /// Normalized dwell measure in [0.0, 1.0]
    pub persistence_score: f32,
    pub recency_bucket: RecencyBucket,
    pub threat_level: ThreatLevel,
    pub is_ignored: bool,
    pub is_tracked: bool,
    /// Annotation written by escalation or alias-merge events
    pub note: Option<String>,
}

impl DeviceRecord {
    /// Create a record for a genuinely new identity
    pub fn from_sighting(
        sighting: &RawSighting,
        vendor: String,
        threat_level: ThreatLevel,
        operator_position: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id: sighting.id.clone(),
            prior_ids: Vec::new(),
            display_name: sighting.display_name.clone(),
            vendor,
            device_class: sighting.device_class,
            signal_dbm: sighting.signal_dbm,
            first_seen_at: now,
            last_seen_at: now,
            first_seen_operator_position: operator_position,
            current_position: None,
            position_history: VecDeque::new(),
            has_device_fix: false,
            probed_networks: sighting.probed_networks.iter().cloned().collect(),
            persistence_score: 0.0,
            recency_bucket: RecencyBucket::Recent,
            threat_level,
            is_ignored: false,
            is_tracked: threat_level == ThreatLevel::High,
            note: None,
        };

        if let Some(fix) = sighting.position {
            record.record_fix(fix, false);
        } else if let Some(fallback) = operator_position {
            record.record_fix(fallback, true);
        }

        record
    }

    /// How long the device has been observed
    pub fn dwell(&self) -> Duration {
        self.last_seen_at - self.first_seen_at
    }

    /// Record a position fix, honoring the movement threshold and the ring
    /// buffer cap.
    ///
    /// A fallback fix (operator position substituted for a missing sensor
    /// fix) updates `current_position` for display, but may only enter the
    /// history while the device has never produced a real fix of its own.
    /// Operator movement must not masquerade as device movement.
    pub fn record_fix(&mut self, fix: GeoPoint, is_fallback: bool) {
        self.current_position = Some(fix);

        if is_fallback && self.has_device_fix {
            return;
        }
        if !is_fallback {
            self.has_device_fix = true;
        }

        let moved_enough = match self.position_history.back() {
            None => true,
            Some(last) => geo::distance_meters(last, &fix) > MIN_MOVEMENT_METERS,
        };
        if !moved_enough {
            return;
        }

        if self.position_history.len() >= POSITION_HISTORY_CAP {
            self.position_history.pop_front();
        }
        self.position_history.push_back(fix);
    }

    /// Raise the threat level, never lower it
    pub fn raise_threat(&mut self, level: ThreatLevel) {
        if level.severity_level() > self.threat_level.severity_level() {
            self.threat_level = level;
        }
    }

    /// Flag for active monitoring. Clears the ignore flag.
    pub fn set_tracked(&mut self, tracked: bool) {
        self.is_tracked = tracked;
        if tracked {
            self.is_ignored = false;
        }
    }

    /// Mute the device. Clears the tracked flag.
    pub fn set_ignored(&mut self, ignored: bool) {
        self.is_ignored = ignored;
        if ignored {
            self.is_tracked = false;
        }
    }

    /// Identity transfer: the new address takes over this record.
    ///
    /// Everything behavioral carries over unchanged; only the key rotates
    /// and the supersession is remembered.
    pub fn rename(&mut self, new_id: String) {
        let old_id = std::mem::replace(&mut self.id, new_id);
        self.note = Some(format!("previously seen as {}", old_id));
        if !self.prior_ids.contains(&old_id) {
            self.prior_ids.push(old_id);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
