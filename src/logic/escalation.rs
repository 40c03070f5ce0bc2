//! Escalation Engine
//!
//! Behavioral promotion: derives persistence and recency from dwell time
//! and raises the threat level when a device has both persisted and moved
//! with the operator. The only component allowed to promote on behavior;
//! static signatures are the classifier's territory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::device::{DeviceRecord, RecencyBucket};
use crate::logic::geo::{self, GeoPoint};
use crate::logic::threat::ThreatLevel;

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Dwell time at which persistence saturates (minutes)
pub const PERSISTENCE_SATURATION_MINS: f32 = 20.0;

/// Persistence score required before follow-detection can fire
pub const FOLLOW_PERSISTENCE_MIN: f32 = 0.75;

/// Operator displacement required before follow-detection can fire (meters)
pub const FOLLOW_DISPLACEMENT_METERS: f64 = 500.0;

/// Recency bucket boundaries (minutes since first seen)
pub const RECENT_MAX_MINS: i64 = 5;
pub const MEDIUM_MAX_MINS: i64 = 10;
pub const OLD_MAX_MINS: i64 = 15;

// ============================================================================
// CONFIGURABLE THRESHOLDS (for runtime adjustment)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationThresholds {
    pub persistence_saturation_mins: f32,
    pub follow_persistence_min: f32,
    pub follow_displacement_meters: f64,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            persistence_saturation_mins: PERSISTENCE_SATURATION_MINS,
            follow_persistence_min: FOLLOW_PERSISTENCE_MIN,
            follow_displacement_meters: FOLLOW_DISPLACEMENT_METERS,
        }
    }
}

impl EscalationThresholds {
    /// High sensitivity - flags followers after shorter dwell and distance
    pub fn high_sensitivity() -> Self {
        Self {
            follow_persistence_min: 0.5,
            follow_displacement_meters: 250.0,
            ..Default::default()
        }
    }

    /// Low sensitivity - only long, far co-movement
    pub fn low_sensitivity() -> Self {
        Self {
            follow_persistence_min: 0.9,
            follow_displacement_meters: 1_000.0,
            ..Default::default()
        }
    }
}

// ============================================================================
// DERIVED MEASURES
// ============================================================================

/// Normalized dwell measure: 0.0 at first sighting, 1.0 at 20 minutes
pub fn persistence_score(record: &DeviceRecord, thresholds: &EscalationThresholds) -> f32 {
    let dwell_mins = record.dwell().num_seconds() as f32 / 60.0;
    (dwell_mins / thresholds.persistence_saturation_mins).min(1.0)
}

/// Age bucket from time since first observation
pub fn recency_bucket(record: &DeviceRecord, now: DateTime<Utc>) -> RecencyBucket {
    let age_mins = (now - record.first_seen_at).num_minutes();
    if age_mins < RECENT_MAX_MINS {
        RecencyBucket::Recent
    } else if age_mins < MEDIUM_MAX_MINS {
        RecencyBucket::Medium
    } else if age_mins < OLD_MAX_MINS {
        RecencyBucket::Old
    } else {
        RecencyBucket::Oldest
    }
}

// ============================================================================
// ESCALATION PASS
// ============================================================================

/// Run the per-batch escalation pass over one record.
///
/// Skipped entirely for ignored devices and for devices already High.
/// The follow rule requires BOTH sustained presence and large operator
/// displacement: a stationary neighbor's router never escalates however
/// long it persists, and a device glimpsed far from home never escalates
/// without dwell.
pub fn run(
    record: &mut DeviceRecord,
    operator_position: Option<GeoPoint>,
    now: DateTime<Utc>,
    thresholds: &EscalationThresholds,
) {
    if record.is_ignored || record.threat_level == ThreatLevel::High {
        return;
    }

    record.persistence_score = persistence_score(record, thresholds);
    record.recency_bucket = recency_bucket(record, now);

    let displacement = match (record.first_seen_operator_position, operator_position) {
        (Some(origin), Some(current)) => geo::distance_meters(&origin, &current),
        _ => return,
    };

    if record.persistence_score > thresholds.follow_persistence_min
        && displacement > thresholds.follow_displacement_meters
    {
        record.raise_threat(ThreatLevel::Suspicious);
        record.set_tracked(true);
        record.note = Some(format!(
            "persisted {:.0} min across {:.0} m of operator movement",
            record.dwell().num_seconds() as f64 / 60.0,
            displacement
        ));
        log::info!(
            "escalated {}: followed operator for {:.0} m",
            record.id,
            displacement
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::device::{DeviceClass, RawSighting, VENDOR_UNKNOWN};
    use chrono::Duration;

    fn record_with_dwell(dwell_mins: i64, origin: Option<GeoPoint>) -> (DeviceRecord, DateTime<Utc>) {
        let now = Utc::now();
        let s = RawSighting {
            id: "AA:BB:CC:DD:EE:FF".to_string(),
            vendor: None,
            display_name: Some("net".to_string()),
            signal_dbm: -70,
            device_class: DeviceClass::ClientStation,
            probed_networks: vec![],
            position: None,
        };
        let mut r = DeviceRecord::from_sighting(
            &s,
            VENDOR_UNKNOWN.to_string(),
            ThreatLevel::Unknown,
            origin,
            now - Duration::minutes(dwell_mins),
        );
        r.last_seen_at = now;
        (r, now)
    }

    #[test]
    fn test_persistence_score_scaling() {
        let t = EscalationThresholds::default();
        let (r, _) = record_with_dwell(10, None);
        assert!((persistence_score(&r, &t) - 0.5).abs() < 1e-6);
        let (r, _) = record_with_dwell(20, None);
        assert!((persistence_score(&r, &t) - 1.0).abs() < 1e-6);
        // Capped at 1.0
        let (r, _) = record_with_dwell(40, None);
        assert_eq!(persistence_score(&r, &t), 1.0);
    }

    #[test]
    fn test_recency_bucket_boundaries() {
        let now = Utc::now();
        let (mut r, _) = record_with_dwell(0, None);

        r.first_seen_at = now - Duration::seconds(4 * 60 + 59);
        assert_eq!(recency_bucket(&r, now), RecencyBucket::Recent);

        r.first_seen_at = now - Duration::seconds(5 * 60);
        assert_eq!(recency_bucket(&r, now), RecencyBucket::Medium);

        r.first_seen_at = now - Duration::seconds(14 * 60 + 59);
        assert_eq!(recency_bucket(&r, now), RecencyBucket::Old);

        r.first_seen_at = now - Duration::seconds(15 * 60);
        assert_eq!(recency_bucket(&r, now), RecencyBucket::Oldest);
    }

    #[test]
    fn test_follower_escalates() {
        let origin = GeoPoint::new(37.7749, -122.4194);
        // ~1.1 km east
        let current = GeoPoint::new(37.7749, -122.4069);
        let (mut r, now) = record_with_dwell(18, Some(origin));

        run(&mut r, Some(current), now, &EscalationThresholds::default());

        assert_eq!(r.threat_level, ThreatLevel::Suspicious);
        assert!(r.is_tracked);
        assert!(r.note.as_deref().unwrap().contains("m of operator movement"));
    }

    #[test]
    fn test_stationary_neighbor_never_escalates() {
        let origin = GeoPoint::new(37.7749, -122.4194);
        // Operator moved ~100m: long dwell alone must not escalate
        let current = GeoPoint::new(37.7758, -122.4194);
        let (mut r, now) = record_with_dwell(25, Some(origin));

        run(&mut r, Some(current), now, &EscalationThresholds::default());

        assert_eq!(r.threat_level, ThreatLevel::Unknown);
        assert!(!r.is_tracked);
    }

    #[test]
    fn test_short_dwell_never_escalates() {
        let origin = GeoPoint::new(37.7749, -122.4194);
        // ~600m displacement but only 4 minutes of dwell
        let current = GeoPoint::new(37.7803, -122.4194);
        let (mut r, now) = record_with_dwell(4, Some(origin));

        run(&mut r, Some(current), now, &EscalationThresholds::default());

        assert_eq!(r.threat_level, ThreatLevel::Unknown);
        assert!(!r.is_tracked);
    }

    #[test]
    fn test_missing_operator_snapshot_skips_follow_rule() {
        let origin = GeoPoint::new(37.7749, -122.4194);
        let (mut r, now) = record_with_dwell(25, Some(origin));

        run(&mut r, None, now, &EscalationThresholds::default());

        assert_eq!(r.threat_level, ThreatLevel::Unknown);
        // Derived fields still updated before the early return
        assert_eq!(r.persistence_score, 1.0);
    }

    #[test]
    fn test_ignored_device_is_skipped() {
        let origin = GeoPoint::new(37.7749, -122.4194);
        let current = GeoPoint::new(37.7749, -122.4069);
        let (mut r, now) = record_with_dwell(25, Some(origin));
        r.set_ignored(true);

        run(&mut r, Some(current), now, &EscalationThresholds::default());

        assert_eq!(r.threat_level, ThreatLevel::Unknown);
        assert_eq!(r.persistence_score, 0.0, "skipped entirely, nothing derived");
    }

    #[test]
    fn test_high_device_is_left_alone() {
        let origin = GeoPoint::new(37.7749, -122.4194);
        let current = GeoPoint::new(37.7749, -122.4069);
        let (mut r, now) = record_with_dwell(25, Some(origin));
        r.raise_threat(ThreatLevel::High);
        let note_before = r.note.clone();

        run(&mut r, Some(current), now, &EscalationThresholds::default());

        assert_eq!(r.note, note_before);
    }
}
