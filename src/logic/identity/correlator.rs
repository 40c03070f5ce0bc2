//! Identity Correlator
//!
//! For each address appearing for the first time, scores existing records
//! as possible prior identities of the same physical device. Signals are
//! additive points, not probabilities; the threshold is tuned so that one
//! weak signal alone can never cause a merge. A missed merge costs one
//! duplicate record; a wrong merge corrupts two devices' histories, so
//! ambiguity always resolves to "new device".

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::device::{DeviceRecord, RawSighting};
use crate::logic::vendor;

// ============================================================================
// SCORING CONSTANTS
// ============================================================================

/// Candidate must have been seen within this window (seconds)
pub const RECENCY_WINDOW_SECS: i64 = 5 * 60;

/// Signal similarity: |Δ signal| below this many dBm
pub const SIGNAL_SIMILARITY_DBM: i32 = 10;
pub const SIGNAL_SIMILARITY_POINTS: u32 = 35;

/// Probed-network overlap
pub const PROBE_OVERLAP_STRONG_POINTS: u32 = 50; // 2+ shared networks
pub const PROBE_OVERLAP_WEAK_POINTS: u32 = 25; // exactly 1 shared network

/// Both vendors resolved and equal
pub const VENDOR_MATCH_POINTS: u32 = 15;

/// Minimum total score to accept a match
pub const MATCH_THRESHOLD: u32 = 65;

// ============================================================================
// CONFIGURABLE THRESHOLDS (for runtime adjustment)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationThresholds {
    pub recency_window_secs: i64,
    pub signal_similarity_dbm: i32,
    pub match_threshold: u32,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            recency_window_secs: RECENCY_WINDOW_SECS,
            signal_similarity_dbm: SIGNAL_SIMILARITY_DBM,
            match_threshold: MATCH_THRESHOLD,
        }
    }
}

// ============================================================================
// CORRELATION
// ============================================================================

/// Decide whether `sighting` continues an existing record under a rotated
/// address. Returns the matched record's current id.
///
/// `vendor` is the sighting's resolved vendor (resolution happens before
/// correlation so both sides compare like with like). The pool is the
/// immutable pre-batch snapshot; the caller owns all mutation.
pub fn correlate(
    sighting: &RawSighting,
    vendor: &str,
    pool: &HashMap<String, DeviceRecord>,
    now: DateTime<Utc>,
) -> Option<String> {
    correlate_with_thresholds(sighting, vendor, pool, now, &CorrelationThresholds::default())
}

/// Correlation with custom thresholds
pub fn correlate_with_thresholds(
    sighting: &RawSighting,
    vendor: &str,
    pool: &HashMap<String, DeviceRecord>,
    now: DateTime<Utc>,
    thresholds: &CorrelationThresholds,
) -> Option<String> {
    // Entropy guard: a sighting with a thin fingerprint (fewer than two
    // probed networks and no resolved vendor) can match half the room.
    // Always a new identity.
    if sighting.probed_networks.len() < 2 && !vendor::is_resolved(vendor) {
        return None;
    }

    let mut best: Option<(&DeviceRecord, u32)> = None;

    for candidate in pool.values() {
        if !is_eligible(sighting, candidate, now, thresholds) {
            continue;
        }

        let score = score_candidate(sighting, vendor, candidate, thresholds);
        if score < thresholds.match_threshold {
            continue;
        }

        best = match best {
            None => Some((candidate, score)),
            Some((held, held_score)) => {
                // Ties broken by most recent sighting
                if score > held_score
                    || (score == held_score && candidate.last_seen_at > held.last_seen_at)
                {
                    Some((candidate, score))
                } else {
                    Some((held, held_score))
                }
            }
        };
    }

    best.map(|(record, score)| {
        log::debug!(
            "correlated {} -> {} (score {})",
            sighting.id,
            record.id,
            score
        );
        record.id.clone()
    })
}

/// Eligibility pre-filter: same-class record seen recently, not literally
/// the same address
fn is_eligible(
    sighting: &RawSighting,
    candidate: &DeviceRecord,
    now: DateTime<Utc>,
    thresholds: &CorrelationThresholds,
) -> bool {
    if candidate.id == sighting.id {
        return false;
    }
    if candidate.device_class != sighting.device_class {
        return false;
    }
    let age = (now - candidate.last_seen_at).num_seconds();
    age <= thresholds.recency_window_secs
}

/// Additive point score for one candidate
pub fn score_candidate(
    sighting: &RawSighting,
    vendor: &str,
    candidate: &DeviceRecord,
    thresholds: &CorrelationThresholds,
) -> u32 {
    let mut score = 0;

    if (sighting.signal_dbm - candidate.signal_dbm).abs() < thresholds.signal_similarity_dbm {
        score += SIGNAL_SIMILARITY_POINTS;
    }

    let overlap = sighting
        .probed_networks
        .iter()
        .filter(|n| candidate.probed_networks.contains(n.as_str()))
        .count();
    score += match overlap {
        0 => 0,
        1 => PROBE_OVERLAP_WEAK_POINTS,
        _ => PROBE_OVERLAP_STRONG_POINTS,
    };

    if vendor::is_resolved(vendor) && vendor::is_resolved(&candidate.vendor) && vendor == candidate.vendor
    {
        score += VENDOR_MATCH_POINTS;
    }

    score
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::device::{DeviceClass, VENDOR_UNKNOWN};
    use crate::logic::threat::ThreatLevel;
    use chrono::Duration;

    fn sighting(id: &str, signal: i32, probes: &[&str], class: DeviceClass) -> RawSighting {
        RawSighting {
            id: id.to_string(),
            vendor: None,
            display_name: None,
            signal_dbm: signal,
            device_class: class,
            probed_networks: probes.iter().map(|s| s.to_string()).collect(),
            position: None,
        }
    }

    fn record(
        id: &str,
        signal: i32,
        probes: &[&str],
        vendor: &str,
        class: DeviceClass,
        last_seen: DateTime<Utc>,
    ) -> DeviceRecord {
        let s = sighting(id, signal, probes, class);
        let mut r = DeviceRecord::from_sighting(
            &s,
            vendor.to_string(),
            ThreatLevel::Unknown,
            None,
            last_seen,
        );
        r.last_seen_at = last_seen;
        r
    }

    fn pool(records: Vec<DeviceRecord>) -> HashMap<String, DeviceRecord> {
        records.into_iter().map(|r| (r.id.clone(), r)).collect()
    }

    #[test]
    fn test_strong_fingerprint_merges() {
        let now = Utc::now();
        // Same vendor (+15), signal within 5 dBm (+35), 2 shared probes (+50)
        let pool = pool(vec![record(
            "AA:AA:AA:00:00:01",
            -60,
            &["HomeNet", "CorpWifi"],
            "Acme",
            DeviceClass::ClientStation,
            now - Duration::seconds(30),
        )]);
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -65,
            &["HomeNet", "CorpWifi"],
            DeviceClass::ClientStation,
        );
        let matched = correlate(&s, "Acme", &pool, now);
        assert_eq!(matched.as_deref(), Some("AA:AA:AA:00:00:01"));
    }

    #[test]
    fn test_vendor_alone_does_not_merge() {
        let now = Utc::now();
        let pool = pool(vec![record(
            "AA:AA:AA:00:00:01",
            -60,
            &["HomeNet"],
            "Acme",
            DeviceClass::ClientStation,
            now - Duration::seconds(30),
        )]);
        // Signal far off, no probe overlap: only +15 from vendor
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -90,
            &["OtherNet", "ThirdNet"],
            DeviceClass::ClientStation,
        );
        assert!(correlate(&s, "Acme", &pool, now).is_none());
    }

    #[test]
    fn test_signal_plus_single_probe_is_below_threshold() {
        let now = Utc::now();
        // +35 signal, +25 single probe = 60 < 65
        let pool = pool(vec![record(
            "AA:AA:AA:00:00:01",
            -60,
            &["HomeNet"],
            VENDOR_UNKNOWN,
            DeviceClass::ClientStation,
            now - Duration::seconds(30),
        )]);
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -62,
            &["HomeNet", "CorpWifi"],
            DeviceClass::ClientStation,
        );
        assert!(correlate(&s, VENDOR_UNKNOWN, &pool, now).is_none());
    }

    #[test]
    fn test_stale_candidate_is_ineligible() {
        let now = Utc::now();
        let pool = pool(vec![record(
            "AA:AA:AA:00:00:01",
            -60,
            &["HomeNet", "CorpWifi"],
            "Acme",
            DeviceClass::ClientStation,
            now - Duration::minutes(6),
        )]);
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -60,
            &["HomeNet", "CorpWifi"],
            DeviceClass::ClientStation,
        );
        assert!(correlate(&s, "Acme", &pool, now).is_none());
    }

    #[test]
    fn test_class_mismatch_is_ineligible() {
        let now = Utc::now();
        let pool = pool(vec![record(
            "AA:AA:AA:00:00:01",
            -60,
            &["HomeNet", "CorpWifi"],
            "Acme",
            DeviceClass::BluetoothLe,
            now - Duration::seconds(30),
        )]);
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -60,
            &["HomeNet", "CorpWifi"],
            DeviceClass::ClientStation,
        );
        assert!(correlate(&s, "Acme", &pool, now).is_none());
    }

    #[test]
    fn test_thin_fingerprint_never_matches() {
        let now = Utc::now();
        // Candidate would score 35 (signal) + 25 (probe) + 0... make it a
        // perfect twin; the entropy guard must still refuse.
        let pool = pool(vec![record(
            "AA:AA:AA:00:00:01",
            -60,
            &["HomeNet"],
            VENDOR_UNKNOWN,
            DeviceClass::ClientStation,
            now - Duration::seconds(5),
        )]);
        let s = sighting("BB:BB:BB:00:00:02", -60, &["HomeNet"], DeviceClass::ClientStation);
        assert!(correlate(&s, VENDOR_UNKNOWN, &pool, now).is_none());
    }

    #[test]
    fn test_tie_broken_by_most_recent() {
        let now = Utc::now();
        let pool = pool(vec![
            record(
                "AA:AA:AA:00:00:01",
                -60,
                &["HomeNet", "CorpWifi"],
                "Acme",
                DeviceClass::ClientStation,
                now - Duration::seconds(120),
            ),
            record(
                "CC:CC:CC:00:00:03",
                -60,
                &["HomeNet", "CorpWifi"],
                "Acme",
                DeviceClass::ClientStation,
                now - Duration::seconds(10),
            ),
        ]);
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -60,
            &["HomeNet", "CorpWifi"],
            DeviceClass::ClientStation,
        );
        let matched = correlate(&s, "Acme", &pool, now);
        assert_eq!(matched.as_deref(), Some("CC:CC:CC:00:00:03"));
    }

    #[test]
    fn test_higher_score_beats_recency() {
        let now = Utc::now();
        let pool = pool(vec![
            // Signal + two shared probes: 85
            record(
                "AA:AA:AA:00:00:01",
                -60,
                &["HomeNet", "CorpWifi"],
                VENDOR_UNKNOWN,
                DeviceClass::ClientStation,
                now - Duration::seconds(200),
            ),
            // Same, plus the vendor bonus: 100
            record(
                "CC:CC:CC:00:00:03",
                -62,
                &["HomeNet", "CorpWifi"],
                "Acme",
                DeviceClass::ClientStation,
                now - Duration::seconds(10),
            ),
        ]);
        let s = sighting(
            "BB:BB:BB:00:00:02",
            -61,
            &["HomeNet", "CorpWifi"],
            DeviceClass::ClientStation,
        );
        // Candidate CC scores +15 vendor on top, wins despite both clearing
        // the threshold
        let matched = correlate(&s, "Acme", &pool, now);
        assert_eq!(matched.as_deref(), Some("CC:CC:CC:00:00:03"));
    }
}
