//! Device State Store
//!
//! The authoritative identifier -> record map and the batch application
//! logic. Batches are applied in two passes over one immutable read
//! snapshot: correlation decisions first, mutations second. A record can
//! therefore never match itself, and results do not depend on map
//! iteration order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::logic::device::{DeviceRecord, RawSighting, SightingBatch};
use crate::logic::geo::GeoPoint;
use crate::logic::identity::correlator::{self, CorrelationThresholds};
use crate::logic::threat::{classifier, rules::SignatureThresholds};
use crate::logic::vendor;

// ============================================================================
// BATCH OUTCOME
// ============================================================================

/// What one batch did to the store
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Canonical ids touched this batch (post-merge), in application order
    pub updated_ids: Vec<String>,
    /// Identity transfers applied: (superseded id, new id)
    pub merges: Vec<(String, String)>,
    pub created: u64,
    pub dropped: u64,
}

/// Per-sighting decision computed in the read pass
enum Decision {
    /// Identifier already tracked; plain update
    Existing,
    /// New identifier continues the record currently keyed by `from`
    Merge { from: String },
    /// Genuinely new identity
    New,
}

// ============================================================================
// STORE
// ============================================================================

/// Authoritative mapping of identifier -> device record
#[derive(Debug, Default)]
pub struct DeviceStore {
    records: HashMap<String, DeviceRecord>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&DeviceRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DeviceRecord> {
        self.records.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &HashMap<String, DeviceRecord> {
        &self.records
    }

    /// Replace the whole record set (snapshot restore)
    pub fn replace_all(&mut self, records: Vec<DeviceRecord>) {
        self.records = records.into_iter().map(|r| (r.id.clone(), r)).collect();
    }

    /// Drop every record (external purge)
    pub fn clear(&mut self) {
        self.records.clear();
    }

    // ========================================================================
    // BATCH APPLICATION
    // ========================================================================

    /// Apply one ingestion batch.
    ///
    /// Every record is processed against the batch's single operator
    /// snapshot; malformed sightings are dropped with a diagnostic and
    /// never abort the rest of the batch.
    pub fn apply_batch(
        &mut self,
        batch: &SightingBatch,
        now: DateTime<Utc>,
        correlation: &CorrelationThresholds,
        signature: &SignatureThresholds,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let operator_position = batch.operator_position.and_then(GeoPoint::validated);

        // Sanitize first; rejects are logged and skipped
        let mut sightings: Vec<(RawSighting, String)> = Vec::with_capacity(batch.sightings.len());
        for raw in &batch.sightings {
            match raw.clone().sanitized() {
                Ok(s) => {
                    let resolved = vendor::resolve(&s.id, s.vendor.as_deref());
                    sightings.push((s, resolved));
                }
                Err(e) => {
                    log::warn!("dropping sighting: {}", e);
                    outcome.dropped += 1;
                }
            }
        }

        // Pass 1: correlation decisions against the pre-batch snapshot.
        // A candidate consumed by an earlier merge in the same batch is
        // not offered again; the later sighting becomes a new record
        // (false negatives are the cheap direction).
        let mut consumed: HashSet<String> = HashSet::new();
        let mut decisions: Vec<Decision> = Vec::with_capacity(sightings.len());
        for (sighting, resolved_vendor) in &sightings {
            let decision = if self.records.contains_key(&sighting.id) {
                Decision::Existing
            } else {
                match correlator::correlate_with_thresholds(
                    sighting,
                    resolved_vendor,
                    &self.records,
                    now,
                    correlation,
                ) {
                    Some(from) if !consumed.contains(&from) => {
                        consumed.insert(from.clone());
                        Decision::Merge { from }
                    }
                    _ => Decision::New,
                }
            };
            decisions.push(decision);
        }

        // Pass 2: mutations
        for ((sighting, resolved_vendor), decision) in sightings.iter().zip(decisions) {
            match decision {
                Decision::Existing => {
                    self.update_existing(sighting, resolved_vendor, operator_position, now);
                }
                Decision::Merge { from } => {
                    if let Some(mut record) = self.records.remove(&from) {
                        record.rename(sighting.id.clone());
                        self.records.insert(record.id.clone(), record);
                        self.update_existing(sighting, resolved_vendor, operator_position, now);
                        log::info!("identity transfer: {} superseded by {}", from, sighting.id);
                        outcome.merges.push((from, sighting.id.clone()));
                    } else {
                        // Candidate vanished mid-batch (renamed by an earlier
                        // sighting); treat as new
                        self.create_new(sighting, resolved_vendor, operator_position, now, signature);
                        outcome.created += 1;
                    }
                }
                Decision::New => {
                    // Duplicate ids within one batch collapse to an update
                    if self.records.contains_key(&sighting.id) {
                        self.update_existing(sighting, resolved_vendor, operator_position, now);
                    } else {
                        self.create_new(sighting, resolved_vendor, operator_position, now, signature);
                        outcome.created += 1;
                    }
                }
            }
            if !outcome.updated_ids.iter().any(|id| id == &sighting.id) {
                outcome.updated_ids.push(sighting.id.clone());
            }
        }

        outcome
    }

    fn update_existing(
        &mut self,
        sighting: &RawSighting,
        resolved_vendor: &str,
        operator_position: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) {
        let record = match self.records.get_mut(&sighting.id) {
            Some(r) => r,
            None => return,
        };

        record.signal_dbm = sighting.signal_dbm;
        record.last_seen_at = now;
        record
            .probed_networks
            .extend(sighting.probed_networks.iter().cloned());

        // A name or vendor can surface after the first sighting; once known
        // they are only ever refreshed, never cleared
        if sighting.display_name.is_some() {
            record.display_name = sighting.display_name.clone();
        }
        if vendor::is_resolved(resolved_vendor) && !vendor::is_resolved(&record.vendor) {
            record.vendor = resolved_vendor.to_string();
        }

        if let Some(fix) = sighting.position {
            record.record_fix(fix, false);
        } else if let Some(fallback) = operator_position {
            record.record_fix(fallback, true);
        }
    }

    fn create_new(
        &mut self,
        sighting: &RawSighting,
        resolved_vendor: &str,
        operator_position: Option<GeoPoint>,
        now: DateTime<Utc>,
        signature: &SignatureThresholds,
    ) {
        let threat = classifier::classify_with_thresholds(
            resolved_vendor,
            sighting.display_name.as_deref(),
            sighting.signal_dbm,
            sighting.device_class,
            signature,
        );
        let record = DeviceRecord::from_sighting(
            sighting,
            resolved_vendor.to_string(),
            threat,
            operator_position,
            now,
        );
        log::debug!(
            "new device {} ({}, {}, {} dBm)",
            record.id,
            record.vendor,
            record.device_class,
            record.signal_dbm
        );
        self.records.insert(record.id.clone(), record);
    }
}

// ============================================================================
// TESTS
// ============================================================================
