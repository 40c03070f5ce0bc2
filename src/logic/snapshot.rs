//! Record Snapshot Persistence
//!
//! Serialization boundary for the external storage collaborator. The core
//! hands out a versioned snapshot of the full record set and accepts one
//! back; the key-value store mechanics (files, sqlite, whatever) live
//! outside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::device::DeviceRecord;

/// Bump when the record layout changes incompatibly
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// JSON (de)serialization failure
    ParseError(String),
    /// Snapshot written by an incompatible engine version
    VersionMismatch { found: u32 },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseError(e) => write!(f, "Parse error: {}", e),
            Self::VersionMismatch { found } => {
                write!(f, "Snapshot version {} not supported", found)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Full record-set snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub devices: Vec<DeviceRecord>,
}

impl RecordSnapshot {
    pub fn new(devices: Vec<DeviceRecord>, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            devices,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::ParseError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: RecordSnapshot =
            serde_json::from_str(json).map_err(|e| SnapshotError::ParseError(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}

// ============================================================================
// TESTS
// ============================================================================
