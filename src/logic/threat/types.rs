//! Threat Types
//!
//! Data structures only - no classification logic.

use serde::{Deserialize, Serialize};

// ============================================================================
// THREAT LEVEL
// ============================================================================

/// Threat assessment for one device.
///
/// Monotonic upward over a device's lifetime except by explicit operator
/// ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    /// Nothing known either way
    Unknown,
    /// Positively assessed as harmless
    Safe,
    /// Warrants monitoring
    Suspicious,
    /// Known surveillance signature or confirmed following behavior
    High,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Unknown => "unknown",
            ThreatLevel::Safe => "safe",
            ThreatLevel::Suspicious => "suspicious",
            ThreatLevel::High => "high",
        }
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            ThreatLevel::Unknown => 0,
            ThreatLevel::Safe => 1,
            ThreatLevel::Suspicious => 2,
            ThreatLevel::High => 3,
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for ThreatLevel {
    fn default() -> Self {
        ThreatLevel::Unknown
    }
}
