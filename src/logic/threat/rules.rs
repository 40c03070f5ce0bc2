//! Threat Signature Rules & Thresholds
//!
//! Fixed vendor watchlists and classification thresholds. No classify
//! logic here - only constants and config.

use serde::{Deserialize, Serialize};

// ============================================================================
// VENDOR WATCHLISTS (substring match, case-insensitive)
// ============================================================================

/// Vendors whose presence alone is a high threat: drone manufacturers,
/// penetration-testing hardware, long-range Wi-Fi gear.
pub const HIGH_THREAT_VENDORS: &[&str] = &[
    // Drones
    "dji",
    "parrot",
    "autel robotics",
    "skydio",
    "yuneec",
    // Pentest / attack hardware
    "hak5",
    "pwnie",
    "great scott gadgets",
    "wifi pineapple",
    // Long-range Wi-Fi
    "alfa",
    "mikrotik",
];

/// Vendors of small BLE tracker tags. Suspicious only when the radio is
/// actually Bluetooth LE; the same names on a laptop-class radio are noise.
pub const TRACKER_TAG_VENDORS: &[&str] = &[
    "apple",
    "tile",
    "samsung",
    "chipolo",
    "pebblebee",
];

// ============================================================================
// THRESHOLDS
// ============================================================================

/// A hidden network broadcasting stronger than this is close enough to be
/// suspicious on signature alone (dBm).
pub const HIDDEN_STRONG_SIGNAL_DBM: i32 = -50;

// ============================================================================
// CONFIGURABLE THRESHOLDS (for runtime adjustment)
// ============================================================================

/// Classifier knobs (configurable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureThresholds {
    /// Hidden-network signal cutoff (dBm, stronger than this = suspicious)
    pub hidden_strong_signal_dbm: i32,
}

impl Default for SignatureThresholds {
    fn default() -> Self {
        Self {
            hidden_strong_signal_dbm: HIDDEN_STRONG_SIGNAL_DBM,
        }
    }
}

impl SignatureThresholds {
    /// High sensitivity - flags hidden networks at longer range
    pub fn high_sensitivity() -> Self {
        Self {
            hidden_strong_signal_dbm: -60,
        }
    }

    /// Low sensitivity - only very close hidden networks
    pub fn low_sensitivity() -> Self {
        Self {
            hidden_strong_signal_dbm: -40,
        }
    }
}

/// Case-insensitive substring match against a watchlist
pub fn vendor_in_list(vendor: &str, list: &[&str]) -> bool {
    let lowered = vendor.to_lowercase();
    list.iter().any(|entry| lowered.contains(entry))
}
