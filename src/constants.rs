//! Central Configuration Constants
//!
//! Single source of truth for engine defaults. To retune the poll cadence
//! or alert thresholds, only edit this file.

/// Default ingestion poll interval (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Maximum poll interval after repeated ingestion failures (seconds)
pub const MAX_POLL_INTERVAL_SECS: u64 = 8;

/// Position history ring buffer capacity per device
pub const POSITION_HISTORY_CAP: usize = 100;

/// Minimum movement before a new fix is recorded (meters)
pub const MIN_MOVEMENT_METERS: f64 = 10.0;

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "tailwatch-core";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get poll interval from environment or use default
pub fn get_poll_interval_secs() -> u64 {
    std::env::var("TAILWATCH_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
}

/// Get max backoff interval from environment or use default
pub fn get_max_poll_interval_secs() -> u64 {
    std::env::var("TAILWATCH_MAX_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(MAX_POLL_INTERVAL_SECS)
}
