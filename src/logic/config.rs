//! Engine Configuration
//!
//! One bundle of every tunable threshold, serializable so collaborators
//! can persist or ship operator presets. Defaults come from each module's
//! constants.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::escalation::EscalationThresholds;
use crate::logic::identity::correlator::CorrelationThresholds;
use crate::logic::proximity::ProximityThresholds;
use crate::logic::threat::rules::SignatureThresholds;

/// Poll loop cadence (used by the ingest driver, not the core passes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub max_interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: constants::DEFAULT_POLL_INTERVAL_SECS,
            max_interval_secs: constants::MAX_POLL_INTERVAL_SECS,
        }
    }
}

impl PollConfig {
    /// Defaults overridden from the environment where present
    pub fn from_env() -> Self {
        Self {
            interval_secs: constants::get_poll_interval_secs(),
            max_interval_secs: constants::get_max_poll_interval_secs(),
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub signature: SignatureThresholds,
    pub correlation: CorrelationThresholds,
    pub escalation: EscalationThresholds,
    pub proximity: ProximityThresholds,
    pub poll: PollConfig,
}

impl EngineConfig {
    /// More alerts, shorter fuses
    pub fn high_sensitivity() -> Self {
        Self {
            signature: SignatureThresholds::high_sensitivity(),
            escalation: EscalationThresholds::high_sensitivity(),
            ..Default::default()
        }
    }

    /// Fewer alerts, longer fuses
    pub fn low_sensitivity() -> Self {
        Self {
            signature: SignatureThresholds::low_sensitivity(),
            escalation: EscalationThresholds::low_sensitivity(),
            ..Default::default()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EngineConfig::high_sensitivity();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.escalation.follow_displacement_meters,
            config.escalation.follow_displacement_meters
        );
    }

    #[test]
    fn test_defaults_match_module_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.poll.interval_secs, 2);
        assert_eq!(config.poll.max_interval_secs, 8);
        assert_eq!(config.correlation.match_threshold, 65);
        assert_eq!(config.proximity.proximity_signal_dbm, -65);
    }
}
