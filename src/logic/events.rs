//! Alert Event Bus
//!
//! Lets any stage of the batch pipeline publish alert events to external
//! listeners (rendering, notification collaborators) without knowing who
//! is subscribed. Dropping every event when nobody listens is fine; the
//! record set is the authoritative output, events are a convenience push.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::logic::threat::ThreatLevel;

/// Buffered events per subscriber before lagging ones lose the oldest
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A proximity alert arming for one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub event_id: Uuid,
    /// Canonical device identifier the alert is about
    pub device_id: String,
    pub threat_level: ThreatLevel,
    pub signal_dbm: i32,
    pub at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(device_id: String, threat_level: ThreatLevel, signal_dbm: i32, at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            device_id,
            threat_level,
            signal_dbm,
            at,
        }
    }
}

/// Broadcast fan-out for alert events
pub struct AlertBus {
    sender: broadcast::Sender<AlertEvent>,
}

impl AlertBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the alert stream
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.sender.subscribe()
    }

    /// Publish one event to all listeners
    pub fn emit(&self, event: AlertEvent) {
        log::warn!(
            "[PROXIMITY ALERT] {} ({} dBm, {})",
            event.device_id,
            event.signal_dbm,
            event.threat_level
        );
        if self.sender.send(event).is_err() {
            // No subscribers; the alert still lives on the record set
            log::debug!("alert emitted with no listeners");
        }
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
