//! Threat Module - Signature Classification
//!
//! Static-signature threat assessment. The classifier here looks only at
//! what a device *is* (vendor, name, class, signal); promotion based on
//! what a device *does* over time belongs to the escalation engine.

pub mod classifier;
pub mod rules;
pub mod types;

pub use classifier::classify;
pub use types::ThreatLevel;
