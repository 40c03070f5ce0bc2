//! Identity Module - Radio Identity Continuity
//!
//! Devices rotate their hardware addresses to resist tracking. This module
//! decides when a newly seen address is really a previously tracked device
//! so the behavioral record survives the rotation.

pub mod correlator;

pub use correlator::{correlate, CorrelationThresholds};
