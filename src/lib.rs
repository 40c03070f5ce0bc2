//! Tailwatch Core - Wireless Counter-Surveillance Engine
//!
//! Maintains a rolling behavioral model of every wireless device sighted
//! around the operator: how long it persists, whether it is physically
//! following, whether its signature matches known surveillance hardware,
//! and whether a new radio identity is really an old device that rotated
//! its address.
//!
//! The crate is pure in-memory state machinery. Ingestion transport,
//! rendering, and storage engines are external collaborators; they feed
//! sighting batches in and read record snapshots out.

pub mod api;
pub mod constants;
pub mod logic;

pub use api::commands;
pub use logic::device::{DeviceClass, DeviceRecord, RawSighting, SightingBatch};
pub use logic::engine::{Engine, EngineError};
pub use logic::events::AlertEvent;
pub use logic::geo::GeoPoint;
pub use logic::threat::ThreatLevel;
