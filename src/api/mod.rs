//! API Module - External Command Surface
//!
//! What rendering, export, and storage collaborators call. Thin wrappers
//! over the engine plus display-friendly views; no logic of its own.

pub mod commands;
