//! # Telemetry Module
//!
//! Simulated UAV telemetry.
//!
//! This module handles:
//! - The snapshot value type and its physical bounds
//! - Generating synthetic snapshots with bounded random drift
//! - Publishing snapshots on a fixed interval with start/stop control
//! - The read-side trait consumers depend on

pub mod feed;
pub mod generator;
pub mod snapshot;
pub mod source;
