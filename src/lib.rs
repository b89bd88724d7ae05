//! # UAV Telemetry Library
//!
//! Simulated UAV telemetry source with a terminal dashboard.
//!
//! This library provides a [`telemetry::source::TelemetrySource`] that
//! publishes synthetic battery, flight, position, link and gas-sensor
//! readings on a fixed interval, and a [`dashboard`] that renders them.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod telemetry;
