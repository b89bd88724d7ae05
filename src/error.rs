//! # Error Types
//!
//! Custom error types for UAV Telemetry using `thiserror`.
//!
//! The simulation itself cannot fail; these cover configuration loading and
//! dashboard output.

use thiserror::Error;

/// Main error type for UAV Telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration errors (parsing and validation)
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for UAV Telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;
