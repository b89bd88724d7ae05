//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every key is optional; missing values fall back to the
//! defaults below.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TelemetryError};
use crate::telemetry::snapshot::{
    ALTITUDE_MAX, ALTITUDE_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Simulation timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Fixed RNG seed. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

/// Values of the initial snapshot
#[derive(Debug, Deserialize, Clone)]
pub struct BaselineConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default = "default_altitude")]
    pub altitude: f64,

    #[serde(default = "default_battery_percentage")]
    pub battery_percentage: f64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

/// Dashboard output and warning thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_battery_warning_pct")]
    pub battery_warning_pct: f64,

    #[serde(default = "default_battery_critical_pct")]
    pub battery_critical_pct: f64,

    #[serde(default = "default_signal_warning_dbm")]
    pub signal_warning_dbm: f64,

    #[serde(default = "default_co_warning_ppm")]
    pub co_warning_ppm: f64,

    #[serde(default = "default_no2_warning_ppm")]
    pub no2_warning_ppm: f64,

    #[serde(default = "default_so2_warning_ppm")]
    pub so2_warning_ppm: f64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_interval_ms() -> u64 { 1000 }
fn default_autostart() -> bool { true }

fn default_latitude() -> f64 { 37.7749 }
fn default_longitude() -> f64 { -122.4194 }
fn default_altitude() -> f64 { 100.0 }
fn default_battery_percentage() -> f64 { 100.0 }
fn default_temperature() -> f64 { 22.0 }

fn default_format() -> String { "text".to_string() }
fn default_battery_warning_pct() -> f64 { 30.0 }
fn default_battery_critical_pct() -> f64 { 15.0 }
fn default_signal_warning_dbm() -> f64 { -90.0 }
fn default_co_warning_ppm() -> f64 { 35.0 }
fn default_no2_warning_ppm() -> f64 { 1.0 }
fn default_so2_warning_ppm() -> f64 { 0.5 }

fn default_log_level() -> String { "info".to_string() }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            seed: None,
            autostart: default_autostart(),
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            altitude: default_altitude(),
            battery_percentage: default_battery_percentage(),
            temperature: default_temperature(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            battery_warning_pct: default_battery_warning_pct(),
            battery_critical_pct: default_battery_critical_pct(),
            signal_warning_dbm: default_signal_warning_dbm(),
            co_warning_ppm: default_co_warning_ppm(),
            no2_warning_ppm: default_no2_warning_ppm(),
            so2_warning_ppm: default_so2_warning_ppm(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl SimulationConfig {
    /// Tick period as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use uav_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Simulation timing
        if self.simulation.interval_ms < 10 || self.simulation.interval_ms > 60000 {
            return Err(invalid("interval_ms must be between 10 and 60000"));
        }

        // Baseline must lie inside the generator's physical bounds
        let baseline = &self.baseline;
        for (name, value) in [
            ("latitude", baseline.latitude),
            ("longitude", baseline.longitude),
            ("altitude", baseline.altitude),
            ("battery_percentage", baseline.battery_percentage),
            ("temperature", baseline.temperature),
        ] {
            if !value.is_finite() {
                return Err(invalid(format!("{} must be a finite number", name)));
            }
        }

        if !(-90.0..=90.0).contains(&baseline.latitude) {
            return Err(invalid("latitude must be between -90 and 90"));
        }

        if !(-180.0..=180.0).contains(&baseline.longitude) {
            return Err(invalid("longitude must be between -180 and 180"));
        }

        if !(ALTITUDE_MIN..=ALTITUDE_MAX).contains(&baseline.altitude) {
            return Err(invalid(format!(
                "altitude must be between {} and {}",
                ALTITUDE_MIN, ALTITUDE_MAX
            )));
        }

        if !(0.0..=100.0).contains(&baseline.battery_percentage) {
            return Err(invalid("battery_percentage must be between 0 and 100"));
        }

        if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&baseline.temperature) {
            return Err(invalid(format!(
                "temperature must be between {} and {}",
                TEMPERATURE_MIN, TEMPERATURE_MAX
            )));
        }

        // Dashboard output
        if !["text", "jsonl"].contains(&self.dashboard.format.as_str()) {
            return Err(invalid("dashboard format must be one of: text, jsonl"));
        }

        let dashboard = &self.dashboard;
        if !(0.0..=100.0).contains(&dashboard.battery_warning_pct)
            || !(0.0..=100.0).contains(&dashboard.battery_critical_pct)
        {
            return Err(invalid("battery thresholds must be between 0 and 100"));
        }

        if dashboard.battery_critical_pct >= dashboard.battery_warning_pct {
            return Err(invalid("battery_critical_pct must be less than battery_warning_pct"));
        }

        if !dashboard.signal_warning_dbm.is_finite() || dashboard.signal_warning_dbm > 0.0 {
            return Err(invalid("signal_warning_dbm must be a negative dBm value"));
        }

        for (name, value) in [
            ("co_warning_ppm", dashboard.co_warning_ppm),
            ("no2_warning_ppm", dashboard.no2_warning_ppm),
            ("so2_warning_ppm", dashboard.so2_warning_ppm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be greater than 0", name)));
            }
        }

        // Logging
        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.logging.level.to_lowercase().as_str())
        {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}
