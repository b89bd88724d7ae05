//! # Telemetry Snapshot
//!
//! One immutable, complete set of telemetry values at a point in time.
//!
//! Snapshots are never mutated after publication: every tick builds a new
//! one and replaces the current one as a unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BaselineConfig;

/// Battery percentage range.
pub const BATTERY_MIN: f64 = 0.0;
/// Battery percentage range.
pub const BATTERY_MAX: f64 = 100.0;

/// Pack voltage at 0% charge (3S LiPo, 3.5 V/cell).
pub const VOLTAGE_MIN: f64 = 10.5;
/// Pack voltage at 100% charge (3S LiPo, 4.2 V/cell).
pub const VOLTAGE_MAX: f64 = 12.6;

/// Current draw range in amperes.
pub const CURRENT_MIN: f64 = 0.0;
/// Current draw range in amperes.
pub const CURRENT_MAX: f64 = 40.0;

/// Altitude range in meters.
pub const ALTITUDE_MIN: f64 = 0.0;
/// Altitude range in meters.
pub const ALTITUDE_MAX: f64 = 500.0;

/// Ground speed range in m/s.
pub const SPEED_MIN: f64 = 0.0;
/// Ground speed range in m/s.
pub const SPEED_MAX: f64 = 30.0;

/// Link RSSI range in dBm.
pub const SIGNAL_MIN: f64 = -120.0;
/// Link RSSI range in dBm.
pub const SIGNAL_MAX: f64 = -30.0;

/// Air temperature range in °C.
pub const TEMPERATURE_MIN: f64 = -40.0;
/// Air temperature range in °C.
pub const TEMPERATURE_MAX: f64 = 85.0;

/// Carbon monoxide sensor range in PPM.
pub const CO_MAX: f64 = 100.0;
/// Nitrogen dioxide sensor range in PPM.
pub const NO2_MAX: f64 = 10.0;
/// Sulfur dioxide sensor range in PPM.
pub const SO2_MAX: f64 = 10.0;

const NOMINAL_CURRENT: f64 = 12.0;
const NOMINAL_SIGNAL: f64 = -60.0;
const NOMINAL_CO: f64 = 5.0;
const NOMINAL_NO2: f64 = 0.5;
const NOMINAL_SO2: f64 = 0.2;

/// Complete telemetry state of the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Time of last update
    pub timestamp: DateTime<Utc>,

    /// Remaining charge (0-100%)
    pub battery_percentage: f64,
    /// Pack voltage (V)
    pub voltage: f64,
    /// Current draw (A)
    pub current: f64,

    /// Altitude above ground (m)
    pub altitude: f64,
    /// Ground speed (m/s)
    pub speed: f64,
    /// Seconds since the simulation was started
    pub flight_time: f64,

    /// Decimal degrees
    pub latitude: f64,
    /// Decimal degrees
    pub longitude: f64,

    /// Link RSSI (dBm)
    pub signal_strength: f64,

    /// Air temperature (°C)
    pub temperature: f64,
    /// Carbon monoxide (PPM)
    pub co_level: f64,
    /// Nitrogen dioxide (PPM)
    pub no2_level: f64,
    /// Sulfur dioxide (PPM)
    pub so2_level: f64,
}

impl TelemetrySnapshot {
    /// Builds the initial snapshot from baseline values.
    ///
    /// Fields without a configured baseline take nominal values. Configured
    /// values are clamped into their physical range.
    pub fn baseline(config: &BaselineConfig, timestamp: DateTime<Utc>) -> Self {
        let battery_percentage = config.battery_percentage.clamp(BATTERY_MIN, BATTERY_MAX);

        Self {
            timestamp,
            battery_percentage,
            voltage: voltage_for(battery_percentage),
            current: NOMINAL_CURRENT,
            altitude: config.altitude.clamp(ALTITUDE_MIN, ALTITUDE_MAX),
            speed: SPEED_MIN,
            flight_time: 0.0,
            latitude: config.latitude.clamp(-90.0, 90.0),
            longitude: config.longitude.clamp(-180.0, 180.0),
            signal_strength: NOMINAL_SIGNAL,
            temperature: config.temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX),
            co_level: NOMINAL_CO,
            no2_level: NOMINAL_NO2,
            so2_level: NOMINAL_SO2,
        }
    }

    /// Returns a copy with `flight_time` reset to zero.
    #[must_use]
    pub fn with_flight_time_reset(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            flight_time: 0.0,
            ..self.clone()
        }
    }

    /// Checks that every field is finite and inside its physical range.
    pub fn is_within_bounds(&self) -> bool {
        let in_range = |v: f64, min: f64, max: f64| v.is_finite() && v >= min && v <= max;

        in_range(self.battery_percentage, BATTERY_MIN, BATTERY_MAX)
            && in_range(self.voltage, VOLTAGE_MIN, VOLTAGE_MAX)
            && in_range(self.current, CURRENT_MIN, CURRENT_MAX)
            && in_range(self.altitude, ALTITUDE_MIN, ALTITUDE_MAX)
            && in_range(self.speed, SPEED_MIN, SPEED_MAX)
            && self.flight_time.is_finite()
            && self.flight_time >= 0.0
            && in_range(self.latitude, -90.0, 90.0)
            && in_range(self.longitude, -180.0, 180.0)
            && in_range(self.signal_strength, SIGNAL_MIN, SIGNAL_MAX)
            && in_range(self.temperature, TEMPERATURE_MIN, TEMPERATURE_MAX)
            && in_range(self.co_level, 0.0, CO_MAX)
            && in_range(self.no2_level, 0.0, NO2_MAX)
            && in_range(self.so2_level, 0.0, SO2_MAX)
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::baseline(&BaselineConfig::default(), Utc::now())
    }
}

/// Resting pack voltage for a charge level (linear LiPo approximation).
pub fn voltage_for(battery_percentage: f64) -> f64 {
    let pct = battery_percentage.clamp(BATTERY_MIN, BATTERY_MAX);
    VOLTAGE_MIN + (VOLTAGE_MAX - VOLTAGE_MIN) * pct / 100.0
}
