//! # Synthetic Telemetry Generator
//!
//! Produces the next snapshot from the previous one by applying a bounded
//! pseudo-random perturbation to each field.
//!
//! | Field | Perturbation per tick |
//! |-------|-----------------------|
//! | Battery | drains 0.05-0.2 %, never rises |
//! | Voltage | follows battery, ±0.02 V noise |
//! | Current | ±0.5 A |
//! | Altitude | ±2 m |
//! | Speed | ±0.5 m/s |
//! | Position | ±0.00005° per axis, longitude wraps |
//! | Signal | ±2 dBm |
//! | Temperature | ±0.2 °C |
//! | CO | ±0.5 PPM |
//! | NO2 / SO2 | ±0.05 PPM |
//!
//! Every result is clamped to the ranges in [`super::snapshot`].
//!
//! ## Usage
//!
//! ```
//! use uav_telemetry::telemetry::generator::Generator;
//! use uav_telemetry::telemetry::snapshot::TelemetrySnapshot;
//!
//! let mut generator = Generator::from_seed(7);
//! let first = TelemetrySnapshot::default();
//! let next = generator.next(&first, 1.0, first.timestamp);
//!
//! assert!(next.battery_percentage <= first.battery_percentage);
//! assert!(next.is_within_bounds());
//! ```

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::snapshot::*;

const BATTERY_DRAIN_MIN: f64 = 0.05;
const BATTERY_DRAIN_MAX: f64 = 0.2;
const VOLTAGE_NOISE: f64 = 0.02;
const CURRENT_DELTA: f64 = 0.5;
const ALTITUDE_DELTA: f64 = 2.0;
const SPEED_DELTA: f64 = 0.5;
const POSITION_DELTA: f64 = 0.00005;
const SIGNAL_DELTA: f64 = 2.0;
const TEMPERATURE_DELTA: f64 = 0.2;
const CO_DELTA: f64 = 0.5;
const TRACE_GAS_DELTA: f64 = 0.05;

/// Tick function of the simulation.
///
/// Holds only the RNG; the previous snapshot is passed in, so the same
/// generator can continue from any snapshot (including one restored after a
/// stop).
#[derive(Debug, Clone)]
pub struct Generator {
    rng: StdRng,
}

impl Generator {
    /// Creates a generator from an existing RNG.
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Creates a deterministic generator.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(seeded_rng(Some(seed)))
    }

    /// Creates a generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(seeded_rng(None))
    }

    /// Computes the snapshot following `prev`.
    ///
    /// # Arguments
    ///
    /// * `prev` - Currently published snapshot
    /// * `flight_time` - Seconds since the simulation started
    /// * `timestamp` - Wall-clock time of this tick
    pub fn next(
        &mut self,
        prev: &TelemetrySnapshot,
        flight_time: f64,
        timestamp: DateTime<Utc>,
    ) -> TelemetrySnapshot {
        let drain = self.rng.random_range(BATTERY_DRAIN_MIN..=BATTERY_DRAIN_MAX);
        let battery_percentage = bounded(prev.battery_percentage - drain, BATTERY_MIN, BATTERY_MAX);

        let voltage = bounded(
            voltage_for(battery_percentage) + self.jitter(VOLTAGE_NOISE),
            VOLTAGE_MIN,
            VOLTAGE_MAX,
        );

        TelemetrySnapshot {
            timestamp,
            battery_percentage,
            voltage,
            current: self.drift(prev.current, CURRENT_DELTA, CURRENT_MIN, CURRENT_MAX),
            altitude: self.drift(prev.altitude, ALTITUDE_DELTA, ALTITUDE_MIN, ALTITUDE_MAX),
            speed: self.drift(prev.speed, SPEED_DELTA, SPEED_MIN, SPEED_MAX),
            flight_time: if flight_time.is_finite() { flight_time.max(0.0) } else { 0.0 },
            latitude: self.drift(prev.latitude, POSITION_DELTA, -90.0, 90.0),
            longitude: wrap_longitude(prev.longitude + self.jitter(POSITION_DELTA)),
            signal_strength: self.drift(prev.signal_strength, SIGNAL_DELTA, SIGNAL_MIN, SIGNAL_MAX),
            temperature: self.drift(
                prev.temperature,
                TEMPERATURE_DELTA,
                TEMPERATURE_MIN,
                TEMPERATURE_MAX,
            ),
            co_level: self.drift(prev.co_level, CO_DELTA, 0.0, CO_MAX),
            no2_level: self.drift(prev.no2_level, TRACE_GAS_DELTA, 0.0, NO2_MAX),
            so2_level: self.drift(prev.so2_level, TRACE_GAS_DELTA, 0.0, SO2_MAX),
        }
    }

    fn jitter(&mut self, max_delta: f64) -> f64 {
        self.rng.random_range(-max_delta..=max_delta)
    }

    fn drift(&mut self, value: f64, max_delta: f64, min: f64, max: f64) -> f64 {
        bounded(value + self.jitter(max_delta), min, max)
    }
}

/// RNG seeded from `seed`, or from OS entropy when `None`.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Clamps into `[min, max]`; non-finite input collapses to `min`.
fn bounded(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

/// Wraps a longitude into `[-180, 180]`.
fn wrap_longitude(longitude: f64) -> f64 {
    if !longitude.is_finite() {
        0.0
    } else if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}
