//! # Dashboard Module
//!
//! Stateless rendering of a [`TelemetrySnapshot`] into stat cards.
//!
//! This module handles:
//! - Building one [`StatCard`] per telemetry widget
//! - Classifying each value against warning thresholds
//! - Rendering cards as terminal text or as JSON lines
//! - Following a [`TelemetryFeed`](crate::telemetry::feed::TelemetryFeed) and
//!   printing every published snapshot ([`monitor`])

pub mod monitor;

use std::fmt;
use std::str::FromStr;

use serde::de::Error;
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::error::{Result, TelemetryError};
use crate::telemetry::snapshot::TelemetrySnapshot;

/// Severity of a displayed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Normal => write!(f, "OK"),
            Status::Warning => write!(f, "WARN"),
            Status::Critical => write!(f, "CRIT"),
        }
    }
}

/// One rendered dashboard widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
    pub status: Status,
}

impl StatCard {
    fn new(label: &'static str, value: String, unit: &'static str, status: Status) -> Self {
        Self { label, value, unit, status }
    }

    fn normal(label: &'static str, value: String, unit: &'static str) -> Self {
        Self::new(label, value, unit, Status::Normal)
    }
}

/// Output format of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Multi-line human readable block per snapshot
    Text,
    /// One JSON object per line
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "jsonl" => Ok(OutputFormat::JsonLines),
            other => Err(TelemetryError::Config(toml::de::Error::custom(format!(
                "unknown dashboard format '{}'",
                other
            )))),
        }
    }
}

/// Warning thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub battery_warning_pct: f64,
    pub battery_critical_pct: f64,
    pub signal_warning_dbm: f64,
    pub co_warning_ppm: f64,
    pub no2_warning_ppm: f64,
    pub so2_warning_ppm: f64,
}

impl From<&DashboardConfig> for Thresholds {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            battery_warning_pct: config.battery_warning_pct,
            battery_critical_pct: config.battery_critical_pct,
            signal_warning_dbm: config.signal_warning_dbm,
            co_warning_ppm: config.co_warning_ppm,
            no2_warning_ppm: config.no2_warning_ppm,
            so2_warning_ppm: config.so2_warning_ppm,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

/// JSON line layout: the snapshot plus any non-normal cards
#[derive(Serialize)]
struct DashboardLine<'a> {
    #[serde(flatten)]
    snapshot: &'a TelemetrySnapshot,
    alerts: Vec<StatCard>,
}

/// Renders snapshots into stat cards.
///
/// # Examples
///
/// ```
/// use uav_telemetry::dashboard::{Dashboard, Status};
/// use uav_telemetry::telemetry::snapshot::TelemetrySnapshot;
///
/// let dashboard = Dashboard::default();
/// let mut snapshot = TelemetrySnapshot::default();
/// snapshot.battery_percentage = 10.0;
///
/// let battery = &dashboard.cards(&snapshot)[0];
/// assert_eq!(battery.label, "Battery");
/// assert_eq!(battery.status, Status::Critical);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    thresholds: Thresholds,
}

impl Dashboard {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Builds the cards in display order.
    pub fn cards(&self, snapshot: &TelemetrySnapshot) -> Vec<StatCard> {
        let t = &self.thresholds;

        vec![
            StatCard::new(
                "Battery",
                format!("{:.1}", snapshot.battery_percentage),
                "%",
                self.battery_status(snapshot.battery_percentage),
            ),
            StatCard::normal("Voltage", format!("{:.2}", snapshot.voltage), "V"),
            StatCard::normal("Current", format!("{:.1}", snapshot.current), "A"),
            StatCard::normal("Altitude", format!("{:.1}", snapshot.altitude), "m"),
            StatCard::normal("Speed", format!("{:.1}", snapshot.speed), "m/s"),
            StatCard::normal("Flight Time", format_flight_time(snapshot.flight_time), ""),
            StatCard::normal(
                "Position",
                format!("{:.5}, {:.5}", snapshot.latitude, snapshot.longitude),
                "°",
            ),
            StatCard::new(
                "Signal",
                format!("{:.0}", snapshot.signal_strength),
                "dBm",
                if snapshot.signal_strength < t.signal_warning_dbm {
                    Status::Warning
                } else {
                    Status::Normal
                },
            ),
            StatCard::normal("Temperature", format!("{:.1}", snapshot.temperature), "°C"),
            StatCard::new(
                "CO",
                format!("{:.2}", snapshot.co_level),
                "PPM",
                gas_status(snapshot.co_level, t.co_warning_ppm),
            ),
            StatCard::new(
                "NO2",
                format!("{:.2}", snapshot.no2_level),
                "PPM",
                gas_status(snapshot.no2_level, t.no2_warning_ppm),
            ),
            StatCard::new(
                "SO2",
                format!("{:.2}", snapshot.so2_level),
                "PPM",
                gas_status(snapshot.so2_level, t.so2_warning_ppm),
            ),
        ]
    }

    /// Highest status among all cards.
    pub fn overall_status(&self, snapshot: &TelemetrySnapshot) -> Status {
        self.cards(snapshot)
            .iter()
            .map(|card| card.status)
            .max()
            .unwrap_or(Status::Normal)
    }

    /// Multi-line terminal rendering.
    pub fn render_text(&self, snapshot: &TelemetrySnapshot) -> String {
        let mut out = format!(
            "UAV Telemetry Dashboard  {}  [{}]\n",
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.overall_status(snapshot)
        );

        for card in self.cards(snapshot) {
            let marker = match card.status {
                Status::Normal => String::new(),
                status => format!("  [{}]", status),
            };
            out.push_str(&format!(
                "  {:<12} {:>22} {:<4}{}\n",
                card.label, card.value, card.unit, marker
            ));
        }

        out
    }

    /// Single-line JSON rendering.
    pub fn render_json(&self, snapshot: &TelemetrySnapshot) -> Result<String> {
        let alerts = self
            .cards(snapshot)
            .into_iter()
            .filter(|card| card.status != Status::Normal)
            .collect();

        Ok(serde_json::to_string(&DashboardLine { snapshot, alerts })?)
    }

    /// Renders in the requested format.
    pub fn render(&self, snapshot: &TelemetrySnapshot, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text(snapshot)),
            OutputFormat::JsonLines => self.render_json(snapshot),
        }
    }

    fn battery_status(&self, pct: f64) -> Status {
        if pct < self.thresholds.battery_critical_pct {
            Status::Critical
        } else if pct < self.thresholds.battery_warning_pct {
            Status::Warning
        } else {
            Status::Normal
        }
    }
}

fn gas_status(level: f64, warning: f64) -> Status {
    if level > warning * 2.0 {
        Status::Critical
    } else if level > warning {
        Status::Warning
    } else {
        Status::Normal
    }
}

/// `MM:SS`, or `H:MM:SS` past one hour.
fn format_flight_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
