//! Consumer-side abstraction over a source of telemetry snapshots.
//!
//! Presentation code depends on this trait rather than on the simulator, so
//! a real device link can later stand behind the same contract.

use tokio::sync::watch;

use super::snapshot::TelemetrySnapshot;

/// Read side of a telemetry source
pub trait TelemetryFeed: Send + Sync {
    /// Current snapshot. Never blocks.
    fn snapshot(&self) -> TelemetrySnapshot;

    /// Receiver notified each time a new snapshot is published.
    fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot>;
}
