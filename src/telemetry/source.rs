//! # Telemetry Source
//!
//! Owns the current [`TelemetrySnapshot`] and refreshes it with synthetic
//! values on a fixed interval while simulation is active.
//!
//! ## Publication
//!
//! Snapshots live in a [`tokio::sync::watch`] channel. Each tick builds a new
//! snapshot and replaces the current one as a unit, so readers never see a
//! partially updated value and every subscriber is woken.
//!
//! ## Lifecycle
//!
//! - [`TelemetrySource::start_simulation`] resets `flight_time`, publishes the
//!   reset snapshot and spawns one ticker task. The first tick fires one full
//!   interval later.
//! - [`TelemetrySource::stop_simulation`] cancels the ticker. The last
//!   snapshot stays visible until the next start.
//! - Dropping the source stops the simulation.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use uav_telemetry::telemetry::source::TelemetrySource;
//! use uav_telemetry::telemetry::snapshot::TelemetrySnapshot;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut source = TelemetrySource::new(
//!         TelemetrySnapshot::default(),
//!         Duration::from_secs(1),
//!         Some(42),
//!     );
//!     let mut updates = source.subscribe();
//!
//!     source.start_simulation();
//!     updates.changed().await.unwrap();
//!     println!("battery: {:.1}%", updates.borrow().battery_percentage);
//!     source.stop_simulation();
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::feed::TelemetryFeed;
use super::generator::{seeded_rng, Generator};
use super::snapshot::TelemetrySnapshot;
use crate::config::Config;

/// Shortest accepted tick period.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Longest accepted tick period (matches the `interval_ms` config limit).
pub const MAX_INTERVAL: Duration = Duration::from_millis(60_000);

/// Handle to the running ticker task.
struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Simulated telemetry source.
pub struct TelemetrySource {
    snapshot_tx: Arc<watch::Sender<TelemetrySnapshot>>,
    interval: Duration,
    /// Seeds one generator per simulation run.
    seeder: StdRng,
    ticker: Option<Ticker>,
}

impl std::fmt::Debug for TelemetrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySource")
            .field("interval", &self.interval)
            .field("is_simulating", &self.is_simulating())
            .finish_non_exhaustive()
    }
}

impl TelemetrySource {
    /// Creates a stopped source holding `initial`.
    ///
    /// # Arguments
    ///
    /// * `initial` - Snapshot visible before the first tick
    /// * `interval` - Tick period, clamped to [`MIN_INTERVAL`]..=[`MAX_INTERVAL`]
    /// * `seed` - Fixed RNG seed, or `None` for OS entropy
    pub fn new(initial: TelemetrySnapshot, interval: Duration, seed: Option<u64>) -> Self {
        let (snapshot_tx, _) = watch::channel(initial);
        Self {
            snapshot_tx: Arc::new(snapshot_tx),
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
            seeder: seeded_rng(seed),
            ticker: None,
        }
    }

    /// Creates a stopped source from the `[simulation]` and `[baseline]`
    /// configuration sections.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TelemetrySnapshot::baseline(&config.baseline, Utc::now()),
            config.simulation.interval(),
            config.simulation.seed,
        )
    }

    /// Tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the ticker is running.
    pub fn is_simulating(&self) -> bool {
        self.ticker.is_some()
    }

    /// Starts periodic ticks.
    ///
    /// Does nothing if already running. Returns `true` if a new run was
    /// started.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_simulation(&mut self) -> bool {
        if self.is_simulating() {
            debug!("Simulation already running, ignoring start");
            return false;
        }

        let started = Instant::now();
        self.snapshot_tx
            .send_modify(|current| *current = current.with_flight_time_reset(Utc::now()));

        let cancel = CancellationToken::new();
        let generator = Generator::from_seed(self.seeder.random());
        let handle = tokio::spawn(run_ticker(
            Arc::clone(&self.snapshot_tx),
            generator,
            self.interval,
            started,
            cancel.clone(),
        ));

        self.ticker = Some(Ticker { cancel, handle });
        info!("Telemetry simulation started ({:?} interval)", self.interval);
        true
    }

    /// Stops periodic ticks, freezing the current snapshot.
    ///
    /// Does nothing if already stopped. Returns `true` if a run was stopped.
    pub fn stop_simulation(&mut self) -> bool {
        let Some(ticker) = self.ticker.take() else {
            debug!("Simulation not running, ignoring stop");
            return false;
        };

        ticker.cancel.cancel();
        ticker.handle.abort();

        // Waits out a publish already holding the lock; later ones see the
        // cancelled token.
        self.snapshot_tx.send_if_modified(|_| false);

        info!(
            "Telemetry simulation stopped (flight time {:.1}s)",
            self.snapshot_tx.borrow().flight_time
        );
        true
    }

    /// Current snapshot. Never blocks on the ticker.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.snapshot_tx.subscribe()
    }
}

impl TelemetryFeed for TelemetrySource {
    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySource::snapshot(self)
    }

    fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        TelemetrySource::subscribe(self)
    }
}

impl Drop for TelemetrySource {
    fn drop(&mut self) {
        self.stop_simulation();
    }
}

/// Ticker task body: one snapshot per period until cancelled.
async fn run_ticker(
    snapshot_tx: Arc<watch::Sender<TelemetrySnapshot>>,
    mut generator: Generator,
    period: Duration,
    started: Instant,
    cancel: CancellationToken,
) {
    let mut ticks = interval_at(started + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            deadline = ticks.tick() => {
                let flight_time = deadline.duration_since(started).as_secs_f64();
                let next = {
                    let current = snapshot_tx.borrow();
                    generator.next(&current, flight_time, Utc::now())
                };

                let published = snapshot_tx.send_if_modified(|current| {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    *current = next;
                    true
                });

                if !published {
                    break;
                }

                debug!("Published telemetry tick at {:.1}s", flight_time);
            }
        }
    }

    debug!("Telemetry ticker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaselineConfig;
    use tokio::time::{sleep, timeout};
    use tokio_test::assert_pending;

    const PERIOD: Duration = Duration::from_secs(1);

    fn source() -> TelemetrySource {
        TelemetrySource::new(
            TelemetrySnapshot::baseline(&BaselineConfig::default(), Utc::now()),
            PERIOD,
            Some(42),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state() {
        let source = source();

        assert!(!source.is_simulating());
        assert_eq!(source.interval(), PERIOD);
        assert_eq!(source.snapshot().flight_time, 0.0);
        assert_eq!(source.snapshot().battery_percentage, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_before_start() {
        let source = source();
        let before = source.snapshot();
        let rx = source.subscribe();

        sleep(PERIOD * 5).await;

        assert_eq!(source.snapshot(), before);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_tick_after_start() {
        let mut source = source();
        assert!(source.start_simulation());
        let mut rx = source.subscribe();

        rx.changed().await.unwrap();

        assert!(source.is_simulating());
        assert_eq!(rx.borrow_and_update().flight_time, 1.0);
        assert_eq!(source.snapshot().flight_time, 1.0);
        assert!(source.snapshot().battery_percentage < 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_publishes_reset_snapshot() {
        let mut source = source();
        let mut rx = source.subscribe();

        source.start_simulation();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().flight_time, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flight_time_non_decreasing_and_bounded() {
        let mut source = source();
        source.start_simulation();
        let mut rx = source.subscribe();

        let mut last = 0.0;
        for tick in 1..=20 {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            assert!(snapshot.flight_time >= last);
            assert_eq!(snapshot.flight_time, tick as f64);
            assert!(snapshot.is_within_bounds(), "tick {}: {:?}", tick, snapshot);
            last = snapshot.flight_time;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_idempotent_between_ticks() {
        let mut source = source();
        source.start_simulation();
        let mut rx = source.subscribe();
        rx.changed().await.unwrap();

        let first = source.snapshot();
        let second = source.snapshot();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_snapshot() {
        let mut source = source();
        source.start_simulation();
        let mut rx = source.subscribe();
        rx.changed().await.unwrap();
        rx.borrow_and_update();

        assert!(source.stop_simulation());
        assert!(!source.is_simulating());
        let frozen = source.snapshot();

        sleep(PERIOD * 10).await;

        assert_eq!(source.snapshot(), frozen);
        assert!(!rx.has_changed().unwrap());

        let mut changed = tokio_test::task::spawn(rx.changed());
        assert_pending!(changed.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let mut source = source();
        assert!(!source.stop_simulation());

        source.start_simulation();
        assert!(source.stop_simulation());
        assert!(!source.stop_simulation());
        assert!(!source.is_simulating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_flight_time() {
        let mut source = source();
        source.start_simulation();
        let mut rx = source.subscribe();
        for _ in 0..3 {
            rx.changed().await.unwrap();
        }
        assert_eq!(rx.borrow_and_update().flight_time, 3.0);

        source.stop_simulation();
        sleep(PERIOD * 2).await;
        assert_eq!(source.snapshot().flight_time, 3.0);

        source.start_simulation();
        assert_eq!(rx.borrow_and_update().flight_time, 0.0);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().flight_time, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_continues_from_frozen_values() {
        let mut source = source();
        source.start_simulation();
        let mut rx = source.subscribe();
        for _ in 0..5 {
            rx.changed().await.unwrap();
        }
        source.stop_simulation();
        let frozen = source.snapshot();

        source.start_simulation();
        let restarted = source.snapshot();

        assert_eq!(restarted.battery_percentage, frozen.battery_percentage);
        assert_eq!(restarted.altitude, frozen.altitude);
        assert_eq!(restarted.flight_time, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_timer() {
        let mut source = source();
        assert!(source.start_simulation());
        assert!(!source.start_simulation());
        assert!(source.is_simulating());

        let mut rx = source.subscribe();
        rx.changed().await.unwrap();
        rx.borrow_and_update();

        // A leaked second ticker would keep publishing after stop
        source.stop_simulation();
        sleep(PERIOD * 10).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticker() {
        let mut source = source();
        source.start_simulation();
        let mut rx = source.subscribe();
        rx.borrow_and_update();

        drop(source);

        // Once the ticker is gone no sender remains, so changed() errors
        let result = timeout(PERIOD * 10, rx.changed()).await;
        assert!(matches!(result, Ok(Err(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_subscribers_notified() {
        let mut source = source();
        let mut a = source.subscribe();
        let mut b = source.subscribe();
        source.start_simulation();
        a.borrow_and_update();
        b.borrow_and_update();

        a.changed().await.unwrap();
        assert!(b.has_changed().unwrap());
        assert_eq!(*a.borrow(), *b.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_trait_matches_source() {
        let mut source = source();
        source.start_simulation();
        let mut rx = TelemetryFeed::subscribe(&source);
        rx.changed().await.unwrap();

        let feed: &dyn TelemetryFeed = &source;
        assert_eq!(feed.snapshot(), source.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_is_capped() {
        let mut source =
            TelemetrySource::new(TelemetrySnapshot::default(), Duration::MAX, Some(1));
        assert_eq!(source.interval(), MAX_INTERVAL);

        source.start_simulation();
        let mut rx = source.subscribe();
        rx.changed().await.unwrap();

        assert!(source.is_simulating());
        assert_eq!(rx.borrow_and_update().flight_time, MAX_INTERVAL.as_secs_f64());
    }

    #[test]
    fn test_zero_interval_is_raised() {
        let source = TelemetrySource::new(TelemetrySnapshot::default(), Duration::ZERO, None);
        assert_eq!(source.interval(), MIN_INTERVAL);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.simulation.interval_ms = 250;
        config.baseline.altitude = 42.0;

        let source = TelemetrySource::from_config(&config);
        assert_eq!(source.interval(), Duration::from_millis(250));
        assert_eq!(source.snapshot().altitude, 42.0);
        assert!(!source.is_simulating());
    }
}
