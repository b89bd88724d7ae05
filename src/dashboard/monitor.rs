//! Follows a telemetry feed and writes one rendering per published snapshot.

use std::io::Write;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Dashboard, OutputFormat};
use crate::error::Result;
use crate::telemetry::feed::TelemetryFeed;
use crate::telemetry::snapshot::TelemetrySnapshot;

/// Renders the current snapshot, then every update, until `shutdown` is
/// cancelled or the feed closes.
///
/// Returns the number of frames written.
///
/// # Errors
///
/// Returns error if rendering or writing to `out` fails.
pub async fn run<F, W>(
    feed: &F,
    dashboard: &Dashboard,
    format: OutputFormat,
    out: &mut W,
    shutdown: CancellationToken,
) -> Result<u64>
where
    F: TelemetryFeed + ?Sized,
    W: Write,
{
    let mut updates = feed.subscribe();
    let mut frames: u64 = 0;

    let current = updates.borrow_and_update().clone();
    write_frame(dashboard, &current, format, out)?;
    frames += 1;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("Dashboard shutdown requested");
                break;
            }

            changed = updates.changed() => {
                if changed.is_err() {
                    info!("Telemetry feed closed");
                    break;
                }

                let snapshot = updates.borrow_and_update().clone();
                write_frame(dashboard, &snapshot, format, out)?;
                frames += 1;
            }
        }
    }

    Ok(frames)
}

fn write_frame<W: Write>(
    dashboard: &Dashboard,
    snapshot: &TelemetrySnapshot,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let rendered = dashboard.render(snapshot, format)?;
    writeln!(out, "{}", rendered)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::source::TelemetrySource;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_writes_one_frame_per_tick() {
        let mut source =
            TelemetrySource::new(TelemetrySnapshot::default(), Duration::from_secs(1), Some(1));
        source.start_simulation();

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(3500)).await;
            trigger.cancel();
        });

        let mut out = Vec::new();
        let frames = run(&source, &Dashboard::default(), OutputFormat::JsonLines, &mut out, shutdown)
            .await
            .unwrap();

        // Initial frame plus ticks at 1s, 2s and 3s
        assert_eq!(frames, 4);

        let text = String::from_utf8(out).unwrap();
        let flight_times: Vec<f64> = text
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["flight_time"].as_f64().unwrap()
            })
            .collect();
        assert_eq!(flight_times, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_feed_writes_single_frame() {
        let source =
            TelemetrySource::new(TelemetrySnapshot::default(), Duration::from_secs(1), Some(1));

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let mut out = Vec::new();
        let frames = run(&source, &Dashboard::default(), OutputFormat::Text, &mut out, shutdown)
            .await
            .unwrap();

        assert_eq!(frames, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("UAV Telemetry Dashboard"));
    }

    #[tokio::test]
    async fn test_already_cancelled_shutdown() {
        let source =
            TelemetrySource::new(TelemetrySnapshot::default(), Duration::from_secs(1), Some(1));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let mut out = Vec::new();
        let frames = run(&source, &Dashboard::default(), OutputFormat::Text, &mut out, shutdown)
            .await
            .unwrap();
        assert_eq!(frames, 1);
    }
}
