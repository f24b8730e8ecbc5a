//! Background jobs
//!
//! The status poll runs on a fixed interval until shutdown is signalled.
//! A failed cycle is logged and the next tick runs as usual.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::services::StreamStatusPoller;

pub async fn run_poll_loop(
    poller: Arc<StreamStatusPoller>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval_timer = interval(every);
    // no catch-up bursts after a slow cycle
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_sec = every.as_secs(), "Starting stream status poll loop");

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {
                let start = Instant::now();
                match poller.poll_once().await {
                    Ok(report) => info!(
                        transitioned = report.transitioned,
                        failed = report.failed,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Poll cycle finished"
                    ),
                    Err(e) => error!(
                        error = %e,
                        "Poll cycle failed, will retry on next interval"
                    ),
                }
            }
            _ = shutdown.recv() => {
                info!("Received shutdown signal, stopping poll loop");
                break;
            }
        }
    }

    info!("Poll loop stopped");
}
