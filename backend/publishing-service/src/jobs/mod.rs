//! Background jobs
//!
//! The publishing cycle runs on a fixed interval until shutdown is
//! signalled. Posts stuck in `publishing` are never picked up again.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::services::PublishingPipeline;

pub async fn run_publish_loop(
    pipeline: Arc<PublishingPipeline>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval_timer = interval(every);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_sec = every.as_secs(), "Starting scheduled post publish loop");

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {
                let start = Instant::now();
                match pipeline.process_due_posts(Utc::now()).await {
                    Ok(report) if report.processed > 0 || report.skipped > 0 => info!(
                        processed = report.processed,
                        published = report.published,
                        partial = report.partial,
                        failed = report.failed,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Publish cycle finished"
                    ),
                    Ok(_) => {}
                    Err(e) => error!(
                        error = %e,
                        "Publish cycle failed, will run again on next interval"
                    ),
                }
            }
            _ = shutdown.recv() => {
                info!("Received shutdown signal, stopping publish loop");
                break;
            }
        }
    }

    info!("Publish loop stopped");
}
