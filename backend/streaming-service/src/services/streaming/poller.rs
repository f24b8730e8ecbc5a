//! Stream status poller
//!
//! Asks the provider for the state of every open stream and writes back
//! only when the mapped status differs from the stored one.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::lifecycle::reconcile_provider_state;
use super::models::{LiveStream, PollReport, StreamProvider};
use super::mux_client::LiveProvider;
use super::repository::StreamStore;
use super::status_sync::{StatusSync, TransitionSource};
use crate::error::Result;
use crate::metrics;

#[derive(Clone)]
pub struct StreamStatusPoller {
    store: Arc<dyn StreamStore>,
    provider: Arc<dyn LiveProvider>,
    sync: StatusSync,
}

impl StreamStatusPoller {
    pub fn new(
        store: Arc<dyn StreamStore>,
        provider: Arc<dyn LiveProvider>,
        sync: StatusSync,
    ) -> Self {
        Self {
            store,
            provider,
            sync,
        }
    }

    /// Run one poll cycle over all open streams.
    ///
    /// A failure on one stream is logged and counted; it does not stop the
    /// cycle. Only a failure to load the stream list fails the whole cycle.
    pub async fn poll_once(&self) -> Result<PollReport> {
        let streams = self.store.list_pollable().await?;
        let mut report = PollReport::default();

        for stream in streams {
            if stream.provider != StreamProvider::Mux {
                report.skipped += 1;
                continue;
            }

            report.checked += 1;
            match self.poll_stream(&stream).await {
                Ok(true) => report.transitioned += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    error!(
                        stream_id = %stream.id,
                        provider_stream_id = %stream.provider_stream_id,
                        error = %e,
                        "Failed to poll stream status"
                    );
                }
            }
        }

        metrics::record_poll_cycle(report.failed);
        info!(
            checked = report.checked,
            transitioned = report.transitioned,
            skipped = report.skipped,
            failed = report.failed,
            "Stream status poll completed"
        );
        Ok(report)
    }

    /// Returns whether the stream changed status
    async fn poll_stream(&self, stream: &LiveStream) -> Result<bool> {
        let state = self
            .provider
            .stream_state(&stream.provider_stream_id)
            .await?;

        let Some(transition) = reconcile_provider_state(stream, &state, Utc::now()) else {
            debug!(
                stream_id = %stream.id,
                status = %stream.status,
                provider_state = %state,
                "No status change"
            );
            return Ok(false);
        };

        self.sync
            .commit(stream, transition, TransitionSource::Poll)
            .await?;
        Ok(true)
    }
}
