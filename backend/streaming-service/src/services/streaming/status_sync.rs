//! Commit a planned transition
//!
//! Both the poller and the webhook handler end up here, so whichever path
//! ends a managed stream is the one that bills its minutes.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::{LiveStream, Transition};
use super::notifier::StatusNotifier;
use super::repository::StreamStore;
use crate::error::Result;
use crate::metrics;

/// Where a transition came from, used as a metrics label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    Poll,
    Webhook,
}

impl TransitionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Webhook => "webhook",
        }
    }
}

#[derive(Clone)]
pub struct StatusSync {
    store: Arc<dyn StreamStore>,
    notifier: Arc<dyn StatusNotifier>,
}

impl StatusSync {
    pub fn new(store: Arc<dyn StreamStore>, notifier: Arc<dyn StatusNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Persist `transition` for `stream` and return the stored row.
    ///
    /// A `live → ended` transition of a managed stream also deducts the
    /// streamed minutes, after the change has been announced. Notification
    /// failures are logged and do not fail the commit. A failed deduction is
    /// returned, with the row already ended.
    pub async fn commit(
        &self,
        stream: &LiveStream,
        transition: Transition,
        source: TransitionSource,
    ) -> Result<LiveStream> {
        let updated = self.store.apply_transition(stream.id, &transition).await?;

        metrics::record_transition(
            stream.status.as_str(),
            updated.status.as_str(),
            source.as_str(),
        );
        info!(
            stream_id = %stream.id,
            provider_stream_id = %stream.provider_stream_id,
            from = %stream.status,
            to = %updated.status,
            source = source.as_str(),
            duration_minutes = ?updated.duration_minutes,
            "Stream status changed"
        );

        if let Err(e) = self
            .notifier
            .stream_status_changed(&updated, stream.status)
            .await
        {
            warn!(stream_id = %stream.id, error = %e, "Failed to publish status change");
        }

        if let Transition::End {
            duration_minutes: Some(minutes),
            ..
        } = transition
        {
            self.deduct_minutes(&updated, minutes).await?;
        }

        Ok(updated)
    }

    async fn deduct_minutes(&self, stream: &LiveStream, minutes: i32) -> Result<()> {
        if !stream.is_managed || minutes <= 0 {
            return Ok(());
        }

        // The row is already ended, so no later event bills these minutes
        if let Err(e) = self
            .store
            .deduct_minutes(stream.artist_id, stream.id, minutes)
            .await
        {
            error!(
                stream_id = %stream.id,
                artist_id = %stream.artist_id,
                minutes,
                error = %e,
                "Minutes deduction failed, needs manual reconciliation"
            );
            metrics::record_deduction_failure();
            return Err(e);
        }
        info!(
            stream_id = %stream.id,
            artist_id = %stream.artist_id,
            minutes,
            "Deducted streaming minutes"
        );
        Ok(())
    }
}
