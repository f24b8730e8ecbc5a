//! Provider webhook handling
//!
//! The provider pushes `stream.*` events keyed by its own stream id. Events
//! go through the same transition rules as the poller.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::lifecycle::plan_transition;
use super::models::{LiveStream, StreamStatus};
use super::recording::RecordingArchive;
use super::repository::StreamStore;
use super::status_sync::{StatusSync, TransitionSource};
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Raw webhook body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub stream_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Parsed webhook event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Started,
    Ended { recording_url: Option<String> },
    RecordingReady { recording_url: String },
    ViewerUpdate { viewer_count: i32 },
    Unknown(String),
}

impl WebhookEnvelope {
    pub fn parse_event(&self) -> Result<StreamEvent> {
        let recording_url = self
            .data
            .get("recording_url")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match self.event.as_str() {
            "stream.started" => Ok(StreamEvent::Started),
            "stream.ended" => Ok(StreamEvent::Ended { recording_url }),
            "stream.recording_ready" => {
                let recording_url = recording_url.ok_or_else(|| {
                    AppError::BadRequest("stream.recording_ready without recording_url".into())
                })?;
                Ok(StreamEvent::RecordingReady { recording_url })
            }
            "stream.viewer_update" => {
                let viewer_count = self
                    .data
                    .get("viewer_count")
                    .and_then(|v| v.as_i64())
                    .and_then(|v| i32::try_from(v).ok())
                    .filter(|v| *v >= 0)
                    .ok_or_else(|| {
                        AppError::BadRequest(
                            "stream.viewer_update without a valid viewer_count".into(),
                        )
                    })?;
                Ok(StreamEvent::ViewerUpdate { viewer_count })
            }
            other => Ok(StreamEvent::Unknown(other.to_string())),
        }
    }
}

/// Check a hex HMAC-SHA256 signature of `body`
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA256 of `body`, the value providers send in the signature header
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// What the handler did with an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied {
        stream_id: Uuid,
        status: StreamStatus,
    },
    Ignored {
        reason: String,
    },
}

impl WebhookOutcome {
    fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Ignored { .. } => "ignored",
        }
    }
}

/// Webhook handler invoked for provider push events
#[derive(Clone)]
pub struct StreamWebhookHandler {
    store: Arc<dyn StreamStore>,
    sync: StatusSync,
    archive: Option<Arc<dyn RecordingArchive>>,
}

impl StreamWebhookHandler {
    pub fn new(
        store: Arc<dyn StreamStore>,
        sync: StatusSync,
        archive: Option<Arc<dyn RecordingArchive>>,
    ) -> Self {
        Self {
            store,
            sync,
            archive,
        }
    }

    pub async fn handle(&self, envelope: &WebhookEnvelope) -> Result<WebhookOutcome> {
        let event = envelope.parse_event()?;
        if let StreamEvent::Unknown(name) = &event {
            info!(event = %name, provider_stream_id = %envelope.stream_id, "Ignoring unknown webhook event");
            return Ok(WebhookOutcome::ignored(format!("unknown event {}", name)));
        }

        let Some(stream) = self
            .store
            .find_by_provider_stream_id(&envelope.stream_id)
            .await?
        else {
            warn!(
                event = %envelope.event,
                provider_stream_id = %envelope.stream_id,
                "Webhook received for unknown stream"
            );
            return Ok(WebhookOutcome::ignored("unknown stream"));
        };

        let at = envelope.timestamp.unwrap_or_else(Utc::now);
        match event {
            StreamEvent::Started => self.on_started(stream, at).await,
            StreamEvent::Ended { recording_url } => {
                self.on_ended(stream, at, recording_url.as_deref()).await
            }
            StreamEvent::RecordingReady { recording_url } => {
                self.store_recording(&stream, &recording_url).await?;
                Ok(WebhookOutcome::Applied {
                    stream_id: stream.id,
                    status: stream.status,
                })
            }
            StreamEvent::ViewerUpdate { viewer_count } => {
                self.on_viewer_update(stream, viewer_count).await
            }
            StreamEvent::Unknown(name) => {
                Ok(WebhookOutcome::ignored(format!("unknown event {}", name)))
            }
        }
    }

    async fn on_started(&self, stream: LiveStream, at: DateTime<Utc>) -> Result<WebhookOutcome> {
        let Some(transition) = plan_transition(&stream, StreamStatus::Live, at) else {
            return Ok(WebhookOutcome::ignored(format!(
                "stream already {}",
                stream.status
            )));
        };

        let updated = self
            .sync
            .commit(&stream, transition, TransitionSource::Webhook)
            .await?;
        Ok(WebhookOutcome::Applied {
            stream_id: updated.id,
            status: updated.status,
        })
    }

    async fn on_ended(
        &self,
        stream: LiveStream,
        at: DateTime<Utc>,
        recording_url: Option<&str>,
    ) -> Result<WebhookOutcome> {
        let updated = match plan_transition(&stream, StreamStatus::Ended, at) {
            Some(transition) => {
                self.sync
                    .commit(&stream, transition, TransitionSource::Webhook)
                    .await?
            }
            None => stream,
        };

        if let Some(url) = recording_url {
            if updated.recording_url.is_none() {
                self.store_recording(&updated, url).await?;
            }
        }

        Ok(WebhookOutcome::Applied {
            stream_id: updated.id,
            status: updated.status,
        })
    }

    async fn on_viewer_update(
        &self,
        stream: LiveStream,
        viewer_count: i32,
    ) -> Result<WebhookOutcome> {
        if stream.status.is_terminal() {
            return Ok(WebhookOutcome::ignored("stream already ended"));
        }

        self.store.update_viewers(stream.id, viewer_count).await?;
        Ok(WebhookOutcome::Applied {
            stream_id: stream.id,
            status: stream.status,
        })
    }

    /// Archive the recording when an archive is configured, otherwise keep
    /// the provider URL as is.
    async fn store_recording(&self, stream: &LiveStream, source_url: &str) -> Result<()> {
        let url = match &self.archive {
            Some(archive) => archive.archive(stream, source_url).await?,
            None => source_url.to_string(),
        };
        self.store.set_recording_url(stream.id, &url).await?;
        info!(stream_id = %stream.id, recording_url = %url, "Recording stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(event: &str, data: serde_json::Value) -> WebhookEnvelope {
        WebhookEnvelope {
            event: event.to_string(),
            stream_id: "lp-1".to_string(),
            timestamp: None,
            data,
        }
    }

    #[test]
    fn test_parse_known_events() {
        assert_eq!(
            envelope("stream.started", json!({})).parse_event().unwrap(),
            StreamEvent::Started
        );
        assert_eq!(
            envelope("stream.ended", json!({})).parse_event().unwrap(),
            StreamEvent::Ended {
                recording_url: None
            }
        );
        assert_eq!(
            envelope(
                "stream.ended",
                json!({"recording_url": "https://cdn.provider/r.mp4"})
            )
            .parse_event()
            .unwrap(),
            StreamEvent::Ended {
                recording_url: Some("https://cdn.provider/r.mp4".into())
            }
        );
        assert_eq!(
            envelope("stream.viewer_update", json!({"viewer_count": 17}))
                .parse_event()
                .unwrap(),
            StreamEvent::ViewerUpdate { viewer_count: 17 }
        );
    }

    #[test]
    fn test_parse_rejects_incomplete_payloads() {
        assert!(envelope("stream.recording_ready", json!({}))
            .parse_event()
            .is_err());
        assert!(envelope("stream.viewer_update", json!({"viewer_count": -3}))
            .parse_event()
            .is_err());
        assert!(envelope("stream.viewer_update", json!({}))
            .parse_event()
            .is_err());
    }

    #[test]
    fn test_unknown_event_is_not_an_error() {
        assert_eq!(
            envelope("stream.thumbnail", json!({})).parse_event().unwrap(),
            StreamEvent::Unknown("stream.thumbnail".into())
        );
    }

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"event":"stream.started","stream_id":"lp-1"}"#;
        let signature = sign("whsec", body);
        assert!(verify_signature("whsec", body, &signature));
        assert!(!verify_signature("other", body, &signature));
        assert!(!verify_signature("whsec", b"tampered", &signature));
        assert!(!verify_signature("whsec", body, "not-hex"));
    }
}
