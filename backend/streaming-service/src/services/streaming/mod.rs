//! Live stream status reconciliation
//!
//! Two inputs drive a stream's status: the periodic provider poll and the
//! provider's webhooks. Both plan transitions through [`lifecycle`] and
//! commit them through [`status_sync::StatusSync`].

pub mod lifecycle;
pub mod models;
pub mod mux_client;
pub mod notifier;
pub mod poller;
pub mod recording;
pub mod repository;
pub mod status_sync;
pub mod stream_service;
pub mod stream_webhook;

pub use models::{
    CreateStreamRequest, CreateStreamResponse, LiveStream, PollReport, ProviderState,
    StreamProvider, StreamStatus, Transition,
};
pub use mux_client::{LiveProvider, MuxClient, MuxConfig};
pub use notifier::{NoopNotifier, RedisStatusNotifier, StatusNotifier};
pub use poller::StreamStatusPoller;
pub use recording::{RecordingArchive, S3ArchiveConfig, S3RecordingArchive};
pub use repository::{PgStreamStore, StreamStore};
pub use status_sync::{StatusSync, TransitionSource};
pub use stream_service::StreamService;
pub use stream_webhook::{StreamWebhookHandler, WebhookEnvelope, WebhookOutcome};
