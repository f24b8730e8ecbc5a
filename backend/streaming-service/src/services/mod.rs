//! Service layer for streaming-service

pub mod streaming;

pub use streaming::{
    LiveStream, StatusSync, StreamService, StreamStatus, StreamStatusPoller, StreamStore,
    StreamWebhookHandler,
};
