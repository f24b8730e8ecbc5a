//! Status change notifications for connected portal clients

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::models::{LiveStream, StreamStatus};
use crate::error::Result;

type RedisManager = redis::aio::ConnectionManager;

#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn stream_status_changed(&self, stream: &LiveStream, previous: StreamStatus)
        -> Result<()>;
}

/// Used when Redis is not configured
pub struct NoopNotifier;

#[async_trait]
impl StatusNotifier for NoopNotifier {
    async fn stream_status_changed(
        &self,
        _stream: &LiveStream,
        _previous: StreamStatus,
    ) -> Result<()> {
        Ok(())
    }
}

/// Publishes on `live_streams:{artist_id}`
pub struct RedisStatusNotifier {
    redis: RedisManager,
}

impl RedisStatusNotifier {
    pub fn new(redis: RedisManager) -> Self {
        Self { redis }
    }
}

pub fn channel_for(stream: &LiveStream) -> String {
    format!("live_streams:{}", stream.artist_id)
}

pub fn status_payload(stream: &LiveStream, previous: StreamStatus) -> serde_json::Value {
    json!({
        "event_type": "stream.status_changed",
        "stream_id": stream.id,
        "artist_id": stream.artist_id,
        "previous_status": previous,
        "status": stream.status,
        "started_at": stream.started_at,
        "ended_at": stream.ended_at,
        "duration_minutes": stream.duration_minutes,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

#[async_trait]
impl StatusNotifier for RedisStatusNotifier {
    async fn stream_status_changed(
        &self,
        stream: &LiveStream,
        previous: StreamStatus,
    ) -> Result<()> {
        let mut conn = self.redis.clone();
        redis::cmd("PUBLISH")
            .arg(channel_for(stream))
            .arg(status_payload(stream, previous).to_string())
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }
}
