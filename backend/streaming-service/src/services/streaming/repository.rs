//! Database repository for live streams
//!
//! All PostgreSQL queries for stream status management.
//! This layer is pure data access, no business logic.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{LiveStream, LiveStreamRow, NewLiveStream, StreamStatus, Transition};
use crate::error::{AppError, Result};

const STREAM_COLUMNS: &str = "id, artist_id, title, provider, provider_stream_id, stream_key, \
     playback_url, status, is_managed, scheduled_at, started_at, ended_at, duration_minutes, \
     viewer_count, peak_viewers, recording_url, created_at, updated_at";

/// Storage operations the reconciler needs.
#[async_trait]
pub trait StreamStore: Send + Sync {
    async fn create(&self, stream: NewLiveStream) -> Result<LiveStream>;

    async fn get(&self, id: Uuid) -> Result<Option<LiveStream>>;

    async fn find_by_provider_stream_id(
        &self,
        provider_stream_id: &str,
    ) -> Result<Option<LiveStream>>;

    /// Newest first
    async fn list_for_artist(&self, artist_id: Uuid, limit: i64) -> Result<Vec<LiveStream>>;

    /// Rows whose stored status is one of [`StreamStatus::POLLABLE`]
    async fn list_pollable(&self) -> Result<Vec<LiveStream>>;

    /// Persist a status transition and return the updated row
    async fn apply_transition(&self, id: Uuid, transition: &Transition) -> Result<LiveStream>;

    /// Store the current viewer count and raise the peak if needed
    async fn update_viewers(&self, id: Uuid, viewer_count: i32) -> Result<()>;

    async fn set_recording_url(&self, id: Uuid, recording_url: &str) -> Result<()>;

    /// Deduct streamed minutes from the artist's balance
    async fn deduct_minutes(&self, artist_id: Uuid, stream_id: Uuid, minutes: i32) -> Result<()>;
}

fn into_stream(row: LiveStreamRow) -> Result<LiveStream> {
    let id = row.id;
    LiveStream::try_from(row).map_err(|e| AppError::CorruptRecord(format!("{}: {}", id, e)))
}

/// PostgreSQL-backed [`StreamStore`]
#[derive(Clone)]
pub struct PgStreamStore {
    pool: PgPool,
}

impl PgStreamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreamStore for PgStreamStore {
    async fn create(&self, stream: NewLiveStream) -> Result<LiveStream> {
        let sql = format!(
            r#"
            INSERT INTO live_streams (
                artist_id, title, provider, provider_stream_id, stream_key,
                playback_url, status, is_managed, scheduled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {STREAM_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, LiveStreamRow>(&sql)
            .bind(stream.artist_id)
            .bind(&stream.title)
            .bind(stream.provider.as_str())
            .bind(&stream.provider_stream_id)
            .bind(&stream.stream_key)
            .bind(&stream.playback_url)
            .bind(stream.status.as_str())
            .bind(stream.is_managed)
            .bind(stream.scheduled_at)
            .fetch_one(&self.pool)
            .await?;

        into_stream(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LiveStream>> {
        let sql = format!("SELECT {STREAM_COLUMNS} FROM live_streams WHERE id = $1");
        let row = sqlx::query_as::<_, LiveStreamRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_stream).transpose()
    }

    async fn find_by_provider_stream_id(
        &self,
        provider_stream_id: &str,
    ) -> Result<Option<LiveStream>> {
        let sql = format!(
            "SELECT {STREAM_COLUMNS} FROM live_streams WHERE provider_stream_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, LiveStreamRow>(&sql)
            .bind(provider_stream_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_stream).transpose()
    }

    async fn list_for_artist(&self, artist_id: Uuid, limit: i64) -> Result<Vec<LiveStream>> {
        let sql = format!(
            "SELECT {STREAM_COLUMNS} FROM live_streams WHERE artist_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, LiveStreamRow>(&sql)
            .bind(artist_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_stream).collect()
    }

    async fn list_pollable(&self) -> Result<Vec<LiveStream>> {
        let sql = format!(
            "SELECT {STREAM_COLUMNS} FROM live_streams WHERE status = ANY($1) \
             ORDER BY created_at ASC"
        );
        let statuses: Vec<String> = StreamStatus::POLLABLE
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = sqlx::query_as::<_, LiveStreamRow>(&sql)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_stream).collect()
    }

    async fn apply_transition(&self, id: Uuid, transition: &Transition) -> Result<LiveStream> {
        let row = match *transition {
            Transition::GoLive { started_at } => {
                let sql = format!(
                    r#"
                    UPDATE live_streams
                    SET status = 'live', started_at = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {STREAM_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, LiveStreamRow>(&sql)
                    .bind(id)
                    .bind(started_at)
                    .fetch_optional(&self.pool)
                    .await?
            }
            Transition::End {
                ended_at,
                duration_minutes,
            } => {
                // duration_minutes is written once: COALESCE keeps an existing value
                let sql = format!(
                    r#"
                    UPDATE live_streams
                    SET status = 'ended',
                        ended_at = $2,
                        duration_minutes = COALESCE(duration_minutes, $3),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {STREAM_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, LiveStreamRow>(&sql)
                    .bind(id)
                    .bind(ended_at)
                    .bind(duration_minutes)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        let row = row.ok_or_else(|| AppError::NotFound(format!("stream {}", id)))?;
        into_stream(row)
    }

    async fn update_viewers(&self, id: Uuid, viewer_count: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE live_streams
            SET viewer_count = $2,
                peak_viewers = GREATEST(peak_viewers, $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(viewer_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_recording_url(&self, id: Uuid, recording_url: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE live_streams
            SET recording_url = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(recording_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deduct_minutes(&self, artist_id: Uuid, stream_id: Uuid, minutes: i32) -> Result<()> {
        sqlx::query("SELECT deduct_streaming_minutes($1, $2, $3)")
            .bind(artist_id)
            .bind(stream_id)
            .bind(minutes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
