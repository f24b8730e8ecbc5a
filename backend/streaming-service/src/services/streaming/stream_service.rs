//! Stream service (business logic layer)
//!
//! Registers new streams with the provider and serves reads for the portal.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::models::{
    CreateStreamRequest, CreateStreamResponse, LiveStream, NewLiveStream, ProviderStream,
    StreamProvider, StreamStatus,
};
use super::mux_client::LiveProvider;
use super::repository::StreamStore;
use crate::error::{AppError, Result};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

pub struct StreamService {
    store: Arc<dyn StreamStore>,
    provider: Arc<dyn LiveProvider>,
}

impl StreamService {
    pub fn new(store: Arc<dyn StreamStore>, provider: Arc<dyn LiveProvider>) -> Self {
        Self { store, provider }
    }

    /// Create a stream record. Mux streams are registered with mux first;
    /// livepush streams carry the caller's provider id.
    pub async fn create_stream(&self, request: CreateStreamRequest) -> Result<CreateStreamResponse> {
        request.validate()?;

        let registered = match (request.provider, request.provider_stream_id.clone()) {
            (StreamProvider::Mux, None) => self.provider.create_live_stream().await?,
            (StreamProvider::Mux, Some(_)) => {
                return Err(AppError::BadRequest(
                    "provider_stream_id is assigned by mux".to_string(),
                ))
            }
            (StreamProvider::Livepush, Some(provider_stream_id)) => ProviderStream {
                provider_stream_id,
                stream_key: None,
                playback_url: None,
            },
            (StreamProvider::Livepush, None) => {
                return Err(AppError::BadRequest(
                    "provider_stream_id is required for livepush streams".to_string(),
                ))
            }
        };

        let status = initial_status(request.scheduled_at, Utc::now());
        let stream = self
            .store
            .create(NewLiveStream {
                artist_id: request.artist_id,
                title: request.title.trim().to_string(),
                provider: request.provider,
                provider_stream_id: registered.provider_stream_id,
                stream_key: registered.stream_key,
                playback_url: registered.playback_url,
                status,
                is_managed: request.is_managed,
                scheduled_at: request.scheduled_at,
            })
            .await?;

        info!(
            stream_id = %stream.id,
            artist_id = %stream.artist_id,
            provider = %stream.provider,
            status = %stream.status,
            "Stream created"
        );

        let stream_key = stream.stream_key.clone();
        Ok(CreateStreamResponse { stream, stream_key })
    }

    pub async fn get_stream(&self, id: Uuid) -> Result<LiveStream> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("stream {}", id)))
    }

    pub async fn list_artist_streams(
        &self,
        artist_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<LiveStream>> {
        self.store
            .list_for_artist(artist_id, clamp_limit(limit))
            .await
    }
}

/// `scheduled` for a start time in the future, otherwise `waiting`
pub fn initial_status(scheduled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> StreamStatus {
    match scheduled_at {
        Some(at) if at > now => StreamStatus::Scheduled,
        _ => StreamStatus::Waiting,
    }
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}
