//! Mux live-stream API client
//!
//! Only the two calls the reconciler needs: create a live stream and read
//! its current state.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::models::{ProviderState, ProviderStream};
use crate::error::{AppError, Result};

/// Live video provider operations
#[async_trait]
pub trait LiveProvider: Send + Sync {
    /// Register a new live stream with the provider
    async fn create_live_stream(&self) -> Result<ProviderStream>;

    /// Current state of a provider live stream
    async fn stream_state(&self, provider_stream_id: &str) -> Result<ProviderState>;
}

#[derive(Debug, Clone)]
pub struct MuxConfig {
    pub api_base_url: String,
    pub token_id: String,
    pub token_secret: String,
    pub playback_base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MuxEnvelope {
    data: MuxLiveStream,
}

#[derive(Debug, Deserialize)]
struct MuxLiveStream {
    id: String,
    status: String,
    stream_key: Option<String>,
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
}

#[derive(Debug, Deserialize)]
struct MuxPlaybackId {
    id: String,
}

/// [`LiveProvider`] backed by the Mux Video API
#[derive(Clone)]
pub struct MuxClient {
    http: Client,
    config: MuxConfig,
}

impl MuxClient {
    pub fn new(config: MuxConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    async fn read_envelope(response: reqwest::Response) -> Result<MuxLiveStream> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::Provider("mux live stream not found".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "mux returned {}: {}",
                status,
                truncate(&body, 200)
            )));
        }
        let envelope: MuxEnvelope = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl LiveProvider for MuxClient {
    async fn create_live_stream(&self) -> Result<ProviderStream> {
        let response = self
            .http
            .post(self.url("/video/v1/live-streams"))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .json(&json!({
                "playback_policy": ["public"],
                "new_asset_settings": { "playback_policy": ["public"] },
            }))
            .send()
            .await?;

        let stream = Self::read_envelope(response).await?;
        debug!(provider_stream_id = %stream.id, "Created mux live stream");

        let playback_url = stream.playback_ids.first().map(|p| {
            format!(
                "{}/{}.m3u8",
                self.config.playback_base_url.trim_end_matches('/'),
                p.id
            )
        });

        Ok(ProviderStream {
            provider_stream_id: stream.id,
            stream_key: stream.stream_key,
            playback_url,
        })
    }

    async fn stream_state(&self, provider_stream_id: &str) -> Result<ProviderState> {
        let response = self
            .http
            .get(self.url(&format!("/video/v1/live-streams/{}", provider_stream_id)))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .send()
            .await?;

        let stream = Self::read_envelope(response).await?;
        Ok(ProviderState::from(stream.status.as_str()))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
