//! Recording archive
//!
//! Downloads a finished stream's recording from the provider and re-uploads
//! it to our own bucket, which is served through the CDN.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use super::models::LiveStream;
use crate::error::{AppError, Result};

/// Copies a provider recording somewhere durable and returns its public URL
#[async_trait]
pub trait RecordingArchive: Send + Sync {
    async fn archive(&self, stream: &LiveStream, source_url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct S3ArchiveConfig {
    pub bucket: String,
    pub cdn_base_url: String,
    pub region: String,
    /// Custom endpoint for S3-compatible storage
    pub endpoint: Option<String>,
    pub download_timeout: Duration,
}

/// [`RecordingArchive`] that stores recordings in S3
pub struct S3RecordingArchive {
    http: Client,
    s3: S3Client,
    config: S3ArchiveConfig,
}

impl S3RecordingArchive {
    pub async fn new(config: S3ArchiveConfig) -> Result<Self> {
        use aws_sdk_s3::config::Region;

        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let aws_config = builder.load().await;

        let http = Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            s3: S3Client::new(&aws_config),
            config,
        })
    }
}

/// Object key for a stream's recording: `recordings/{artist_id}/{stream_id}.mp4`
pub fn recording_key(stream: &LiveStream) -> String {
    format!("recordings/{}/{}.mp4", stream.artist_id, stream.id)
}

/// Public URL of `key` under `cdn_base_url`
pub fn cdn_url(cdn_base_url: &str, key: &str) -> String {
    format!("{}/{}", cdn_base_url.trim_end_matches('/'), key)
}

#[async_trait]
impl RecordingArchive for S3RecordingArchive {
    async fn archive(&self, stream: &LiveStream, source_url: &str) -> Result<String> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("recording download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "recording download returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("recording download failed: {}", e)))?;
        let size = bytes.len();

        let key = recording_key(stream);
        self.s3
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .metadata("stream_id", stream.id.to_string())
            .metadata("artist_id", stream.artist_id.to_string())
            .cache_control("max-age=31536000")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("recording upload failed: {}", e)))?;

        info!(stream_id = %stream.id, key = %key, bytes = size, "Recording archived");
        Ok(cdn_url(&self.config.cdn_base_url, &key))
    }
}
