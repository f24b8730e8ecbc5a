//! YouTube Data API resumable upload
//!
//! Three requests: open an upload session with the video metadata, fetch the
//! media, then PUT the bytes to the session URL.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{ensure_success, http_client, join_url, PlatformPublisher, PublishError};
use crate::services::publishing::models::{Platform, ScheduledPost, SocialConnection};

const UPLOAD_PATH: &str = "/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

pub struct YouTubePublisher {
    http: reqwest::Client,
    upload_base_url: String,
}

impl YouTubePublisher {
    pub fn new(
        upload_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        Ok(Self {
            http: http_client(timeout)?,
            upload_base_url: upload_base_url.into(),
        })
    }

    async fn open_session(
        &self,
        post: &ScheduledPost,
        connection: &SocialConnection,
    ) -> Result<String, PublishError> {
        let title: String = post
            .title
            .as_deref()
            .unwrap_or(&post.caption)
            .chars()
            .take(MAX_TITLE_CHARS)
            .collect();
        let description: String = post.caption.chars().take(MAX_DESCRIPTION_CHARS).collect();

        let response = self
            .http
            .post(join_url(&self.upload_base_url, UPLOAD_PATH))
            .bearer_auth(&connection.access_token)
            .header("X-Upload-Content-Type", "video/*")
            .json(&json!({
                "snippet": {
                    "title": title,
                    "description": description,
                },
                "status": {
                    "privacyStatus": "public",
                    "selfDeclaredMadeForKids": false,
                },
            }))
            .send()
            .await?;
        let response = ensure_success(Platform::YouTube, response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PublishError::Api {
                platform: Platform::YouTube,
                message: "upload session without Location header".to_string(),
            })
    }

    async fn download_media(
        &self,
        media_url: &str,
    ) -> Result<(String, bytes::Bytes), PublishError> {
        let response = self
            .http
            .get(media_url)
            .send()
            .await
            .map_err(|e| PublishError::Media(e.without_url().to_string()))?;
        if !response.status().is_success() {
            return Err(PublishError::Media(format!(
                "{} returned {}",
                media_url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PublishError::Media(e.without_url().to_string()))?;
        Ok((content_type, bytes))
    }
}

#[async_trait]
impl PlatformPublisher for YouTubePublisher {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn publish(
        &self,
        post: &ScheduledPost,
        connection: &SocialConnection,
    ) -> Result<String, PublishError> {
        let session_url = self.open_session(post, connection).await?;
        let (content_type, media) = self.download_media(&post.media_url).await?;
        let size = media.len();

        let response = self
            .http
            .put(&session_url)
            .bearer_auth(&connection.access_token)
            .header(CONTENT_TYPE, content_type)
            .body(media)
            .send()
            .await?;
        let video: UploadedVideo = ensure_success(Platform::YouTube, response)
            .await?
            .json()
            .await?;

        debug!(post_id = %post.id, video_id = %video.id, bytes = size, "YouTube upload finished");
        Ok(video.id)
    }
}
