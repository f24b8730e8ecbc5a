//! TikTok Content Posting API, direct post from a pulled URL

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{ensure_success, http_client, join_url, PlatformPublisher, PublishError};
use crate::services::publishing::models::{Platform, ScheduledPost, SocialConnection};

const INIT_PATH: &str = "/v2/post/publish/video/init/";
/// TikTok caps post titles at 2200 characters
const MAX_TITLE_CHARS: usize = 2200;

#[derive(Debug, Deserialize)]
struct InitResponse {
    data: Option<InitData>,
    error: TikTokError,
}

#[derive(Debug, Deserialize)]
struct InitData {
    publish_id: String,
}

#[derive(Debug, Deserialize)]
struct TikTokError {
    code: String,
    #[serde(default)]
    message: String,
}

pub struct TikTokPublisher {
    http: reqwest::Client,
    api_base_url: String,
}

impl TikTokPublisher {
    pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self, PublishError> {
        Ok(Self {
            http: http_client(timeout)?,
            api_base_url: api_base_url.into(),
        })
    }
}

#[async_trait]
impl PlatformPublisher for TikTokPublisher {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    async fn publish(
        &self,
        post: &ScheduledPost,
        connection: &SocialConnection,
    ) -> Result<String, PublishError> {
        let title: String = post.caption.chars().take(MAX_TITLE_CHARS).collect();
        let response = self
            .http
            .post(join_url(&self.api_base_url, INIT_PATH))
            .bearer_auth(&connection.access_token)
            .json(&json!({
                "post_info": {
                    "title": title,
                    "privacy_level": "PUBLIC_TO_EVERYONE",
                },
                "source_info": {
                    "source": "PULL_FROM_URL",
                    "video_url": post.media_url,
                },
            }))
            .send()
            .await?;

        let body: InitResponse = ensure_success(Platform::TikTok, response)
            .await?
            .json()
            .await?;
        if body.error.code != "ok" {
            return Err(PublishError::Api {
                platform: Platform::TikTok,
                message: format!("{}: {}", body.error.code, body.error.message),
            });
        }

        let publish_id = body
            .data
            .map(|d| d.publish_id)
            .ok_or_else(|| PublishError::Api {
                platform: Platform::TikTok,
                message: "response without publish_id".to_string(),
            })?;
        debug!(post_id = %post.id, publish_id = %publish_id, "TikTok publish initiated");
        Ok(publish_id)
    }
}
