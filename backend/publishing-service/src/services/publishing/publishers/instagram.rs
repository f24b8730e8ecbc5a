//! Instagram Graph API Reels publishing
//!
//! Create a media container, wait until Instagram has processed the video,
//! then publish the container.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{ensure_success, http_client, join_url, PlatformPublisher, PublishError};
use crate::services::publishing::models::{Platform, ScheduledPost, SocialConnection};

#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub graph_base_url: String,
    pub api_version: String,
    /// Container status checks before giving up
    pub status_checks: u32,
    pub status_delay: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GraphId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ContainerStatus {
    status_code: String,
}

pub struct InstagramPublisher {
    http: reqwest::Client,
    config: InstagramConfig,
}

impl InstagramPublisher {
    pub fn new(config: InstagramConfig) -> Result<Self, PublishError> {
        Ok(Self {
            http: http_client(config.timeout)?,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(
            &self.config.graph_base_url,
            &format!("/{}/{}", self.config.api_version, path),
        )
    }

    async fn create_container(
        &self,
        account_id: &str,
        post: &ScheduledPost,
        access_token: &str,
    ) -> Result<String, PublishError> {
        let response = self
            .http
            .post(self.url(&format!("{}/media", account_id)))
            .query(&[
                ("media_type", "REELS"),
                ("video_url", post.media_url.as_str()),
                ("caption", post.caption.as_str()),
            ])
            .bearer_auth(access_token)
            .send()
            .await?;
        let container: GraphId = ensure_success(Platform::Instagram, response)
            .await?
            .json()
            .await?;
        Ok(container.id)
    }

    /// Poll the container until it is `FINISHED`
    async fn wait_until_ready(
        &self,
        container_id: &str,
        access_token: &str,
    ) -> Result<(), PublishError> {
        for check in 1..=self.config.status_checks {
            let response = self
                .http
                .get(self.url(container_id))
                .query(&[("fields", "status_code")])
                .bearer_auth(access_token)
                .send()
                .await?;
            let status: ContainerStatus = ensure_success(Platform::Instagram, response)
                .await?
                .json()
                .await?;

            match status.status_code.as_str() {
                "FINISHED" => return Ok(()),
                "ERROR" | "EXPIRED" => {
                    return Err(PublishError::Api {
                        platform: Platform::Instagram,
                        message: format!("container {} is {}", container_id, status.status_code),
                    })
                }
                other => {
                    debug!(container_id, check, status = other, "Instagram container not ready");
                    if check < self.config.status_checks {
                        tokio::time::sleep(self.config.status_delay).await;
                    }
                }
            }
        }

        Err(PublishError::Api {
            platform: Platform::Instagram,
            message: format!(
                "container {} not ready after {} checks",
                container_id, self.config.status_checks
            ),
        })
    }

    async fn publish_container(
        &self,
        account_id: &str,
        container_id: &str,
        access_token: &str,
    ) -> Result<String, PublishError> {
        let response = self
            .http
            .post(self.url(&format!("{}/media_publish", account_id)))
            .query(&[("creation_id", container_id)])
            .bearer_auth(access_token)
            .send()
            .await?;
        let media: GraphId = ensure_success(Platform::Instagram, response)
            .await?
            .json()
            .await?;
        Ok(media.id)
    }
}

#[async_trait]
impl PlatformPublisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(
        &self,
        post: &ScheduledPost,
        connection: &SocialConnection,
    ) -> Result<String, PublishError> {
        let account_id = connection
            .account_id
            .as_deref()
            .ok_or(PublishError::MissingAccount(Platform::Instagram, "account_id"))?;
        let token = connection.access_token.as_str();

        let container_id = self.create_container(account_id, post, token).await?;
        self.wait_until_ready(&container_id, token).await?;
        let media_id = self.publish_container(account_id, &container_id, token).await?;

        debug!(post_id = %post.id, media_id = %media_id, "Instagram reel published");
        Ok(media_id)
    }
}
