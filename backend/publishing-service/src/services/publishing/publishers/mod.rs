//! Platform publishers
//!
//! One client per platform. Each publishes a post's media and returns the
//! platform's id for the published item.

mod instagram;
mod tiktok;
mod youtube;

pub use instagram::{InstagramConfig, InstagramPublisher};
pub use tiktok::TikTokPublisher;
pub use youtube::YouTubePublisher;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::models::{Platform, ScheduledPost, SocialConnection};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no {0} connection for artist")]
    NotConnected(Platform),

    #[error("{0} access token expired")]
    TokenExpired(Platform),

    #[error("no publisher configured for {0}")]
    Unsupported(Platform),

    #[error("{0} connection is missing {1}")]
    MissingAccount(Platform, &'static str),

    #[error("{platform} returned {status}: {body}")]
    Http {
        platform: Platform,
        status: StatusCode,
        body: String,
    },

    #[error("{platform} error: {message}")]
    Api { platform: Platform, message: String },

    #[error("media download failed: {0}")]
    Media(String),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

// Request URLs can carry credentials, so they never reach the message
impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url())
    }
}

#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Publish `post` with the artist's credentials and return the external id
    async fn publish(
        &self,
        post: &ScheduledPost,
        connection: &SocialConnection,
    ) -> Result<String, PublishError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, PublishError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Turn a non-success response into [`PublishError::Http`] with a body excerpt
pub(crate) async fn ensure_success(
    platform: Platform,
    response: reqwest::Response,
) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PublishError::Http {
        platform,
        status,
        body: truncate(&body, 300).to_string(),
    })
}

pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://open.tiktokapis.com/", "/v2/post/publish/video/init/"),
            "https://open.tiktokapis.com/v2/post/publish/video/init/"
        );
    }

    #[test]
    fn test_error_messages_name_the_platform() {
        assert_eq!(
            PublishError::NotConnected(Platform::YouTube).to_string(),
            "no youtube connection for artist"
        );
        assert_eq!(
            PublishError::Api {
                platform: Platform::TikTok,
                message: "spam_risk_too_many_posts".into()
            }
            .to_string(),
            "tiktok error: spam_risk_too_many_posts"
        );
    }
}
