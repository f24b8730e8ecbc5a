/// Configuration management for publishing-service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
pub use actix_middleware::LogFormat;
use db_pool::env_utils::{non_empty_env, parse_env_flag, parse_env_with_default};
use std::time::Duration;

use crate::services::publishing::InstagramConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub publisher: PublisherConfig,
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub http_port: u16,
    /// Token required on `/api/*` and `/internal/*` routes
    pub internal_api_token: Option<String>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Due posts taken per cycle
    pub batch_size: i64,
}

#[derive(Debug, Clone)]
pub struct PlatformsConfig {
    pub tiktok_api_base_url: String,
    pub youtube_upload_base_url: String,
    pub instagram: InstagramConfig,
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_with_default("PORT", 8091),
            internal_api_token: non_empty_env("INTERNAL_API_TOKEN"),
            log_format: LogFormat::from_env(),
        };

        let batch_size: i64 = parse_env_with_default("PUBLISH_BATCH_SIZE", 25);
        if batch_size < 1 {
            anyhow::bail!("PUBLISH_BATCH_SIZE must be at least 1, got {}", batch_size);
        }
        let publisher = PublisherConfig {
            enabled: parse_env_flag("PUBLISH_ENABLED", true),
            interval: Duration::from_secs(
                parse_env_with_default::<u64>("PUBLISH_INTERVAL_SECS", 60).max(1),
            ),
            batch_size,
        };

        let http_timeout = Duration::from_secs(parse_env_with_default("HTTP_TIMEOUT_SECS", 30));
        let platforms = PlatformsConfig {
            tiktok_api_base_url: std::env::var("TIKTOK_API_BASE_URL")
                .unwrap_or_else(|_| "https://open.tiktokapis.com".to_string()),
            youtube_upload_base_url: std::env::var("YOUTUBE_UPLOAD_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com".to_string()),
            instagram: InstagramConfig {
                graph_base_url: std::env::var("INSTAGRAM_GRAPH_BASE_URL")
                    .unwrap_or_else(|_| "https://graph.facebook.com".to_string()),
                api_version: std::env::var("INSTAGRAM_API_VERSION")
                    .unwrap_or_else(|_| "v19.0".to_string()),
                status_checks: parse_env_with_default("INSTAGRAM_STATUS_CHECKS", 10),
                status_delay: Duration::from_millis(parse_env_with_default(
                    "INSTAGRAM_STATUS_DELAY_MS",
                    3000,
                )),
                timeout: http_timeout,
            },
            http_timeout,
        };
        if platforms.instagram.status_checks == 0 {
            anyhow::bail!("INSTAGRAM_STATUS_CHECKS must be at least 1");
        }

        // fail early on a base URL reqwest would reject at request time
        for (key, url) in [
            ("TIKTOK_API_BASE_URL", &platforms.tiktok_api_base_url),
            ("YOUTUBE_UPLOAD_BASE_URL", &platforms.youtube_upload_base_url),
            ("INSTAGRAM_GRAPH_BASE_URL", &platforms.instagram.graph_base_url),
        ] {
            reqwest::Url::parse(url).with_context(|| format!("{} is not a valid URL", key))?;
        }

        Ok(Self {
            app,
            publisher,
            platforms,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}
