/// Configuration management for streaming-service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
pub use actix_middleware::LogFormat;
use db_pool::env_utils::{non_empty_env, parse_env_flag, parse_env_with_default};
use std::time::Duration;

use crate::services::streaming::{MuxConfig, S3ArchiveConfig};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub mux: MuxConfig,
    pub poller: PollerConfig,
    pub webhook: WebhookConfig,
    /// Present only when `RECORDINGS_BUCKET` is set
    pub recordings: Option<S3ArchiveConfig>,
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub http_port: u16,
    /// Token required on `/internal/*` routes
    pub internal_api_token: Option<String>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub enabled: bool,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Signature checks are skipped when unset
    pub secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_with_default("PORT", 8090),
            internal_api_token: non_empty_env("INTERNAL_API_TOKEN"),
            log_format: LogFormat::from_env(),
        };

        let mux = MuxConfig {
            api_base_url: std::env::var("MUX_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.mux.com".to_string()),
            token_id: non_empty_env("MUX_TOKEN_ID").context("MUX_TOKEN_ID must be set")?,
            token_secret: non_empty_env("MUX_TOKEN_SECRET")
                .context("MUX_TOKEN_SECRET must be set")?,
            playback_base_url: std::env::var("MUX_PLAYBACK_BASE_URL")
                .unwrap_or_else(|_| "https://stream.mux.com".to_string()),
            timeout: Duration::from_secs(parse_env_with_default("HTTP_TIMEOUT_SECS", 30)),
        };

        let poller = PollerConfig {
            enabled: parse_env_flag("POLL_ENABLED", true),
            interval: Duration::from_secs(
                parse_env_with_default::<u64>("POLL_INTERVAL_SECS", 60).max(1),
            ),
        };

        let recordings = non_empty_env("RECORDINGS_BUCKET")
            .map(|bucket| -> Result<S3ArchiveConfig> {
                Ok(S3ArchiveConfig {
                    bucket,
                    cdn_base_url: non_empty_env("RECORDINGS_CDN_BASE_URL")
                        .context("RECORDINGS_CDN_BASE_URL must be set with RECORDINGS_BUCKET")?,
                    region: std::env::var("AWS_REGION")
                        .unwrap_or_else(|_| "us-east-1".to_string()),
                    endpoint: non_empty_env("S3_ENDPOINT"),
                    download_timeout: Duration::from_secs(parse_env_with_default(
                        "RECORDING_DOWNLOAD_TIMEOUT_SECS",
                        600,
                    )),
                })
            })
            .transpose()?;

        Ok(Self {
            app,
            mux,
            poller,
            webhook: WebhookConfig {
                secret: non_empty_env("STREAM_WEBHOOK_SECRET"),
            },
            recordings,
            redis_url: non_empty_env("REDIS_URL"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}
