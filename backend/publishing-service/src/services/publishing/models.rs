//! Data models for scheduled social posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
// Enums
// =============================================================================

/// Social platform a post can be published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    TikTok,
    YouTube,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::TikTok, Platform::YouTube, Platform::Instagram];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TikTok => "tiktok",
            Self::YouTube => "youtube",
            Self::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiktok" => Ok(Self::TikTok),
            "youtube" => Ok(Self::YouTube),
            "instagram" => Ok(Self::Instagram),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

/// Post status: `scheduled → publishing → published | partial | failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    Publishing,
    Published,
    Partial,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Partial | Self::Failed)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "publishing" => Ok(Self::Publishing),
            "published" => Ok(Self::Published),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

// =============================================================================
// Database / domain models
// =============================================================================

/// Row as stored in `scheduled_posts`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduledPostRow {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub caption: String,
    pub title: Option<String>,
    pub media_url: String,
    pub platforms: Vec<String>,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub external_ids: Json<HashMap<String, String>>,
    pub platform_errors: Json<HashMap<String, String>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post scheduled for one or more platforms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledPost {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub caption: String,
    pub title: Option<String>,
    pub media_url: String,
    pub platforms: Vec<Platform>,
    pub status: PostStatus,
    pub scheduled_at: DateTime<Utc>,
    pub external_ids: BTreeMap<Platform, String>,
    pub platform_errors: BTreeMap<Platform, String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_platform_map(map: HashMap<String, String>) -> Result<BTreeMap<Platform, String>, String> {
    map.into_iter()
        .map(|(k, v)| Ok((k.parse()?, v)))
        .collect()
}

impl TryFrom<ScheduledPostRow> for ScheduledPost {
    type Error = String;

    fn try_from(row: ScheduledPostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            artist_id: row.artist_id,
            caption: row.caption,
            title: row.title,
            media_url: row.media_url,
            platforms: row
                .platforms
                .iter()
                .map(|p| p.parse())
                .collect::<Result<_, _>>()?,
            status: row.status.parse()?,
            scheduled_at: row.scheduled_at,
            external_ids: parse_platform_map(row.external_ids.0)?,
            platform_errors: parse_platform_map(row.platform_errors.0)?,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Values needed to insert a new post
#[derive(Debug, Clone)]
pub struct NewScheduledPost {
    pub artist_id: Uuid,
    pub caption: String,
    pub title: Option<String>,
    pub media_url: String,
    pub platforms: Vec<Platform>,
    pub scheduled_at: DateTime<Utc>,
}

/// OAuth credentials an artist granted for one platform
#[derive(Clone, sqlx::FromRow)]
pub struct SocialConnectionRow {
    pub artist_id: Uuid,
    pub platform: String,
    pub access_token: String,
    pub account_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, PartialEq)]
pub struct SocialConnection {
    pub artist_id: Uuid,
    pub platform: Platform,
    pub access_token: String,
    /// Platform account to publish as (Instagram business user id)
    pub account_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SocialConnection {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

impl fmt::Debug for SocialConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocialConnection")
            .field("artist_id", &self.artist_id)
            .field("platform", &self.platform)
            .field("access_token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TryFrom<SocialConnectionRow> for SocialConnection {
    type Error = String;

    fn try_from(row: SocialConnectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            artist_id: row.artist_id,
            platform: row.platform.parse()?,
            access_token: row.access_token,
            account_id: row.account_id,
            expires_at: row.expires_at,
        })
    }
}

/// Result of publishing a post to one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformOutcome {
    pub platform: Platform,
    pub external_id: Option<String>,
    pub error: Option<String>,
}

impl PlatformOutcome {
    pub fn success(platform: Platform, external_id: String) -> Self {
        Self {
            platform,
            external_id: Some(external_id),
            error: None,
        }
    }

    pub fn failure(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            platform,
            external_id: None,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.external_id.is_some()
    }
}

/// Final write for a processed post
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub status: PostStatus,
    pub external_ids: BTreeMap<Platform, String>,
    pub platform_errors: BTreeMap<Platform, String>,
    pub published_at: Option<DateTime<Utc>>,
}

// =============================================================================
// API Request / Response Models
// =============================================================================

/// Request to schedule a post
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub artist_id: Uuid,

    #[validate(length(min = 1, max = 2200))]
    pub caption: String,

    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(url)]
    pub media_url: String,

    #[validate(length(min = 1, max = 3))]
    pub platforms: Vec<Platform>,

    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<i64>,
}

/// Outcome of one publishing cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Posts claimed and run through their platforms
    pub processed: usize,
    pub published: usize,
    pub partial: usize,
    pub failed: usize,
    /// Due posts another worker claimed first
    pub skipped: usize,
}
