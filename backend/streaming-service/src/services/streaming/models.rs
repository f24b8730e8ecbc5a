//! Data models for live streams
//!
//! `LiveStreamRow` is the database shape; `LiveStream` is what the rest of the
//! service works with once status and provider have been parsed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
// Enums
// =============================================================================

/// Stream lifecycle status: `scheduled → waiting → live → ended`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Created with a start time in the future
    Scheduled,
    /// Ingest ready, encoder not yet connected
    Waiting,
    /// Encoder connected, provider reports the stream active
    Live,
    /// Terminal
    Ended,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Waiting => "waiting",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }

    /// Stored status values the poller picks up. `ready` is a legacy value
    /// still present on old rows.
    pub const POLLABLE: [&'static str; 4] = ["scheduled", "waiting", "ready", "live"];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "waiting" | "ready" => Ok(Self::Waiting),
            "live" => Ok(Self::Live),
            "ended" => Ok(Self::Ended),
            other => Err(format!("unknown stream status '{}'", other)),
        }
    }
}

/// Live video provider hosting the ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProvider {
    Mux,
    Livepush,
}

impl StreamProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mux => "mux",
            Self::Livepush => "livepush",
        }
    }
}

impl fmt::Display for StreamProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mux" => Ok(Self::Mux),
            "livepush" => Ok(Self::Livepush),
            other => Err(format!("unknown stream provider '{}'", other)),
        }
    }
}

/// State reported by the provider's live-stream status endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderState {
    /// Encoder connected and media flowing
    Active,
    /// No encoder connected (before the first broadcast or after disconnect)
    Idle,
    Disabled,
    Other(String),
}

impl From<&str> for ProviderState {
    fn from(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "idle" => Self::Idle,
            "disabled" => Self::Disabled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Idle => f.write_str("idle"),
            Self::Disabled => f.write_str("disabled"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Database / domain models
// =============================================================================

/// Row as stored in `live_streams`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiveStreamRow {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub title: String,
    pub provider: String,
    pub provider_stream_id: String,
    pub stream_key: Option<String>,
    pub playback_url: Option<String>,
    pub status: String,
    pub is_managed: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub viewer_count: i32,
    pub peak_viewers: i32,
    pub recording_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A live stream owned by one artist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStream {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub title: String,
    pub provider: StreamProvider,
    pub provider_stream_id: String,
    #[serde(skip_serializing)]
    pub stream_key: Option<String>,
    pub playback_url: Option<String>,
    pub status: StreamStatus,
    pub is_managed: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub viewer_count: i32,
    pub peak_viewers: i32,
    pub recording_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LiveStreamRow> for LiveStream {
    type Error = String;

    fn try_from(row: LiveStreamRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            artist_id: row.artist_id,
            title: row.title,
            provider: row.provider.parse()?,
            provider_stream_id: row.provider_stream_id,
            stream_key: row.stream_key,
            playback_url: row.playback_url,
            status: row.status.parse()?,
            is_managed: row.is_managed,
            scheduled_at: row.scheduled_at,
            started_at: row.started_at,
            ended_at: row.ended_at,
            duration_minutes: row.duration_minutes,
            viewer_count: row.viewer_count,
            peak_viewers: row.peak_viewers,
            recording_url: row.recording_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Values needed to insert a new stream
#[derive(Debug, Clone)]
pub struct NewLiveStream {
    pub artist_id: Uuid,
    pub title: String,
    pub provider: StreamProvider,
    pub provider_stream_id: String,
    pub stream_key: Option<String>,
    pub playback_url: Option<String>,
    pub status: StreamStatus,
    pub is_managed: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Stream as registered with the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStream {
    pub provider_stream_id: String,
    pub stream_key: Option<String>,
    pub playback_url: Option<String>,
}

/// A status change to persist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    GoLive {
        started_at: DateTime<Utc>,
    },
    End {
        ended_at: DateTime<Utc>,
        /// Only present for `live → ended`
        duration_minutes: Option<i32>,
    },
}

impl Transition {
    pub fn target(&self) -> StreamStatus {
        match self {
            Self::GoLive { .. } => StreamStatus::Live,
            Self::End { .. } => StreamStatus::Ended,
        }
    }
}

// =============================================================================
// API Request / Response Models
// =============================================================================

/// Request to create a new stream
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStreamRequest {
    pub artist_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub provider: StreamProvider,

    /// Required for providers we cannot create streams on (livepush)
    #[validate(length(min = 1, max = 255))]
    pub provider_stream_id: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_managed: bool,
}

/// Response after creating a stream; the only place the stream key is returned
#[derive(Debug, Serialize)]
pub struct CreateStreamResponse {
    #[serde(flatten)]
    pub stream: LiveStream,
    pub stream_key: Option<String>,
}

/// Query for listing an artist's streams
#[derive(Debug, Deserialize)]
pub struct ListStreamsQuery {
    pub limit: Option<i64>,
}

/// Outcome of one poll cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub checked: usize,
    pub transitioned: usize,
    pub skipped: usize,
    pub failed: usize,
}
