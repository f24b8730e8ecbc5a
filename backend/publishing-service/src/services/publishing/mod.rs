//! Social post scheduling and publishing
//!
//! Artists schedule a post for one or more platforms. The publishing job
//! picks up due posts through [`pipeline::PublishingPipeline`] and hands each
//! platform to its [`publishers::PlatformPublisher`].

pub mod models;
pub mod pipeline;
pub mod post_service;
pub mod publishers;
pub mod repository;

pub use models::{
    CreatePostRequest, Platform, PlatformOutcome, PostStatus, PublishReport, ScheduledPost,
    SocialConnection,
};
pub use pipeline::{aggregate_status, PublishingPipeline};
pub use post_service::PostService;
pub use publishers::{
    InstagramConfig, InstagramPublisher, PlatformPublisher, PublishError, TikTokPublisher,
    YouTubePublisher,
};
pub use repository::{PgPostStore, PostStore};
