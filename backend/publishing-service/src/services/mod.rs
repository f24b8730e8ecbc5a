//! Service layer for publishing-service

pub mod publishing;

pub use publishing::{PostService, PostStore, PublishingPipeline};
