//! Scheduled post publishing
//!
//! Each due post is claimed, then published to its platforms one after the
//! other. The post ends `published`, `partial` or `failed` depending on how
//! many platforms succeeded. Nothing is retried.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::{
    Platform, PlatformOutcome, PostStatus, PublishReport, PublishResult, ScheduledPost,
};
use super::publishers::{PlatformPublisher, PublishError};
use super::repository::PostStore;
use crate::error::Result;
use crate::metrics;

/// `published` if every platform succeeded, `failed` if none did, else `partial`
pub fn aggregate_status(outcomes: &[PlatformOutcome]) -> PostStatus {
    let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
    match succeeded {
        0 => PostStatus::Failed,
        n if n == outcomes.len() => PostStatus::Published,
        _ => PostStatus::Partial,
    }
}

/// Fold per-platform outcomes into the row update for the post
pub fn publish_result(outcomes: &[PlatformOutcome], now: DateTime<Utc>) -> PublishResult {
    let status = aggregate_status(outcomes);
    let mut external_ids = BTreeMap::new();
    let mut platform_errors = BTreeMap::new();
    for outcome in outcomes {
        if let Some(id) = &outcome.external_id {
            external_ids.insert(outcome.platform, id.clone());
        }
        if let Some(e) = &outcome.error {
            platform_errors.insert(outcome.platform, e.clone());
        }
    }

    PublishResult {
        status,
        external_ids,
        platform_errors,
        published_at: (status != PostStatus::Failed).then_some(now),
    }
}

#[derive(Clone)]
pub struct PublishingPipeline {
    store: Arc<dyn PostStore>,
    publishers: HashMap<Platform, Arc<dyn PlatformPublisher>>,
    batch_size: i64,
}

impl PublishingPipeline {
    pub fn new(
        store: Arc<dyn PostStore>,
        publishers: Vec<Arc<dyn PlatformPublisher>>,
        batch_size: i64,
    ) -> Self {
        let publishers = publishers
            .into_iter()
            .map(|p| (p.platform(), p))
            .collect();
        Self {
            store,
            publishers,
            batch_size: batch_size.max(1),
        }
    }

    /// Publish every post due at `now`, up to the batch size.
    ///
    /// Only a failure to load the due posts fails the cycle. A post that
    /// cannot be finalized stays `publishing` and is logged.
    pub async fn process_due_posts(&self, now: DateTime<Utc>) -> Result<PublishReport> {
        let due = self.store.list_due(now, self.batch_size).await?;
        let mut report = PublishReport::default();

        for post in due {
            match self.store.claim(post.id).await {
                Ok(true) => {}
                Ok(false) => {
                    report.skipped += 1;
                    info!(post_id = %post.id, "Post already claimed, skipping");
                    continue;
                }
                Err(e) => {
                    error!(post_id = %post.id, error = %e, "Failed to claim post");
                    continue;
                }
            }
            report.processed += 1;

            let outcomes = self.publish_post(&post).await;
            let result = publish_result(&outcomes, Utc::now());
            match result.status {
                PostStatus::Published => report.published += 1,
                PostStatus::Partial => report.partial += 1,
                _ => report.failed += 1,
            }
            metrics::record_post_processed(result.status.as_str());

            match self.store.complete(post.id, &result).await {
                Ok(_) => info!(
                    post_id = %post.id,
                    status = %result.status,
                    published = result.external_ids.len(),
                    failed = result.platform_errors.len(),
                    "Post processed"
                ),
                Err(e) => error!(
                    post_id = %post.id,
                    status = %result.status,
                    error = %e,
                    "Failed to record publish result, post left in publishing"
                ),
            }
        }

        metrics::record_publish_cycle();
        info!(
            processed = report.processed,
            published = report.published,
            partial = report.partial,
            failed = report.failed,
            skipped = report.skipped,
            "Publishing cycle completed"
        );
        Ok(report)
    }

    /// Publish to each platform in the post's order, sequentially
    async fn publish_post(&self, post: &ScheduledPost) -> Vec<PlatformOutcome> {
        let mut outcomes = Vec::with_capacity(post.platforms.len());
        for &platform in &post.platforms {
            let outcome = match self.publish_to(post, platform).await {
                Ok(external_id) => {
                    metrics::record_platform_publish(platform.as_str(), "success");
                    info!(post_id = %post.id, platform = %platform, external_id = %external_id, "Published to platform");
                    PlatformOutcome::success(platform, external_id)
                }
                Err(e) => {
                    metrics::record_platform_publish(platform.as_str(), "failure");
                    warn!(post_id = %post.id, platform = %platform, error = %e, "Platform publish failed");
                    PlatformOutcome::failure(platform, e.to_string())
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn publish_to(
        &self,
        post: &ScheduledPost,
        platform: Platform,
    ) -> std::result::Result<String, PublishError> {
        let publisher = self
            .publishers
            .get(&platform)
            .ok_or(PublishError::Unsupported(platform))?;

        let connection = self
            .store
            .connection(post.artist_id, platform)
            .await
            .map_err(|e| PublishError::Api {
                platform,
                message: format!("connection lookup failed: {}", e),
            })?
            .ok_or(PublishError::NotConnected(platform))?;
        if connection.is_expired(Utc::now()) {
            return Err(PublishError::TokenExpired(platform));
        }

        publisher.publish(post, &connection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(platform: Platform) -> PlatformOutcome {
        PlatformOutcome::success(platform, format!("{}-id", platform))
    }

    fn failed(platform: Platform) -> PlatformOutcome {
        PlatformOutcome::failure(platform, "boom")
    }

    #[test]
    fn test_aggregate_status() {
        assert_eq!(
            aggregate_status(&[ok(Platform::TikTok), ok(Platform::YouTube)]),
            PostStatus::Published
        );
        assert_eq!(
            aggregate_status(&[ok(Platform::TikTok), failed(Platform::YouTube)]),
            PostStatus::Partial
        );
        assert_eq!(
            aggregate_status(&[failed(Platform::TikTok), failed(Platform::Instagram)]),
            PostStatus::Failed
        );
        assert_eq!(aggregate_status(&[]), PostStatus::Failed);
    }

    #[test]
    fn test_publish_result_splits_ids_and_errors() {
        let now = Utc::now();
        let result = publish_result(&[ok(Platform::TikTok), failed(Platform::Instagram)], now);
        assert_eq!(result.status, PostStatus::Partial);
        assert_eq!(
            result.external_ids.get(&Platform::TikTok).map(String::as_str),
            Some("tiktok-id")
        );
        assert_eq!(
            result.platform_errors.get(&Platform::Instagram).map(String::as_str),
            Some("boom")
        );
        assert_eq!(result.published_at, Some(now));

        let result = publish_result(&[failed(Platform::YouTube)], now);
        assert_eq!(result.published_at, None);
    }
}
