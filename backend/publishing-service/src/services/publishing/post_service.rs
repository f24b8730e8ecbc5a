//! Scheduled post service (business logic layer)

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::models::{CreatePostRequest, NewScheduledPost, ScheduledPost};
use super::repository::PostStore;
use crate::error::{AppError, Result};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

pub struct PostService {
    store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub async fn create_post(&self, request: CreatePostRequest) -> Result<ScheduledPost> {
        request.validate()?;

        let caption = request.caption.trim().to_string();
        if caption.is_empty() {
            return Err(AppError::Validation("caption must not be blank".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = request.platforms.iter().find(|p| !seen.insert(**p)) {
            return Err(AppError::Validation(format!(
                "platform '{}' listed more than once",
                dup
            )));
        }

        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let post = self
            .store
            .create(NewScheduledPost {
                artist_id: request.artist_id,
                caption,
                title,
                media_url: request.media_url,
                platforms: request.platforms,
                scheduled_at: request.scheduled_at,
            })
            .await?;

        info!(
            post_id = %post.id,
            artist_id = %post.artist_id,
            platforms = post.platforms.len(),
            scheduled_at = %post.scheduled_at,
            "Post scheduled"
        );
        Ok(post)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<ScheduledPost> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }

    pub async fn list_artist_posts(
        &self,
        artist_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<ScheduledPost>> {
        self.store
            .list_for_artist(artist_id, clamp_limit(limit))
            .await
    }

    /// Delete a post that has not started publishing
    pub async fn cancel_post(&self, id: Uuid) -> Result<()> {
        if self.store.delete_if_scheduled(id).await? {
            info!(post_id = %id, "Scheduled post cancelled");
            return Ok(());
        }

        match self.store.get(id).await? {
            None => Err(AppError::NotFound(format!("post {}", id))),
            Some(post) => Err(AppError::Conflict(format!(
                "post {} is {} and can no longer be cancelled",
                id, post.status
            ))),
        }
    }
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(1000)), MAX_LIST_LIMIT);
    }
}
