//! Database repository for scheduled posts and social connections

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, warn};
use uuid::Uuid;

use super::models::{
    NewScheduledPost, Platform, PostStatus, PublishResult, ScheduledPost, ScheduledPostRow,
    SocialConnection, SocialConnectionRow,
};
use crate::error::{AppError, Result};

const POST_COLUMNS: &str = "id, artist_id, caption, title, media_url, platforms, status, \
     scheduled_at, external_ids, platform_errors, published_at, created_at, updated_at";

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewScheduledPost) -> Result<ScheduledPost>;

    async fn get(&self, id: Uuid) -> Result<Option<ScheduledPost>>;

    /// Latest `scheduled_at` first
    async fn list_for_artist(&self, artist_id: Uuid, limit: i64) -> Result<Vec<ScheduledPost>>;

    /// Delete the post if it is still `scheduled`; returns whether a row was deleted
    async fn delete_if_scheduled(&self, id: Uuid) -> Result<bool>;

    /// `scheduled` posts with `scheduled_at <= now`, oldest first.
    /// Rows that no longer parse are marked `failed` and left out.
    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<ScheduledPost>>;

    /// Move a post from `scheduled` to `publishing`; false if it was not `scheduled`
    async fn claim(&self, id: Uuid) -> Result<bool>;

    async fn complete(&self, id: Uuid, result: &PublishResult) -> Result<ScheduledPost>;

    async fn connection(
        &self,
        artist_id: Uuid,
        platform: Platform,
    ) -> Result<Option<SocialConnection>>;
}

fn into_post(row: ScheduledPostRow) -> Result<ScheduledPost> {
    let id = row.id;
    ScheduledPost::try_from(row).map_err(|e| AppError::CorruptRecord(format!("{}: {}", id, e)))
}

/// Convert due rows, setting aside the ones that no longer parse
fn split_readable(rows: Vec<ScheduledPostRow>) -> (Vec<ScheduledPost>, Vec<(Uuid, String)>) {
    let mut posts = Vec::with_capacity(rows.len());
    let mut unreadable = Vec::new();
    for row in rows {
        let id = row.id;
        match ScheduledPost::try_from(row) {
            Ok(post) => posts.push(post),
            Err(reason) => unreadable.push((id, reason)),
        }
    }
    (posts, unreadable)
}

fn to_json_map(map: &BTreeMap<Platform, String>) -> Json<HashMap<String, String>> {
    Json(
        map.iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect(),
    )
}

/// PostgreSQL-backed [`PostStore`]
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Take an unreadable post out of the due set
    async fn fail_unreadable(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scheduled_posts
            SET status = 'failed', updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewScheduledPost) -> Result<ScheduledPost> {
        let sql = format!(
            r#"
            INSERT INTO scheduled_posts (artist_id, caption, title, media_url, platforms, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        );
        let platforms: Vec<String> = post
            .platforms
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        let row = sqlx::query_as::<_, ScheduledPostRow>(&sql)
            .bind(post.artist_id)
            .bind(&post.caption)
            .bind(&post.title)
            .bind(&post.media_url)
            .bind(platforms)
            .bind(post.scheduled_at)
            .fetch_one(&self.pool)
            .await?;

        into_post(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ScheduledPost>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM scheduled_posts WHERE id = $1");
        let row = sqlx::query_as::<_, ScheduledPostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_post).transpose()
    }

    async fn list_for_artist(&self, artist_id: Uuid, limit: i64) -> Result<Vec<ScheduledPost>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM scheduled_posts WHERE artist_id = $1 \
             ORDER BY scheduled_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ScheduledPostRow>(&sql)
            .bind(artist_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_post).collect()
    }

    async fn delete_if_scheduled(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scheduled_posts WHERE id = $1 AND status = 'scheduled'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<ScheduledPost>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM scheduled_posts \
             WHERE status = 'scheduled' AND scheduled_at <= $1 \
             ORDER BY scheduled_at ASC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ScheduledPostRow>(&sql)
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let (posts, unreadable) = split_readable(rows);
        for (id, reason) in unreadable {
            warn!(post_id = %id, reason = %reason, "Unreadable scheduled post, marking failed");
            if let Err(e) = self.fail_unreadable(id).await {
                error!(post_id = %id, error = %e, "Failed to mark unreadable post failed");
            }
        }
        Ok(posts)
    }

    async fn claim(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_posts
            SET status = 'publishing', updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete(&self, id: Uuid, result: &PublishResult) -> Result<ScheduledPost> {
        debug_assert!(result.status.is_terminal());
        let sql = format!(
            r#"
            UPDATE scheduled_posts
            SET status = $2,
                external_ids = $3,
                platform_errors = $4,
                published_at = $5,
                updated_at = NOW()
            WHERE id = $1 AND status = $6
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ScheduledPostRow>(&sql)
            .bind(id)
            .bind(result.status.as_str())
            .bind(to_json_map(&result.external_ids))
            .bind(to_json_map(&result.platform_errors))
            .bind(result.published_at)
            .bind(PostStatus::Publishing.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("publishing post {}", id)))?;
        into_post(row)
    }

    async fn connection(
        &self,
        artist_id: Uuid,
        platform: Platform,
    ) -> Result<Option<SocialConnection>> {
        let row = sqlx::query_as::<_, SocialConnectionRow>(
            r#"
            SELECT artist_id, platform, access_token, account_id, expires_at
            FROM social_connections
            WHERE artist_id = $1 AND platform = $2
            "#,
        )
        .bind(artist_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            SocialConnection::try_from(r).map_err(|e| {
                AppError::CorruptRecord(format!("connection {}/{}: {}", artist_id, platform, e))
            })
        })
        .transpose()
    }
}
