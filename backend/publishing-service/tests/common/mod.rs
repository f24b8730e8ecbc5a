//! In-memory doubles shared by the publishing-service integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use publishing_service::error::{AppError, Result};
use publishing_service::services::publishing::models::{NewScheduledPost, PublishResult};
use publishing_service::services::publishing::{
    Platform, PlatformPublisher, PostStatus, PostStore, PublishError, ScheduledPost,
    SocialConnection,
};

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: Mutex<Vec<ScheduledPost>>,
    connections: Mutex<HashMap<(Uuid, Platform), SocialConnection>>,
    /// Posts whose claim should fail as if another worker got there first
    stolen: Mutex<Vec<Uuid>>,
}

impl InMemoryPostStore {
    pub fn insert(&self, post: ScheduledPost) {
        self.posts.lock().unwrap().push(post);
    }

    pub fn snapshot(&self, id: Uuid) -> ScheduledPost {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .expect("post present")
    }

    pub fn connect(&self, artist_id: Uuid, platform: Platform, expires_at: Option<DateTime<Utc>>) {
        self.connections.lock().unwrap().insert(
            (artist_id, platform),
            SocialConnection {
                artist_id,
                platform,
                access_token: format!("{}-token", platform),
                account_id: Some("17841400000000000".to_string()),
                expires_at,
            },
        );
    }

    pub fn steal_claim(&self, id: Uuid) {
        self.stolen.lock().unwrap().push(id);
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create(&self, new: NewScheduledPost) -> Result<ScheduledPost> {
        let now = Utc::now();
        let post = ScheduledPost {
            id: Uuid::new_v4(),
            artist_id: new.artist_id,
            caption: new.caption,
            title: new.title,
            media_url: new.media_url,
            platforms: new.platforms,
            status: PostStatus::Scheduled,
            scheduled_at: new.scheduled_at,
            external_ids: BTreeMap::new(),
            platform_errors: BTreeMap::new(),
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(post.clone());
        Ok(post)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ScheduledPost>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_for_artist(&self, artist_id: Uuid, limit: i64) -> Result<Vec<ScheduledPost>> {
        let mut posts: Vec<ScheduledPost> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.artist_id == artist_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn delete_if_scheduled(&self, id: Uuid) -> Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| !(p.id == id && p.status == PostStatus::Scheduled));
        Ok(posts.len() < before)
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<ScheduledPost>> {
        let mut due: Vec<ScheduledPost> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.status == PostStatus::Scheduled && p.scheduled_at <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn claim(&self, id: Uuid) -> Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        if self.stolen.lock().unwrap().contains(&id) {
            post.status = PostStatus::Publishing;
            return Ok(false);
        }
        if post.status != PostStatus::Scheduled {
            return Ok(false);
        }
        post.status = PostStatus::Publishing;
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn complete(&self, id: Uuid, result: &PublishResult) -> Result<ScheduledPost> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id && p.status == PostStatus::Publishing)
            .ok_or_else(|| AppError::NotFound(format!("publishing post {}", id)))?;
        post.status = result.status;
        post.external_ids = result.external_ids.clone();
        post.platform_errors = result.platform_errors.clone();
        post.published_at = result.published_at;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn connection(
        &self,
        artist_id: Uuid,
        platform: Platform,
    ) -> Result<Option<SocialConnection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .get(&(artist_id, platform))
            .cloned())
    }
}

/// Publisher with a canned result that records the order it was called in
pub struct FakePublisher {
    platform: Platform,
    result: std::result::Result<String, String>,
    calls: Arc<Mutex<Vec<(Uuid, Platform)>>>,
}

impl FakePublisher {
    pub fn ok(platform: Platform, external_id: &str, calls: Arc<Mutex<Vec<(Uuid, Platform)>>>) -> Self {
        Self {
            platform,
            result: Ok(external_id.to_string()),
            calls,
        }
    }

    pub fn failing(platform: Platform, message: &str, calls: Arc<Mutex<Vec<(Uuid, Platform)>>>) -> Self {
        Self {
            platform,
            result: Err(message.to_string()),
            calls,
        }
    }
}

#[async_trait]
impl PlatformPublisher for FakePublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(
        &self,
        post: &ScheduledPost,
        _connection: &SocialConnection,
    ) -> std::result::Result<String, PublishError> {
        self.calls.lock().unwrap().push((post.id, self.platform));
        self.result.clone().map_err(|message| PublishError::Api {
            platform: self.platform,
            message,
        })
    }
}

pub fn post(artist_id: Uuid, platforms: &[Platform], scheduled_at: DateTime<Utc>) -> ScheduledPost {
    ScheduledPost {
        id: Uuid::new_v4(),
        artist_id,
        caption: "New single out Friday".to_string(),
        title: Some("New single".to_string()),
        media_url: "https://media.example.com/clips/teaser.mp4".to_string(),
        platforms: platforms.to_vec(),
        status: PostStatus::Scheduled,
        scheduled_at,
        external_ids: BTreeMap::new(),
        platform_errors: BTreeMap::new(),
        published_at: None,
        created_at: scheduled_at - Duration::days(1),
        updated_at: scheduled_at - Duration::days(1),
    }
}
