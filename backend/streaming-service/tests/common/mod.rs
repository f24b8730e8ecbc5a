//! In-memory doubles shared by the streaming-service integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use streaming_service::error::{AppError, Result};
use streaming_service::services::streaming::lifecycle;
use streaming_service::services::streaming::models::NewLiveStream;
use streaming_service::services::streaming::{
    LiveProvider, LiveStream, ProviderState, RecordingArchive, StatusNotifier, StreamProvider,
    StreamStatus, StreamStore, Transition,
};
use streaming_service::services::streaming::models::ProviderStream;

#[derive(Default)]
pub struct InMemoryStreamStore {
    streams: Mutex<Vec<LiveStream>>,
    pub deductions: Mutex<Vec<(Uuid, Uuid, i32)>>,
    pub writes: Mutex<usize>,
    pub fail_deductions: Mutex<bool>,
}

impl InMemoryStreamStore {
    pub fn insert(&self, stream: LiveStream) {
        self.streams.lock().unwrap().push(stream);
    }

    pub fn snapshot(&self, id: Uuid) -> LiveStream {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .expect("stream present")
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn deductions(&self) -> Vec<(Uuid, Uuid, i32)> {
        self.deductions.lock().unwrap().clone()
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut LiveStream)) -> Result<LiveStream> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("stream {}", id)))?;
        f(stream);
        stream.updated_at = Utc::now();
        *self.writes.lock().unwrap() += 1;
        Ok(stream.clone())
    }
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn create(&self, new: NewLiveStream) -> Result<LiveStream> {
        let now = Utc::now();
        let stream = LiveStream {
            id: Uuid::new_v4(),
            artist_id: new.artist_id,
            title: new.title,
            provider: new.provider,
            provider_stream_id: new.provider_stream_id,
            stream_key: new.stream_key,
            playback_url: new.playback_url,
            status: new.status,
            is_managed: new.is_managed,
            scheduled_at: new.scheduled_at,
            started_at: None,
            ended_at: None,
            duration_minutes: None,
            viewer_count: 0,
            peak_viewers: 0,
            recording_url: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(stream.clone());
        Ok(stream)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LiveStream>> {
        Ok(self
            .streams
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_by_provider_stream_id(
        &self,
        provider_stream_id: &str,
    ) -> Result<Option<LiveStream>> {
        Ok(self
            .streams
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.provider_stream_id == provider_stream_id)
            .cloned())
    }

    async fn list_for_artist(&self, artist_id: Uuid, limit: i64) -> Result<Vec<LiveStream>> {
        let mut streams: Vec<LiveStream> = self
            .streams
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.artist_id == artist_id)
            .cloned()
            .collect();
        streams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        streams.truncate(limit as usize);
        Ok(streams)
    }

    async fn list_pollable(&self) -> Result<Vec<LiveStream>> {
        Ok(self
            .streams
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn apply_transition(&self, id: Uuid, transition: &Transition) -> Result<LiveStream> {
        self.update(id, |s| *s = lifecycle::apply(s, transition))
    }

    async fn update_viewers(&self, id: Uuid, viewer_count: i32) -> Result<()> {
        self.update(id, |s| {
            s.viewer_count = viewer_count;
            s.peak_viewers = s.peak_viewers.max(viewer_count);
        })?;
        Ok(())
    }

    async fn set_recording_url(&self, id: Uuid, recording_url: &str) -> Result<()> {
        self.update(id, |s| s.recording_url = Some(recording_url.to_string()))?;
        Ok(())
    }

    async fn deduct_minutes(&self, artist_id: Uuid, stream_id: Uuid, minutes: i32) -> Result<()> {
        if *self.fail_deductions.lock().unwrap() {
            return Err(AppError::Internal("billing unavailable".to_string()));
        }
        self.deductions
            .lock()
            .unwrap()
            .push((artist_id, stream_id, minutes));
        Ok(())
    }
}

/// Provider returning canned states per provider stream id
#[derive(Default)]
pub struct FakeProvider {
    states: Mutex<HashMap<String, std::result::Result<ProviderState, String>>>,
    pub created: Mutex<usize>,
}

impl FakeProvider {
    pub fn set_state(&self, provider_stream_id: &str, state: ProviderState) {
        self.states
            .lock()
            .unwrap()
            .insert(provider_stream_id.to_string(), Ok(state));
    }

    pub fn set_error(&self, provider_stream_id: &str, message: &str) {
        self.states
            .lock()
            .unwrap()
            .insert(provider_stream_id.to_string(), Err(message.to_string()));
    }
}

#[async_trait]
impl LiveProvider for FakeProvider {
    async fn create_live_stream(&self) -> Result<ProviderStream> {
        let mut created = self.created.lock().unwrap();
        *created += 1;
        Ok(ProviderStream {
            provider_stream_id: format!("mux-created-{}", *created),
            stream_key: Some("sk-live-123".to_string()),
            playback_url: Some("https://stream.example.com/pb.m3u8".to_string()),
        })
    }

    async fn stream_state(&self, provider_stream_id: &str) -> Result<ProviderState> {
        match self.states.lock().unwrap().get(provider_stream_id) {
            Some(Ok(state)) => Ok(state.clone()),
            Some(Err(message)) => Err(AppError::Provider(message.clone())),
            None => Ok(ProviderState::Idle),
        }
    }
}

/// Records every status notification
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(Uuid, StreamStatus, StreamStatus)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(Uuid, StreamStatus, StreamStatus)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusNotifier for RecordingNotifier {
    async fn stream_status_changed(
        &self,
        stream: &LiveStream,
        previous: StreamStatus,
    ) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((stream.id, previous, stream.status));
        Ok(())
    }
}

/// Notifier that always fails
pub struct FailingNotifier;

#[async_trait]
impl StatusNotifier for FailingNotifier {
    async fn stream_status_changed(
        &self,
        _stream: &LiveStream,
        _previous: StreamStatus,
    ) -> Result<()> {
        Err(AppError::Internal("redis down".to_string()))
    }
}

/// Archive that maps source URLs to a fixed CDN prefix
#[derive(Default)]
pub struct FakeArchive {
    pub archived: Mutex<Vec<String>>,
}

#[async_trait]
impl RecordingArchive for FakeArchive {
    async fn archive(&self, stream: &LiveStream, source_url: &str) -> Result<String> {
        self.archived.lock().unwrap().push(source_url.to_string());
        Ok(format!(
            "https://cdn.example.com/recordings/{}/{}.mp4",
            stream.artist_id, stream.id
        ))
    }
}

pub fn stream(
    provider: StreamProvider,
    provider_stream_id: &str,
    status: StreamStatus,
    started_at: Option<DateTime<Utc>>,
) -> LiveStream {
    let now = Utc::now();
    LiveStream {
        id: Uuid::new_v4(),
        artist_id: Uuid::new_v4(),
        title: "Album release show".to_string(),
        provider,
        provider_stream_id: provider_stream_id.to_string(),
        stream_key: Some("sk-secret".to_string()),
        playback_url: None,
        status,
        is_managed: true,
        scheduled_at: None,
        started_at,
        ended_at: None,
        duration_minutes: None,
        viewer_count: 0,
        peak_viewers: 0,
        recording_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStreamStore>,
    pub provider: Arc<FakeProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub archive: Arc<FakeArchive>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStreamStore::default()),
            provider: Arc::new(FakeProvider::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            archive: Arc::new(FakeArchive::default()),
        }
    }

    pub fn sync(&self) -> streaming_service::services::StatusSync {
        streaming_service::services::StatusSync::new(self.store.clone(), self.notifier.clone())
    }
}
