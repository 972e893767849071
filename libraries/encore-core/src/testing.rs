//! In-memory collaborators for tests
//!
//! `MemoryCatalog` stands in for the persisted song library and `FakeTransport`
//! for the platform media session. Both record what the engine asked of them.

use crate::error::{EncoreError, Result};
use crate::traits::{Catalog, Transport, TransportObserver};
use crate::types::{MediaLocator, MediaMetadata, Track, TrackId, TransportState, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default duration reported for loaded media (3 minutes)
const DEFAULT_DURATION_MS: u64 = 180_000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Song library kept in memory, newest insertion first
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tracks: Mutex<Vec<Track>>,
    failing: Mutex<bool>,
}

impl MemoryCatalog {
    /// Create a catalog listing `tracks` in the given order
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: Mutex::new(tracks),
            failing: Mutex::new(false),
        }
    }

    /// Insert a track as the newest entry (head of the listing)
    pub fn insert(&self, track: Track) {
        lock(&self.tracks).insert(0, track);
    }

    /// Remove a track from the listing
    pub fn remove(&self, id: TrackId) -> Option<Track> {
        let mut tracks = lock(&self.tracks);
        let pos = tracks.iter().position(|t| t.id == id)?;
        Some(tracks.remove(pos))
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.failing) = failing;
    }

    /// Get a stored track by ID
    pub fn get(&self, id: TrackId) -> Option<Track> {
        lock(&self.tracks).iter().find(|t| t.id == id).cloned()
    }

    /// Stored liked flag of a track
    pub fn liked(&self, id: TrackId) -> Option<bool> {
        self.get(id).map(|t| t.liked)
    }

    /// Stored last-played timestamp of a track
    pub fn last_played(&self, id: TrackId) -> Option<DateTime<Utc>> {
        self.get(id).and_then(|t| t.last_played_at)
    }

    fn check(&self) -> Result<()> {
        if *lock(&self.failing) {
            Err(EncoreError::catalog("catalog unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn count_for_user(&self, user_id: &UserId) -> Result<usize> {
        self.check()?;
        Ok(lock(&self.tracks)
            .iter()
            .filter(|t| &t.user_id == user_id)
            .count())
    }

    async fn all_tracks_for_user(&self, user_id: &UserId) -> Result<Vec<Track>> {
        self.check()?;
        Ok(lock(&self.tracks)
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_last_played(&self, track_id: TrackId, at: DateTime<Utc>) -> Result<()> {
        self.check()?;
        let mut tracks = lock(&self.tracks);
        let track = tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .ok_or(EncoreError::TrackNotFound(track_id))?;
        track.last_played_at = Some(at);
        Ok(())
    }

    async fn update_liked(&self, track_id: TrackId, liked: bool) -> Result<()> {
        self.check()?;
        let mut tracks = lock(&self.tracks);
        let track = tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .ok_or(EncoreError::TrackNotFound(track_id))?;
        track.liked = liked;
        Ok(())
    }
}

/// Command received by a [`FakeTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// Media loaded (URI of the audio)
    Load(String),
    /// Play requested
    Play,
    /// Pause requested
    Pause,
    /// Stop requested
    Stop,
    /// Media unloaded
    Clear,
    /// Seek requested (milliseconds)
    Seek(u64),
}

#[derive(Debug, Default)]
struct FakeState {
    loaded: Option<(MediaLocator, MediaMetadata)>,
    playing: bool,
    state: TransportState,
    position_ms: u64,
    duration_ms: Option<u64>,
    calls: Vec<TransportCall>,
    rejecting: bool,
}

/// Scripted media transport
///
/// Loading media goes straight to `Ready`; `play`/`pause` flip the playing flag.
/// An attached observer receives the same notifications a real media session
/// would send.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
    observer: Mutex<Option<Arc<dyn TransportObserver>>>,
}

enum Notification {
    Playing(bool),
    State(TransportState),
}

impl FakeTransport {
    /// Create an idle transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Route state notifications to `observer`
    pub fn attach(&self, observer: Arc<dyn TransportObserver>) {
        *lock(&self.observer) = Some(observer);
    }

    /// Commands received so far
    pub fn calls(&self) -> Vec<TransportCall> {
        lock(&self.state).calls.clone()
    }

    /// Forget recorded commands
    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// URI of the loaded audio
    pub fn loaded_uri(&self) -> Option<String> {
        lock(&self.state)
            .loaded
            .as_ref()
            .map(|(audio, _)| audio.to_uri())
    }

    /// Session metadata of the loaded media
    pub fn loaded_metadata(&self) -> Option<MediaMetadata> {
        lock(&self.state).loaded.as_ref().map(|(_, m)| m.clone())
    }

    /// Move the playhead as if playback progressed
    pub fn set_position(&self, position_ms: u64) {
        lock(&self.state).position_ms = position_ms;
    }

    /// Override the reported duration
    pub fn set_duration(&self, duration_ms: Option<u64>) {
        lock(&self.state).duration_ms = duration_ms;
    }

    /// Reject `load` and `play` with a transport error (or accept them again)
    pub fn set_rejecting(&self, rejecting: bool) {
        lock(&self.state).rejecting = rejecting;
    }

    /// Report a state change without any command (e.g. network stall)
    pub fn report_state(&self, state: TransportState) {
        lock(&self.state).state = state;
        self.notify(vec![Notification::State(state)]);
    }

    /// Reach the end of the loaded media
    pub fn finish(&self) {
        let mut notifications = Vec::new();
        {
            let mut s = lock(&self.state);
            if s.playing {
                s.playing = false;
                notifications.push(Notification::Playing(false));
            }
            s.state = TransportState::Ended;
            s.position_ms = s.duration_ms.unwrap_or(0);
        }
        notifications.push(Notification::State(TransportState::Ended));
        self.notify(notifications);
    }

    fn set_playing(&self, call: TransportCall, playing: bool) {
        let changed = {
            let mut s = lock(&self.state);
            s.calls.push(call);
            if s.loaded.is_none() || s.playing == playing {
                false
            } else {
                s.playing = playing;
                true
            }
        };
        if changed {
            self.notify(vec![Notification::Playing(playing)]);
        }
    }

    fn unload(&self, call: TransportCall, keep_media: bool) {
        let mut notifications = Vec::new();
        {
            let mut s = lock(&self.state);
            s.calls.push(call);
            if s.playing {
                s.playing = false;
                notifications.push(Notification::Playing(false));
            }
            if !keep_media {
                s.loaded = None;
                s.duration_ms = None;
            }
            s.position_ms = 0;
            if s.state != TransportState::Idle {
                s.state = TransportState::Idle;
                notifications.push(Notification::State(TransportState::Idle));
            }
        }
        self.notify(notifications);
    }

    // Observer is called outside the state lock
    fn notify(&self, notifications: Vec<Notification>) {
        let observer = lock(&self.observer).clone();
        let Some(observer) = observer else {
            return;
        };
        for notification in notifications {
            match notification {
                Notification::Playing(playing) => observer.on_is_playing_changed(playing),
                Notification::State(state) => observer.on_playback_state_changed(state),
            }
        }
    }
}

impl Transport for FakeTransport {
    fn load(&self, audio: &MediaLocator, metadata: &MediaMetadata) -> Result<()> {
        let mut notifications = Vec::new();
        {
            let mut s = lock(&self.state);
            s.calls.push(TransportCall::Load(audio.to_uri()));
            if s.rejecting {
                return Err(EncoreError::transport("media session refused load"));
            }
            s.loaded = Some((audio.clone(), metadata.clone()));
            s.position_ms = 0;
            s.duration_ms = Some(DEFAULT_DURATION_MS);
            if s.playing {
                s.playing = false;
                notifications.push(Notification::Playing(false));
            }
            s.state = TransportState::Ready;
        }
        notifications.push(Notification::State(TransportState::Ready));
        self.notify(notifications);
        Ok(())
    }

    fn play(&self) -> Result<()> {
        {
            let mut s = lock(&self.state);
            if s.rejecting {
                s.calls.push(TransportCall::Play);
                return Err(EncoreError::transport("media session refused play"));
            }
            if s.state == TransportState::Ended {
                s.state = TransportState::Ready;
            }
        }
        self.set_playing(TransportCall::Play, true);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.set_playing(TransportCall::Pause, false);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.unload(TransportCall::Stop, true);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.unload(TransportCall::Clear, false);
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> Result<()> {
        let mut s = lock(&self.state);
        s.calls.push(TransportCall::Seek(position_ms));
        s.position_ms = position_ms;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    fn playback_state(&self) -> TransportState {
        lock(&self.state).state
    }

    fn position_ms(&self) -> u64 {
        lock(&self.state).position_ms
    }

    fn duration_ms(&self) -> Option<u64> {
        lock(&self.state).duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, user: &str) -> Track {
        Track::new(
            id,
            UserId::new(user),
            format!("Track {}", id),
            "Artist",
            MediaLocator::Remote(format!("https://cdn.example/{}.mp3", id)),
        )
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl TransportObserver for Recorder {
        fn on_is_playing_changed(&self, is_playing: bool) {
            lock(&self.events).push(format!("playing:{}", is_playing));
        }

        fn on_playback_state_changed(&self, state: TransportState) {
            lock(&self.events).push(format!("state:{}", state));
        }
    }

    #[tokio::test]
    async fn catalog_filters_by_user() {
        let catalog = MemoryCatalog::new(vec![track(1, "a"), track(2, "b"), track(3, "a")]);
        let user = UserId::new("a");

        assert_eq!(catalog.count_for_user(&user).await.unwrap(), 2);
        let ids: Vec<i64> = catalog
            .all_tracks_for_user(&user)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id.get())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn catalog_mutations_and_failures() {
        let catalog = MemoryCatalog::new(vec![track(1, "a")]);
        catalog.update_liked(TrackId::new(1), true).await.unwrap();
        assert_eq!(catalog.liked(TrackId::new(1)), Some(true));

        let missing = catalog.update_liked(TrackId::new(9), true).await;
        assert!(matches!(missing, Err(EncoreError::TrackNotFound(_))));

        catalog.set_failing(true);
        assert!(catalog.count_for_user(&UserId::new("a")).await.is_err());
    }

    #[test]
    fn transport_reports_to_observer() {
        let transport = FakeTransport::new();
        let recorder = Arc::new(Recorder::default());
        transport.attach(recorder.clone());

        let t = track(1, "a");
        transport.load(&t.audio, &t.media_metadata()).unwrap();
        transport.play().unwrap();
        transport.finish();

        let events = lock(&recorder.events).clone();
        assert_eq!(
            events,
            vec!["state:ready", "playing:true", "playing:false", "state:ended"]
        );
        assert_eq!(transport.position_ms(), DEFAULT_DURATION_MS);
    }

    #[test]
    fn rejecting_transport_keeps_previous_media() {
        let transport = FakeTransport::new();
        let first = track(1, "a");
        transport.load(&first.audio, &first.media_metadata()).unwrap();

        transport.set_rejecting(true);
        let second = track(2, "a");
        let load = transport.load(&second.audio, &second.media_metadata());
        assert!(matches!(load, Err(EncoreError::Transport(_))));
        assert!(matches!(transport.play(), Err(EncoreError::Transport(_))));
        assert!(!transport.is_playing());
        assert_eq!(transport.loaded_uri(), Some(first.audio.to_uri()));
        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Load(first.audio.to_uri()),
                TransportCall::Load(second.audio.to_uri()),
                TransportCall::Play,
            ]
        );
    }

    #[test]
    fn play_without_media_does_nothing() {
        let transport = FakeTransport::new();
        transport.play().unwrap();
        assert!(!transport.is_playing());
        assert_eq!(transport.calls(), vec![TransportCall::Play]);
    }
}
