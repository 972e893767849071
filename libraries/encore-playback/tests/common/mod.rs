//! Shared helpers for engine integration tests

#![allow(dead_code)]

use encore_core::testing::{FakeTransport, MemoryCatalog};
use encore_core::{MediaLocator, Track, TrackId, UserId};
use encore_playback::{EngineConfig, PlaybackEngine};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn user() -> UserId {
    UserId::new("alice")
}

pub fn track_for(user: &UserId, id: i64) -> Track {
    Track::new(
        id,
        user.clone(),
        format!("Track {}", id),
        "Test Artist",
        MediaLocator::Remote(format!("https://cdn.example/{}.mp3", id)),
    )
}

pub fn track(id: i64) -> Track {
    track_for(&user(), id)
}

/// Library listing with IDs `0..len`, in listing order
pub fn library(len: i64) -> Vec<Track> {
    (0..len).map(track).collect()
}

pub fn ids(tracks: &[Track]) -> Vec<i64> {
    tracks.iter().map(|t| t.id.get()).collect()
}

pub fn id(raw: i64) -> TrackId {
    TrackId::new(raw)
}

pub struct Harness {
    pub engine: PlaybackEngine,
    pub catalog: Arc<MemoryCatalog>,
    pub transport: Arc<FakeTransport>,
}

impl Harness {
    /// Engine over a library of `len` tracks, no user signed in
    pub fn new(len: i64) -> Self {
        Self::with_config(len, EngineConfig::default())
    }

    pub fn with_config(len: i64, config: EngineConfig) -> Self {
        init_tracing();

        let catalog = Arc::new(MemoryCatalog::new(library(len)));
        let transport = Arc::new(FakeTransport::new());
        let engine = PlaybackEngine::spawn(config, catalog.clone(), transport.clone())
            .expect("valid config");
        transport.attach(Arc::new(engine.transport_listener()));

        Self {
            engine,
            catalog,
            transport,
        }
    }

    /// Engine with `user()` signed in and the queue seeded
    pub async fn seeded(len: i64) -> Self {
        let harness = Self::new(len);
        harness.engine.set_user(Some(user())).await.unwrap();
        harness.engine.initialize_queue().await.unwrap();
        harness
    }

    pub fn queue(&self) -> Vec<i64> {
        ids(&self.engine.signals().queue())
    }

    pub fn history(&self) -> Vec<i64> {
        ids(&self.engine.signals().history())
    }

    pub fn current(&self) -> Option<i64> {
        self.engine.signals().current_track().map(|t| t.id.get())
    }
}
