//! Observable engine state
//!
//! The engine publishes everything a presentation layer renders through
//! `tokio::sync::watch` channels: the latest value is always readable and
//! subscribers are woken on change.

use crate::session::Session;
use encore_core::{Track, TrackId, UserId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// Write side of the engine signals, owned by the engine task
#[derive(Debug)]
pub(crate) struct SignalPublisher {
    current_track: watch::Sender<Option<Track>>,
    is_playing: watch::Sender<bool>,
    position: watch::Sender<Duration>,
    duration: watch::Sender<Duration>,
    queue: watch::Sender<Vec<Track>>,
    history: watch::Sender<Vec<Track>>,
    repeat: watch::Sender<bool>,
    shuffle: watch::Sender<bool>,
}

/// Read side of the engine signals
///
/// Cheap to clone; every clone observes the same values.
#[derive(Debug, Clone)]
pub struct EngineSignals {
    current_track: watch::Receiver<Option<Track>>,
    is_playing: watch::Receiver<bool>,
    position: watch::Receiver<Duration>,
    duration: watch::Receiver<Duration>,
    queue: watch::Receiver<Vec<Track>>,
    history: watch::Receiver<Vec<Track>>,
    repeat: watch::Receiver<bool>,
    shuffle: watch::Receiver<bool>,
}

// Only wake subscribers when the value actually changes
fn set<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

impl SignalPublisher {
    pub(crate) fn new() -> (Self, EngineSignals) {
        let (current_track, current_track_rx) = watch::channel(None);
        let (is_playing, is_playing_rx) = watch::channel(false);
        let (position, position_rx) = watch::channel(Duration::ZERO);
        let (duration, duration_rx) = watch::channel(Duration::ZERO);
        let (queue, queue_rx) = watch::channel(Vec::new());
        let (history, history_rx) = watch::channel(Vec::new());
        let (repeat, repeat_rx) = watch::channel(false);
        let (shuffle, shuffle_rx) = watch::channel(false);

        let publisher = Self {
            current_track,
            is_playing,
            position,
            duration,
            queue,
            history,
            repeat,
            shuffle,
        };
        let signals = EngineSignals {
            current_track: current_track_rx,
            is_playing: is_playing_rx,
            position: position_rx,
            duration: duration_rx,
            queue: queue_rx,
            history: history_rx,
            repeat: repeat_rx,
            shuffle: shuffle_rx,
        };
        (publisher, signals)
    }

    /// Republish the session projections
    pub(crate) fn publish_session(&self, session: &Session) {
        set(&self.current_track, session.current().cloned());
        set(&self.queue, session.queue().to_vec());
        set(&self.history, session.history().to_vec());
        set(&self.repeat, session.repeat());
        set(&self.shuffle, session.shuffle());
    }

    pub(crate) fn publish_playing(&self, is_playing: bool) {
        set(&self.is_playing, is_playing);
    }

    pub(crate) fn publish_progress(&self, position: Duration, duration: Duration) {
        set(&self.position, position);
        set(&self.duration, duration);
    }

    /// Back to "nothing loaded"
    pub(crate) fn reset_playback(&self) {
        self.publish_playing(false);
        self.publish_progress(Duration::ZERO, Duration::ZERO);
    }

    pub(crate) fn snapshot(&self, session: &Session) -> PlaybackSnapshot {
        PlaybackSnapshot {
            user_id: session.user_id().cloned(),
            current_track_id: session.current().map(|t| t.id),
            is_playing: *self.is_playing.borrow(),
            position_ms: duration_ms(*self.position.borrow()),
            duration_ms: duration_ms(*self.duration.borrow()),
            queue: session.queue().to_vec().iter().map(|t| t.id).collect(),
            history: session.history().iter().map(|t| t.id).collect(),
            repeat: session.repeat(),
            shuffle: session.shuffle(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl EngineSignals {
    /// Currently loaded track
    pub fn current_track(&self) -> Option<Track> {
        self.current_track.borrow().clone()
    }

    /// Whether the transport is playing
    pub fn is_playing(&self) -> bool {
        *self.is_playing.borrow()
    }

    /// Last sampled playhead position
    pub fn position(&self) -> Duration {
        *self.position.borrow()
    }

    /// Duration of the loaded track (zero when unknown)
    pub fn duration(&self) -> Duration {
        *self.duration.borrow()
    }

    /// Upcoming tracks: user queue followed by system queue
    pub fn queue(&self) -> Vec<Track> {
        self.queue.borrow().clone()
    }

    /// Played tracks, most recent first
    pub fn history(&self) -> Vec<Track> {
        self.history.borrow().clone()
    }

    /// Repeat-one flag
    pub fn repeat(&self) -> bool {
        *self.repeat.borrow()
    }

    /// Shuffle flag
    pub fn shuffle(&self) -> bool {
        *self.shuffle.borrow()
    }

    /// Subscribe to current track changes
    pub fn watch_current_track(&self) -> watch::Receiver<Option<Track>> {
        self.current_track.clone()
    }

    /// Subscribe to play/pause changes
    pub fn watch_is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing.clone()
    }

    /// Subscribe to position samples
    pub fn watch_position(&self) -> watch::Receiver<Duration> {
        self.position.clone()
    }

    /// Subscribe to duration changes
    pub fn watch_duration(&self) -> watch::Receiver<Duration> {
        self.duration.clone()
    }

    /// Subscribe to queue changes
    pub fn watch_queue(&self) -> watch::Receiver<Vec<Track>> {
        self.queue.clone()
    }

    /// Subscribe to history changes
    pub fn watch_history(&self) -> watch::Receiver<Vec<Track>> {
        self.history.clone()
    }

    /// Subscribe to the repeat flag
    pub fn watch_repeat(&self) -> watch::Receiver<bool> {
        self.repeat.clone()
    }

    /// Subscribe to the shuffle flag
    pub fn watch_shuffle(&self) -> watch::Receiver<bool> {
        self.shuffle.clone()
    }
}

/// Point-in-time projection of the engine, suitable for persisting or
/// handing to a UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Active user
    pub user_id: Option<UserId>,
    /// Current track, `None` when idle
    pub current_track_id: Option<TrackId>,
    /// Whether the transport is playing
    pub is_playing: bool,
    /// Last sampled position in milliseconds
    pub position_ms: u64,
    /// Track duration in milliseconds
    pub duration_ms: u64,
    /// Upcoming track IDs (user queue first)
    pub queue: Vec<TrackId>,
    /// Played track IDs, most recent first
    pub history: Vec<TrackId>,
    /// Repeat-one flag
    pub repeat: bool,
    /// Shuffle flag
    pub shuffle: bool,
}
