//! Playback engine
//!
//! [`PlaybackEngine`] is a handle to a task that owns all queue/history state.
//! Every operation is a message to that task, so mutations are serialized
//! without locks. Background catalog work re-enters the task when it
//! completes, which makes queue top-ups eventually (not immediately)
//! visible; [`PlaybackEngine::settle`] waits for them.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use encore_core::{Catalog, Transport, UserId};
//! # use encore_playback::{EngineConfig, PlaybackEngine};
//! # async fn demo(catalog: Arc<dyn Catalog>, transport: Arc<dyn Transport>) -> encore_playback::Result<()> {
//! let engine = PlaybackEngine::spawn(EngineConfig::default(), catalog, transport)?;
//! engine.set_user(Some(UserId::new("alice"))).await?;
//! engine.initialize_queue().await?;
//! engine.play_next_song().await?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod command;
mod poller;

use crate::config::EngineConfig;
use crate::error::{PlaybackError, Result};
use crate::signals::{EngineSignals, PlaybackSnapshot, SignalPublisher};
use actor::EngineActor;
use command::{Command, TransportEvent};
use encore_core::{Catalog, Track, TrackId, Transport, TransportObserver, TransportState, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Handle to a running playback engine
///
/// Clones share the same engine. The engine task exits when every handle is
/// dropped or [`shutdown`](Self::shutdown) is called; afterwards every
/// operation returns [`PlaybackError::EngineStopped`].
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    commands: mpsc::UnboundedSender<Command>,
    signals: EngineSignals,
}

impl PlaybackEngine {
    /// Validate `config` and start the engine task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        config: EngineConfig,
        catalog: Arc<dyn Catalog>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        let (commands, rx) = mpsc::unbounded_channel();
        let (publisher, signals) = SignalPublisher::new();
        let actor = EngineActor::new(config, catalog, transport, publisher, commands.downgrade());
        tokio::spawn(actor.run(rx));

        Ok(Self { commands, signals })
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| PlaybackError::EngineStopped)?;
        rx.await.map_err(|_| PlaybackError::EngineStopped)
    }

    /// Observable engine state
    pub fn signals(&self) -> &EngineSignals {
        &self.signals
    }

    /// Observer to register with the media transport
    pub fn transport_listener(&self) -> TransportListener {
        TransportListener {
            commands: self.commands.downgrade(),
        }
    }

    // ===== User scope =====

    /// Switch the active user
    ///
    /// A different user (or `None`) stops playback and resets the queues,
    /// history and flags. Returns whether the scope changed.
    pub async fn set_user(&self, user_id: Option<UserId>) -> Result<bool> {
        self.request(|reply| Command::SetUser { user_id, reply })
            .await
    }

    /// Seed the system queue from the head of the user's library
    ///
    /// Returns the number of tracks queued; 0 without an active user or with
    /// an empty library.
    pub async fn initialize_queue(&self) -> Result<usize> {
        self.request(|reply| Command::InitializeQueue { reply })
            .await
    }

    /// Stop playback and drop all session state, including the user
    pub async fn logout(&self) -> Result<()> {
        self.request(|reply| Command::Logout { reply }).await
    }

    // ===== Playback Control =====

    /// Play `track` now
    pub async fn play_song(&self, track: Track) -> Result<TrackId> {
        self.request(|reply| Command::PlaySong { track, reply })
            .await
    }

    /// Pause, resume, or start the queue when nothing is loaded
    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.request(|reply| Command::TogglePlayPause { reply })
            .await
    }

    /// Skip to the next queued track
    ///
    /// Returns `None` when there is no user or nothing left to play.
    pub async fn play_next_song(&self) -> Result<Option<TrackId>> {
        self.request(|reply| Command::PlayNext { reply }).await
    }

    /// Go back to the most recent history entry
    pub async fn play_previous_song(&self) -> Result<Option<TrackId>> {
        self.request(|reply| Command::PlayPrevious { reply })
            .await
    }

    /// Seek within the current track
    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        self.request(|reply| Command::SeekTo { position, reply })
            .await
    }

    /// Flip repeat-one. Returns the new value.
    pub async fn toggle_repeat(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleRepeat { reply })
            .await
    }

    /// Flip shuffle. Returns the new value.
    pub async fn toggle_shuffle(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleShuffle { reply })
            .await
    }

    // ===== Queue Management =====

    /// Append a track to the user queue
    pub async fn add_to_queue(&self, track: Track) -> Result<()> {
        self.add_all_to_queue(vec![track]).await
    }

    /// Append tracks to the user queue, in order
    pub async fn add_all_to_queue(&self, tracks: Vec<Track>) -> Result<()> {
        self.request(|reply| Command::AddToQueue { tracks, reply })
            .await
    }

    /// Insert a track at the head of the user queue
    pub async fn queue_next(&self, track: Track) -> Result<()> {
        self.request(|reply| Command::QueueNext { track, reply })
            .await
    }

    /// Remove the first equal track from the system queue
    pub async fn remove_from_queue(&self, track: Track) -> Result<bool> {
        self.request(|reply| Command::RemoveFromQueue { track, reply })
            .await
    }

    /// Move a system queue entry. Invalid or equal indices are ignored.
    pub async fn move_queue_item(&self, from: usize, to: usize) -> Result<bool> {
        self.request(|reply| Command::MoveQueueItem { from, to, reply })
            .await
    }

    /// Empty the user queue and refill the system queue from the library
    pub async fn clear_queue(&self) -> Result<()> {
        self.request(|reply| Command::ClearQueue { reply }).await
    }

    // ===== Library reconciliation =====

    /// Flip the liked flag of the current track
    ///
    /// Returns the new flag, or `None` when nothing is loaded.
    pub async fn toggle_liked_status(&self) -> Result<Option<bool>> {
        self.request(|reply| Command::ToggleLiked { reply })
            .await
    }

    /// A track was added to the library
    pub async fn notify_add_song(&self, track: Track) -> Result<()> {
        self.request(|reply| Command::NotifyAdd { track, reply })
            .await
    }

    /// A track was edited
    pub async fn notify_update_song(&self, track: Track) -> Result<()> {
        self.request(|reply| Command::NotifyUpdate { track, reply })
            .await
    }

    /// A track was deleted
    pub async fn notify_delete_song(&self, id: TrackId) -> Result<()> {
        self.request(|reply| Command::NotifyDelete { id, reply })
            .await
    }

    /// A track was liked or unliked outside the engine
    pub async fn notify_like_song(&self, id: TrackId, liked: bool) -> Result<()> {
        self.request(|reply| Command::NotifyLike { id, liked, reply })
            .await
    }

    // ===== Lifecycle =====

    /// Current state projection
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Wait until every background task dispatched so far has been applied
    pub async fn settle(&self) -> Result<()> {
        self.request(|reply| Command::Settle { reply }).await
    }

    /// Stop position polling and the engine task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Forwards media transport callbacks to the engine
///
/// Does not keep the engine alive.
#[derive(Debug, Clone)]
pub struct TransportListener {
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl TransportListener {
    fn forward(&self, event: TransportEvent) {
        if let Some(tx) = self.commands.upgrade() {
            let _ = tx.send(Command::Transport(event));
        }
    }
}

impl TransportObserver for TransportListener {
    fn on_is_playing_changed(&self, is_playing: bool) {
        self.forward(TransportEvent::IsPlayingChanged(is_playing));
    }

    fn on_playback_state_changed(&self, state: TransportState) {
        self.forward(TransportEvent::StateChanged(state));
    }
}
