//! Engine task
//!
//! Owns the [`Session`] exclusively. Commands are handled one at a time and
//! never await: catalog I/O is dispatched as background tasks whose results
//! come back through the same channel as [`BackgroundResult`]s.

use super::command::{BackgroundResult, Command, TransportEvent};
use super::poller::PositionPoller;
use crate::config::EngineConfig;
use crate::error::PlaybackError;
use crate::picker::LinearPicker;
use crate::session::Session;
use crate::signals::SignalPublisher;
use encore_core::{Catalog, Track, TrackId, Transport, TransportState, UserId};
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

pub(crate) struct EngineActor {
    session: Session,
    config: EngineConfig,
    picker: LinearPicker,
    catalog: Arc<dyn Catalog>,
    transport: Arc<dyn Transport>,
    publisher: SignalPublisher,

    /// Re-entry point for background tasks, transport callbacks and the poller
    commands: mpsc::WeakUnboundedSender<Command>,
    poller: Option<PositionPoller>,

    /// Bumped on logout and user switch
    epoch: u64,
    pending: usize,
    settle_waiters: Vec<oneshot::Sender<()>>,
}

impl EngineActor {
    pub(crate) fn new(
        config: EngineConfig,
        catalog: Arc<dyn Catalog>,
        transport: Arc<dyn Transport>,
        publisher: SignalPublisher,
        commands: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        Self {
            session: Session::new(&config),
            picker: LinearPicker::new(&config.picker),
            config,
            catalog,
            transport,
            publisher,
            commands,
            poller: None,
            epoch: 0,
            pending: 0,
            settle_waiters: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("Playback engine started");

        while let Some(command) = commands.recv().await {
            if self.handle(command).is_break() {
                break;
            }
        }

        self.poller = None;
        debug!("Playback engine stopped");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SetUser { user_id, reply } => {
                let _ = reply.send(self.set_user(user_id));
            }
            Command::InitializeQueue { reply } => self.initialize_queue(reply),
            Command::PlaySong { track, reply } => {
                let _ = reply.send(self.play_song(track));
            }
            Command::TogglePlayPause { reply } => {
                self.toggle_play_pause();
                let _ = reply.send(());
            }
            Command::PlayNext { reply } => {
                let _ = reply.send(self.play_next(false));
            }
            Command::PlayPrevious { reply } => {
                let _ = reply.send(self.play_previous());
            }
            Command::AddToQueue { tracks, reply } => {
                self.add_to_queue(tracks);
                let _ = reply.send(());
            }
            Command::QueueNext { track, reply } => {
                let evicted = self.session.enqueue_next(track);
                debug!("Queued next (evicted {} system tracks)", evicted);
                self.publish();
                let _ = reply.send(());
            }
            Command::RemoveFromQueue { track, reply } => {
                let removed = self.session.remove_queued(&track);
                if removed {
                    self.publish();
                }
                let _ = reply.send(removed);
            }
            Command::MoveQueueItem { from, to, reply } => {
                let moved = match self.session.move_queued(from, to) {
                    Ok(()) => {
                        self.publish();
                        true
                    }
                    Err(e) => {
                        debug!("Queue move {} -> {} ignored: {}", from, to, e);
                        false
                    }
                };
                let _ = reply.send(moved);
            }
            Command::ClearQueue { reply } => {
                self.clear_queue();
                let _ = reply.send(());
            }
            Command::ToggleLiked { reply } => {
                let _ = reply.send(self.toggle_liked());
            }
            Command::NotifyAdd { track, reply } => {
                self.notify_add(track);
                let _ = reply.send(());
            }
            Command::NotifyUpdate { track, reply } => {
                let touched = self.session.replace(&track);
                debug!("Track {} updated ({} copies)", track.id, touched);
                self.publish();
                let _ = reply.send(());
            }
            Command::NotifyDelete { id, reply } => {
                self.notify_delete(id);
                let _ = reply.send(());
            }
            Command::NotifyLike { id, liked, reply } => {
                self.session.set_liked(id, liked);
                self.publish();
                let _ = reply.send(());
            }
            Command::SeekTo { position, reply } => {
                let ms = u64::try_from(position.as_millis()).unwrap_or(u64::MAX);
                self.drive("seek", self.transport.seek(ms));
                let _ = reply.send(());
            }
            Command::ToggleRepeat { reply } => {
                let repeat = self.session.toggle_repeat();
                self.publish();
                let _ = reply.send(repeat);
            }
            Command::ToggleShuffle { reply } => {
                let shuffle = self.session.toggle_shuffle();
                self.publish();
                let _ = reply.send(shuffle);
            }
            Command::Logout { reply } => {
                self.logout();
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.publisher.snapshot(&self.session));
            }
            Command::Settle { reply } => {
                if self.pending == 0 {
                    let _ = reply.send(());
                } else {
                    self.settle_waiters.push(reply);
                }
            }
            Command::Shutdown { reply } => {
                info!("Shutting down playback engine");
                self.poller = None;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
            Command::Transport(event) => self.on_transport_event(event),
            Command::PollPosition => self.sample_position(),
            Command::Background(result) => self.apply_background(result),
        }

        ControlFlow::Continue(())
    }

    // ===== User scope =====

    fn set_user(&mut self, user_id: Option<UserId>) -> bool {
        let had_track = self.session.current().is_some();
        if !self.session.set_user(user_id) {
            return false;
        }

        match self.session.user_id() {
            Some(user) => info!("Active user set to {}", user),
            None => info!("Active user cleared"),
        }

        self.epoch += 1;
        if had_track {
            self.unload_transport();
        }
        self.publish();
        true
    }

    fn active_user(&self) -> Result<UserId, PlaybackError> {
        self.session
            .user_id()
            .cloned()
            .ok_or(PlaybackError::NoActiveUser)
    }

    fn initialize_queue(&mut self, reply: oneshot::Sender<usize>) {
        let user = match self.active_user() {
            Ok(user) => user,
            Err(e) => {
                debug!("Queue not initialized: {}", e);
                let _ = reply.send(0);
                return;
            }
        };

        let catalog = self.catalog.clone();
        let epoch = self.epoch;
        self.spawn_background(async move {
            let tracks = match fetch_library(catalog.as_ref(), &user).await {
                Ok(tracks) => Some(tracks),
                Err(e) => {
                    warn!("Failed to load library for {}: {}", user, e);
                    None
                }
            };
            BackgroundResult::Seeded {
                epoch,
                tracks,
                reply,
            }
        });
    }

    fn logout(&mut self) {
        info!("Logging out");
        self.epoch += 1;
        self.unload_transport();
        self.session.reset();
        self.publish();
    }

    // ===== Playback =====

    fn play_song(&mut self, track: Track) -> TrackId {
        let id = track.id;
        self.session.begin(track.clone());
        self.load_and_play(&track);
        self.publish();
        id
    }

    fn play_next(&mut self, auto: bool) -> Option<TrackId> {
        if auto && self.session.repeat() {
            if let Some(id) = self.session.current().map(|t| t.id) {
                debug!("Repeating track {}", id);
                self.drive("seek", self.transport.seek(0));
                self.drive("play", self.transport.play());
                return Some(id);
            }
        }

        if self.session.repeat() {
            self.session.clear_repeat();
            self.publish();
        }

        if let Err(e) = self.active_user() {
            debug!("Cannot advance: {}", e);
            return None;
        }

        let Some(next) = self.session.take_next() else {
            debug!("Queue exhausted");
            self.drive("pause", self.transport.pause());
            self.publish();
            return None;
        };

        debug!("Advancing to track {}", next.id);
        let id = self.play_song(next.clone());
        self.schedule_top_up(next);
        Some(id)
    }

    fn play_previous(&mut self) -> Option<TrackId> {
        let previous = self.session.step_back()?;
        debug!("Back to track {}", previous.id);
        self.load_and_play(&previous);
        self.publish();
        Some(previous.id)
    }

    fn toggle_play_pause(&mut self) {
        if self.session.current().is_none() {
            if !self.session.queue().is_empty() {
                self.play_next(false);
            }
            return;
        }

        if self.transport.is_playing() {
            self.drive("pause", self.transport.pause());
        } else {
            self.drive("play", self.transport.play());
        }
    }

    fn load_and_play(&mut self, track: &Track) {
        let metadata = track.media_metadata();
        self.drive("load", self.transport.load(&track.audio, &metadata));
        self.drive("play", self.transport.play());
        self.record_last_played(track.id);
        self.reconcile_polling();
    }

    fn unload_transport(&mut self) {
        self.poller = None;
        self.drive("stop", self.transport.stop());
        self.drive("clear", self.transport.clear());
        self.publisher.reset_playback();
    }

    fn drive(&self, op: &str, result: encore_core::Result<()>) {
        if let Err(e) = result {
            warn!("Transport {} failed: {}", op, e);
        }
    }

    // ===== Queue =====

    fn add_to_queue(&mut self, tracks: Vec<Track>) {
        let count = tracks.len();
        let evicted: usize = tracks
            .into_iter()
            .map(|track| self.session.enqueue(track))
            .sum();
        debug!("Queued {} tracks (evicted {} system tracks)", count, evicted);
        self.publish();
    }

    fn clear_queue(&mut self) {
        self.session.clear_user_queue();
        self.publish();

        let Ok(user) = self.active_user() else {
            return;
        };
        let catalog = self.catalog.clone();
        let epoch = self.epoch;
        self.spawn_background(async move {
            match catalog.all_tracks_for_user(&user).await {
                Ok(listing) => BackgroundResult::Refilled { epoch, listing },
                Err(e) => {
                    warn!("Failed to load library for refill: {}", e);
                    BackgroundResult::Finished
                }
            }
        });
    }

    fn schedule_top_up(&mut self, fallback: Track) {
        let Ok(user) = self.active_user() else {
            return;
        };
        let catalog = self.catalog.clone();
        let epoch = self.epoch;
        self.spawn_background(async move {
            match catalog.all_tracks_for_user(&user).await {
                Ok(listing) => BackgroundResult::ToppedUp {
                    epoch,
                    fallback,
                    listing,
                },
                Err(e) => {
                    warn!("Failed to load library for top-up: {}", e);
                    BackgroundResult::Finished
                }
            }
        });
    }

    // ===== Library reconciliation =====

    fn toggle_liked(&mut self) -> Option<bool> {
        let (id, liked) = self.session.toggle_liked()?;
        self.publish();

        let catalog = self.catalog.clone();
        self.spawn_background(async move {
            if let Err(e) = catalog.update_liked(id, liked).await {
                warn!("Failed to store liked flag for {}: {}", id, e);
            }
            BackgroundResult::Finished
        });
        Some(liked)
    }

    fn notify_add(&mut self, track: Track) {
        let id = track.id;
        if self.session.insert_new(track) {
            debug!("Track {} added to the system queue", id);
            self.publish();
        } else {
            debug!("Ignoring track {} of another user", id);
        }
    }

    fn notify_delete(&mut self, id: TrackId) {
        if self.session.remove_everywhere(id).is_some() {
            debug!("Current track {} deleted, unloading", id);
            self.unload_transport();
        }
        self.publish();
    }

    fn record_last_played(&mut self, id: TrackId) {
        let catalog = self.catalog.clone();
        self.spawn_background(async move {
            if let Err(e) = catalog.set_last_played(id, chrono::Utc::now()).await {
                warn!("Failed to record last played for {}: {}", id, e);
            }
            BackgroundResult::Finished
        });
    }

    // ===== Background work =====

    fn spawn_background<F>(&mut self, task: F)
    where
        F: Future<Output = BackgroundResult> + Send + 'static,
    {
        self.pending += 1;
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = task.await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::Background(result));
            }
        });
    }

    fn apply_background(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Seeded {
                epoch,
                tracks,
                reply,
            } => {
                let seeded = match tracks {
                    _ if epoch != self.epoch => {
                        debug!("Discarding stale queue initialization");
                        0
                    }
                    // Keep whatever the queue holds when there is nothing to seed from
                    None => 0,
                    Some(tracks) if tracks.is_empty() => {
                        debug!("Library is empty, queue left unchanged");
                        0
                    }
                    Some(tracks) => {
                        let seeded = self.session.seed(&tracks);
                        info!("Queue initialized with {} tracks", seeded);
                        self.publish();
                        seeded
                    }
                };
                let _ = reply.send(seeded);
            }
            BackgroundResult::ToppedUp {
                epoch,
                fallback,
                listing,
            } if epoch == self.epoch => {
                match self.session.top_up(&listing, &fallback, &self.picker) {
                    Ok(Some(id)) => {
                        debug!("Topped up queue with track {}", id);
                        self.publish();
                    }
                    Ok(None) => debug!("Queue full, top-up skipped"),
                    Err(e) => self.log_pick_failure("top-up", &e),
                }
            }
            BackgroundResult::Refilled { epoch, listing } if epoch == self.epoch => {
                match self.session.refill(&listing, &self.picker) {
                    Ok(added) => {
                        debug!("Refilled queue with {} tracks", added);
                        self.publish();
                    }
                    Err(e) => self.log_pick_failure("refill", &e),
                }
            }
            BackgroundResult::ToppedUp { .. } | BackgroundResult::Refilled { .. } => {
                debug!("Discarding stale queue update");
            }
            BackgroundResult::Finished => {}
        }

        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            for waiter in self.settle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    fn log_pick_failure(&self, what: &str, e: &PlaybackError) {
        match e {
            PlaybackError::SeedNotFound(_) => error!("Queue {} aborted: {}", what, e),
            _ => debug!("Queue {} skipped: {}", what, e),
        }
    }

    // ===== Transport synchronization =====

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::IsPlayingChanged(is_playing) => {
                self.publisher.publish_playing(is_playing);
            }
            TransportEvent::StateChanged(TransportState::Ended) => {
                debug!("Track ended");
                self.reconcile_polling();
                self.play_next(true);
            }
            TransportEvent::StateChanged(state) => {
                debug!("Transport state: {}", state);
            }
        }
        self.reconcile_polling();
    }

    /// Poll only while the transport is both playing and ready
    fn reconcile_polling(&mut self) {
        let active = self.transport.is_playing()
            && self.transport.playback_state() == TransportState::Ready;

        match (active, self.poller.is_some()) {
            (true, false) => {
                debug!("Position polling started");
                self.poller = Some(PositionPoller::start(
                    self.config.position_poll_interval(),
                    self.commands.clone(),
                ));
            }
            (false, true) => {
                debug!("Position polling stopped");
                self.poller = None;
            }
            _ => {}
        }
    }

    fn sample_position(&mut self) {
        if self.poller.is_none() {
            return;
        }
        let position = Duration::from_millis(self.transport.position_ms());
        let duration = Duration::from_millis(self.transport.duration_ms().unwrap_or(0));
        self.publisher.publish_progress(position, duration);
    }

    fn publish(&self) {
        self.publisher.publish_session(&self.session);
    }
}

async fn fetch_library(
    catalog: &dyn Catalog,
    user: &UserId,
) -> encore_core::Result<Vec<Track>> {
    let count = catalog.count_for_user(user).await?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut tracks = catalog.all_tracks_for_user(user).await?;
    tracks.truncate(count);
    Ok(tracks)
}
