//! Messages processed by the engine task

use crate::signals::PlaybackSnapshot;
use encore_core::{Track, TrackId, TransportState, UserId};
use std::time::Duration;
use tokio::sync::oneshot;

pub(crate) type Reply<T> = oneshot::Sender<T>;

/// Commands sent to the engine task
#[derive(Debug)]
pub(crate) enum Command {
    /// Switch the active user
    SetUser {
        user_id: Option<UserId>,
        reply: Reply<bool>,
    },

    /// Seed the system queue from the library
    InitializeQueue { reply: Reply<usize> },

    /// Play a specific track now
    PlaySong { track: Track, reply: Reply<TrackId> },

    /// Pause if playing, resume if paused, start the queue if idle
    TogglePlayPause { reply: Reply<()> },

    /// Skip forward
    PlayNext { reply: Reply<Option<TrackId>> },

    /// Step back into history
    PlayPrevious { reply: Reply<Option<TrackId>> },

    /// Append to the user queue
    AddToQueue { tracks: Vec<Track>, reply: Reply<()> },

    /// Insert at the head of the user queue
    QueueNext { track: Track, reply: Reply<()> },

    /// Remove from the system queue
    RemoveFromQueue { track: Track, reply: Reply<bool> },

    /// Reorder the system queue
    MoveQueueItem {
        from: usize,
        to: usize,
        reply: Reply<bool>,
    },

    /// Empty the user queue and refill the system queue
    ClearQueue { reply: Reply<()> },

    /// Flip the liked flag of the current track
    ToggleLiked { reply: Reply<Option<bool>> },

    /// A track was added to the library elsewhere
    NotifyAdd { track: Track, reply: Reply<()> },

    /// A track was edited elsewhere
    NotifyUpdate { track: Track, reply: Reply<()> },

    /// A track was deleted elsewhere
    NotifyDelete { id: TrackId, reply: Reply<()> },

    /// A track was liked or unliked elsewhere
    NotifyLike {
        id: TrackId,
        liked: bool,
        reply: Reply<()>,
    },

    /// Move the playhead
    SeekTo { position: Duration, reply: Reply<()> },

    /// Flip repeat-one
    ToggleRepeat { reply: Reply<bool> },

    /// Flip shuffle
    ToggleShuffle { reply: Reply<bool> },

    /// Sign out: stop playback and drop all session state
    Logout { reply: Reply<()> },

    /// Current state projection
    Snapshot { reply: Reply<PlaybackSnapshot> },

    /// Resolve once no background work is outstanding
    Settle { reply: Reply<()> },

    /// Stop the engine task
    Shutdown { reply: Reply<()> },

    /// Callback from the media transport
    Transport(TransportEvent),

    /// Position sampling tick
    PollPosition,

    /// A background task finished
    Background(BackgroundResult),
}

/// Media transport notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportEvent {
    IsPlayingChanged(bool),
    StateChanged(TransportState),
}

/// Outcome of background work, applied on the engine task
///
/// `epoch` is the session epoch at dispatch; results from an older epoch
/// are dropped.
#[derive(Debug)]
pub(crate) enum BackgroundResult {
    /// Library listing fetched for queue initialization
    Seeded {
        epoch: u64,
        /// `None` when the catalog could not be read
        tracks: Option<Vec<Track>>,
        reply: Reply<usize>,
    },

    /// Library listing fetched for a top-up after an advance
    ToppedUp {
        epoch: u64,
        fallback: Track,
        listing: Vec<Track>,
    },

    /// Library listing fetched for a clear-queue refill
    Refilled { epoch: u64, listing: Vec<Track> },

    /// Fire-and-forget work with nothing to apply
    Finished,
}
