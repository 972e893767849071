/// Core traits for Encore
use crate::error::Result;
use crate::types::{MediaLocator, MediaMetadata, Track, TrackId, TransportState, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Track catalog trait
///
/// Implementers expose the persisted song library of each user. The playback
/// engine shares one instance across background tasks, hence `Send + Sync`.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Count the tracks owned by a user
    async fn count_for_user(&self, user_id: &UserId) -> Result<usize>;

    /// Get every track owned by a user
    ///
    /// Ordering is the catalog's own (newest insertion first) and must be
    /// stable between calls; the next-track picker walks it by index.
    async fn all_tracks_for_user(&self, user_id: &UserId) -> Result<Vec<Track>>;

    /// Record when a track last started playing
    async fn set_last_played(&self, track_id: TrackId, at: DateTime<Utc>) -> Result<()>;

    /// Persist the liked flag of a track
    async fn update_liked(&self, track_id: TrackId, liked: bool) -> Result<()>;
}

/// Media transport trait
///
/// A media-session style player. Commands are fire-and-forget: the transport
/// reports the resulting state through a [`TransportObserver`].
///
/// Methods take `&self`; implementers use interior mutability so the engine and
/// the platform callback thread can share one instance.
pub trait Transport: Send + Sync {
    /// Load media and its session metadata, replacing whatever was loaded
    ///
    /// # Errors
    /// Returns an error if the player rejects the media
    fn load(&self, audio: &MediaLocator, metadata: &MediaMetadata) -> Result<()>;

    /// Start or resume playback
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self) -> Result<()>;

    /// Stop playback
    fn stop(&self) -> Result<()>;

    /// Unload media
    fn clear(&self) -> Result<()>;

    /// Seek within the loaded media
    fn seek(&self, position_ms: u64) -> Result<()>;

    /// Whether audio is currently audible
    fn is_playing(&self) -> bool;

    /// Current transport state
    fn playback_state(&self) -> TransportState;

    /// Current position in milliseconds
    fn position_ms(&self) -> u64;

    /// Duration of the loaded media in milliseconds, if known
    fn duration_ms(&self) -> Option<u64>;
}

/// Receiver of transport state notifications
///
/// Called from whatever thread the platform player uses.
pub trait TransportObserver: Send + Sync {
    /// Playing flag flipped
    fn on_is_playing_changed(&self, is_playing: bool);

    /// Transport moved to a new state
    fn on_playback_state_changed(&self, state: TransportState);
}
