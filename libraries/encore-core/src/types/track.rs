/// Track domain type
use crate::types::{TrackId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a piece of media (audio or artwork) can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum MediaLocator {
    /// File on the device (downloaded or imported)
    Local(PathBuf),

    /// Streamable URL on the server
    Remote(String),
}

impl MediaLocator {
    /// URI form handed to media players
    pub fn to_uri(&self) -> String {
        match self {
            Self::Local(path) => format!("file://{}", path.display()),
            Self::Remote(url) => url.clone(),
        }
    }

    /// Check if the media is available without network access
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

/// Color pair extracted from artwork, used by themed UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Palette {
    /// Dominant color (ARGB)
    pub primary: u32,

    /// Accent color (ARGB)
    pub secondary: u32,
}

/// Audio track
///
/// Value type: every container in the playback engine holds its own copy.
/// Equality compares every field; lookups across containers go through `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Local catalog identifier
    pub id: TrackId,

    /// Identifier on the server (tracks that were never uploaded have none)
    pub server_id: Option<String>,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Artwork locator
    pub image: Option<MediaLocator>,

    /// Audio locator
    pub audio: MediaLocator,

    /// Whether the owner liked this track
    pub liked: bool,

    /// Themed UI colors
    pub palette: Option<Palette>,

    /// Owning user
    pub user_id: UserId,

    /// When the track last started playing
    pub last_played_at: Option<DateTime<Utc>>,

    /// Whether the audio has been downloaded to the device
    pub downloaded: bool,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(
        id: i64,
        user_id: UserId,
        title: impl Into<String>,
        artist: impl Into<String>,
        audio: MediaLocator,
    ) -> Self {
        let downloaded = audio.is_local();
        Self {
            id: TrackId::new(id),
            server_id: None,
            title: title.into(),
            artist: artist.into(),
            image: None,
            audio,
            liked: false,
            palette: None,
            user_id,
            last_played_at: None,
            downloaded,
        }
    }

    /// Player-facing metadata for this track
    pub fn media_metadata(&self) -> MediaMetadata {
        MediaMetadata {
            title: self.title.clone(),
            artist: self.artist.clone(),
            artwork: self.image.clone(),
        }
    }
}

/// Metadata shown by the media session while a track is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Artwork locator
    pub artwork: Option<MediaLocator>,
}
