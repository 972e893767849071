/// Media transport state types
use serde::{Deserialize, Serialize};

/// Playback state reported by a media transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// Nothing loaded
    #[default]
    Idle,

    /// Loading or waiting for data
    Buffering,

    /// Able to play from the current position
    Ready,

    /// Reached the end of the loaded media
    Ended,
}

impl TransportState {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Buffering => "buffering",
            Self::Ready => "ready",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
