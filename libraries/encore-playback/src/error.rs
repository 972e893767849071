//! Error types for playback management

use encore_core::{EncoreError, TrackId};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The engine task has shut down
    #[error("Playback engine stopped")]
    EngineStopped,

    /// No user is signed in
    #[error("No active user")]
    NoActiveUser,

    /// The user's library has no tracks
    #[error("Library is empty")]
    EmptyLibrary,

    /// Seed track is missing from the freshly fetched library listing
    #[error("Seed track {0} not found in library listing")]
    SeedNotFound(TrackId),

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Collaborator failure
    #[error(transparent)]
    Core(#[from] EncoreError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
