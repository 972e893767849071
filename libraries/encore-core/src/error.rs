/// Core error types for Encore
use thiserror::Error;
use crate::types::TrackId;

/// Result type alias using `EncoreError`
pub type Result<T> = std::result::Result<T, EncoreError>;

/// Core error type for Encore
///
/// Returned by collaborator implementations (catalog, transport).
#[derive(Error, Debug)]
pub enum EncoreError {
    /// Catalog query or mutation failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Media transport rejected a command
    #[error("Transport error: {0}")]
    Transport(String),

    /// Track not found
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),
}

impl EncoreError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
