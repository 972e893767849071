//! Encore Core
//!
//! Platform-agnostic types, traits, and error handling for the Encore player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `UserId`, `MediaLocator`
//! - **Collaborator Traits**: `Catalog` (song library), `Transport` (media player),
//!   `TransportObserver` (player callbacks)
//! - **Error Handling**: Unified `EncoreError` and `Result` types
//!
//! Storage and the platform media session live outside this workspace; they
//! plug in through the traits.
//!
//! # Example
//!
//! ```rust
//! use encore_core::types::{MediaLocator, Track, UserId};
//!
//! let user = UserId::new("alice");
//! let track = Track::new(
//!     1,
//!     user,
//!     "My Favorite Song",
//!     "Some Artist",
//!     MediaLocator::Remote("https://cdn.example/1.mp3".to_string()),
//! );
//! assert_eq!(track.audio.to_uri(), "https://cdn.example/1.mp3");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types
pub use error::{EncoreError, Result};
pub use traits::{Catalog, Transport, TransportObserver};
pub use types::{
    MediaLocator, MediaMetadata, Palette, Track, TrackId, TransportState, UserId,
};
