//! Encore Playback
//!
//! Queue/history engine for the Encore player.
//!
//! # Features
//!
//! - **Two-tier queue**: user-requested tracks drain before the engine's
//!   lookahead, sharing one capacity
//! - **History**: bounded most-recent-first stack behind "previous"
//! - **Next-track picker**: deterministic index walk over the library listing
//! - **Repeat-one / shuffle** flags
//! - **Transport sync**: drives a media transport and samples its playhead
//!   while playing
//! - **Observable state** through `tokio::sync::watch`
//!
//! # Example
//!
//! ```rust
//! use encore_core::{MediaLocator, Track, UserId};
//! use encore_playback::{EngineConfig, Session};
//!
//! let user = UserId::new("alice");
//! let library: Vec<Track> = (0..7)
//!     .map(|id| {
//!         Track::new(
//!             id,
//!             user.clone(),
//!             format!("Track {}", id),
//!             "Artist",
//!             MediaLocator::Remote(format!("https://cdn.example/{}.mp3", id)),
//!         )
//!     })
//!     .collect();
//!
//! let mut session = Session::new(&EngineConfig::default());
//! session.set_user(Some(user));
//! assert_eq!(session.seed(&library), 5);
//!
//! let next = session.take_next().unwrap();
//! session.begin(next);
//! assert_eq!(session.queue().len(), 4);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod picker;
pub mod queue;
pub mod session;
pub mod signals;

pub use config::{EngineConfig, PickerConfig};
pub use engine::{PlaybackEngine, TransportListener};
pub use error::{PlaybackError, Result};
pub use history::History;
pub use picker::LinearPicker;
pub use queue::PlayQueue;
pub use session::Session;
pub use signals::{EngineSignals, PlaybackSnapshot};
