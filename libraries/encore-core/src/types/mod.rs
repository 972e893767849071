mod ids;
mod track;
mod transport;

pub use ids::{TrackId, UserId};
pub use track::{MediaLocator, MediaMetadata, Palette, Track};
pub use transport::TransportState;
