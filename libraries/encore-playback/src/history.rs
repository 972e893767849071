//! Playback history tracking
//!
//! Maintains a bounded stack of played tracks for "previous" navigation

use encore_core::{Track, TrackId};
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// Most recent track sits at the front. Pushing beyond `max_size` discards
/// the oldest entry from the back.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = front)
    tracks: VecDeque<Track>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Record the track that stops being current
    ///
    /// Skipped when `outgoing` is the track about to become current (replay)
    /// or already the most recent entry. Returns whether the track was pushed.
    pub fn record(&mut self, outgoing: Track, incoming: TrackId) -> bool {
        if outgoing.id == incoming {
            return false;
        }
        if self.peek().is_some_and(|head| head.id == outgoing.id) {
            return false;
        }

        self.tracks.push_front(outgoing);
        self.tracks.truncate(self.max_size);
        true
    }

    /// Get most recent track (without removing)
    pub fn peek(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Pop most recent track from history
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Iterate from most recent to oldest
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.iter_mut()
    }

    /// Drop every entry for which `keep` returns false
    pub fn retain(&mut self, keep: impl FnMut(&Track) -> bool) {
        self.tracks.retain(keep);
    }

    /// Copy of the stack, most recent first
    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    /// Get number of tracks in history
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Get maximum history size
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(18)
    }
}
