//! Two-tier queue system
//!
//! - User queue: tracks explicitly queued ("add to queue", "play next")
//! - System queue: lookahead picked by the engine from the library
//!
//! Both tiers share one capacity. User tracks always win: growing the user
//! queue evicts from the tail of the system queue.

use crate::error::{PlaybackError, Result};
use encore_core::Track;
use std::collections::VecDeque;

/// Two-tier queue for playback
///
/// Structure:
/// ```text
/// Currently Playing: Track A
/// ─────────────────────────────
/// User Queue (drained first):
///   - Track B (add to queue)
///   - Track C (add to queue)
/// ─────────────────────────────
/// System Queue (lookahead):
///   - Track D
///   - Track E
/// ─────────────────────────────
/// len(user) + len(system) <= capacity
/// ```
#[derive(Debug, Clone)]
pub struct PlayQueue {
    /// Tracks explicitly queued by the user
    user: VecDeque<Track>,

    /// Tracks picked by the engine
    system: VecDeque<Track>,

    /// Target size of both tiers combined
    capacity: usize,
}

impl PlayQueue {
    /// Create new empty queue
    pub fn new(capacity: usize) -> Self {
        Self {
            user: VecDeque::new(),
            system: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the system queue with the head of `tracks`
    ///
    /// Takes as many tracks as fit next to the user queue. Returns how many.
    pub fn seed(&mut self, tracks: &[Track]) -> usize {
        let room = self.capacity.saturating_sub(self.user.len());
        self.system.clear();
        self.system.extend(tracks.iter().take(room).cloned());
        self.system.len()
    }

    /// Append track to the user queue
    ///
    /// Returns the number of system tracks evicted to make room.
    pub fn enqueue(&mut self, track: Track) -> usize {
        self.user.push_back(track);
        self.evict_overflow()
    }

    /// Put track at the head of the user queue (play next)
    pub fn enqueue_next(&mut self, track: Track) -> usize {
        self.user.push_front(track);
        self.evict_overflow()
    }

    /// Put track at the head of the system queue
    pub fn push_front_system(&mut self, track: Track) -> usize {
        self.system.push_front(track);
        self.evict_overflow()
    }

    /// Append track to the system queue
    pub fn push_back_system(&mut self, track: Track) {
        self.system.push_back(track);
    }

    // User tracks are never evicted; the system queue may drain to empty
    fn evict_overflow(&mut self) -> usize {
        let mut evicted = 0;
        while self.len() > self.capacity && self.system.pop_back().is_some() {
            evicted += 1;
        }
        evicted
    }

    /// Get next track to play
    ///
    /// Prioritizes user queue, then system queue.
    pub fn pop_next(&mut self) -> Option<Track> {
        self.user.pop_front().or_else(|| self.system.pop_front())
    }

    /// Remove the first system track equal to `track`
    pub fn remove(&mut self, track: &Track) -> bool {
        match self.system.iter().position(|t| t == track) {
            Some(pos) => self.system.remove(pos).is_some(),
            None => false,
        }
    }

    /// Reorder track within the system queue
    ///
    /// Moves track from `from_index` to `to_index`
    pub fn reorder(&mut self, from_index: usize, to_index: usize) -> Result<()> {
        let len = self.system.len();
        if from_index >= len {
            return Err(PlaybackError::IndexOutOfBounds(from_index));
        }
        if to_index >= len {
            return Err(PlaybackError::IndexOutOfBounds(to_index));
        }
        if from_index == to_index {
            return Err(PlaybackError::InvalidOperation(
                "Source and destination are the same".to_string(),
            ));
        }

        if let Some(track) = self.system.remove(from_index) {
            self.system.insert(to_index, track);
        }
        Ok(())
    }

    /// Drop every track for which `keep` returns false (both tiers)
    pub fn retain(&mut self, mut keep: impl FnMut(&Track) -> bool) {
        self.user.retain(&mut keep);
        self.system.retain(&mut keep);
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.user.iter_mut().chain(self.system.iter_mut())
    }

    /// Clear only the user queue
    pub fn clear_user(&mut self) {
        self.user.clear();
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.user.clear();
        self.system.clear();
    }

    /// Last track of the system queue (top-up seed)
    pub fn last_system(&self) -> Option<&Track> {
        self.system.back()
    }

    /// Merged projection: user queue followed by system queue
    pub fn to_vec(&self) -> Vec<Track> {
        self.user.iter().chain(self.system.iter()).cloned().collect()
    }

    /// System queue contents
    pub fn system(&self) -> impl Iterator<Item = &Track> {
        self.system.iter()
    }

    /// User queue contents
    pub fn user(&self) -> impl Iterator<Item = &Track> {
        self.user.iter()
    }

    /// Whether a top-up may append another system track
    pub fn has_room(&self) -> bool {
        self.len() < self.capacity
    }

    /// Total number of tracks in both tiers
    pub fn len(&self) -> usize {
        self.user.len() + self.system.len()
    }

    /// Number of system tracks
    pub fn system_len(&self) -> usize {
        self.system.len()
    }

    /// Number of user tracks
    pub fn user_len(&self) -> usize {
        self.user.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.system.is_empty()
    }

    /// Target size of both tiers combined
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
