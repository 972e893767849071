//! Next-track picker
//!
//! Walks the user's library listing by index: given the seed track's position
//! `i`, the next candidate is `(multiplier * i + increment) mod N`. With the
//! default constants (1, 1) this is a sequential walk that wraps around.
//! Listing order is the catalog's and is never re-sorted here.

use crate::config::PickerConfig;
use crate::error::{PlaybackError, Result};
use encore_core::{Track, TrackId};

/// Deterministic index walk over a library listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearPicker {
    multiplier: u64,
    increment: u64,
}

impl LinearPicker {
    /// Create a picker from configured constants
    pub fn new(config: &PickerConfig) -> Self {
        Self {
            multiplier: config.multiplier,
            increment: config.increment,
        }
    }

    /// Next index after `index` in a listing of `len` tracks
    ///
    /// Returns `None` for an empty listing.
    pub fn step(&self, index: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        let n = len as u128;
        let next = (u128::from(self.multiplier) * index as u128 + u128::from(self.increment)) % n;
        Some(next as usize)
    }

    /// Candidate that follows `seed` in `listing`
    pub fn pick_after<'a>(&self, listing: &'a [Track], seed: TrackId) -> Result<&'a Track> {
        if listing.is_empty() {
            return Err(PlaybackError::EmptyLibrary);
        }

        let index = position_of(listing, seed).ok_or(PlaybackError::SeedNotFound(seed))?;
        let next = self
            .step(index, listing.len())
            .ok_or(PlaybackError::EmptyLibrary)?;
        Ok(&listing[next])
    }

    /// Walk forward from `start`, yielding `count` candidates
    pub fn walk<'a>(
        &self,
        listing: &'a [Track],
        start: usize,
        count: usize,
    ) -> impl Iterator<Item = &'a Track> + 'a {
        let picker = *self;
        let len = listing.len();
        let mut index = start;
        (0..count).map_while(move |_| {
            index = picker.step(index, len)?;
            listing.get(index)
        })
    }
}

impl Default for LinearPicker {
    fn default() -> Self {
        Self::new(&PickerConfig::default())
    }
}

/// Index of a track in a listing, by ID
pub fn position_of(listing: &[Track], id: TrackId) -> Option<usize> {
    listing.iter().position(|t| t.id == id)
}
