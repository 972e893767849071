//! Playback session state
//!
//! Everything the engine knows about one signed-in user's listening session:
//! current track, two-tier queue, history stack, and the repeat/shuffle flags.
//! Pure and synchronous; the engine actor owns the only instance and performs
//! all I/O around it.

use crate::config::EngineConfig;
use crate::error::{PlaybackError, Result};
use crate::history::History;
use crate::picker::{position_of, LinearPicker};
use crate::queue::PlayQueue;
use encore_core::{Track, TrackId, UserId};

/// Index the clear-queue refill walks from when the system queue is empty
const REFILL_START_INDEX: usize = 1;

/// Per-user playback session
#[derive(Debug, Clone)]
pub struct Session {
    user_id: Option<UserId>,
    current: Option<Track>,
    queue: PlayQueue,
    history: History,
    repeat: bool,
    shuffle: bool,
}

impl Session {
    /// Create an empty session with no user
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            user_id: None,
            current: None,
            queue: PlayQueue::new(config.queue_size),
            history: History::new(config.max_history_size),
            repeat: false,
            shuffle: false,
        }
    }

    // ===== User scope =====

    /// Active user
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Switch the active user
    ///
    /// A different user (or none) resets every container. Returns whether the
    /// scope changed.
    pub fn set_user(&mut self, user_id: Option<UserId>) -> bool {
        if self.user_id == user_id {
            return false;
        }
        self.reset();
        self.user_id = user_id;
        true
    }

    /// Clear all state, including the user scope
    pub fn reset(&mut self) {
        self.user_id = None;
        self.current = None;
        self.queue.clear();
        self.history.clear();
        self.repeat = false;
        self.shuffle = false;
    }

    // ===== Transitions =====

    /// Fill the system queue from the head of the library listing
    pub fn seed(&mut self, listing: &[Track]) -> usize {
        self.queue.seed(listing)
    }

    /// Make `track` current, pushing the outgoing track to history
    ///
    /// The history head never names the current track, including after the
    /// current track was unloaded or deleted.
    pub fn begin(&mut self, track: Track) {
        if let Some(outgoing) = self.current.take() {
            self.history.record(outgoing, track.id);
        }
        if self.history.peek().is_some_and(|head| head.id == track.id) {
            self.history.pop();
        }
        self.current = Some(track);
    }

    /// Pop the next track to play (user queue first)
    pub fn take_next(&mut self) -> Option<Track> {
        self.queue.pop_next()
    }

    /// Step back into history
    ///
    /// The current track goes back to the head of the system queue; the
    /// popped history entry becomes current and is returned.
    pub fn step_back(&mut self) -> Option<Track> {
        let previous = self.history.pop()?;
        if let Some(current) = self.current.take() {
            self.queue.push_front_system(current);
        }
        self.current = Some(previous.clone());
        Some(previous)
    }

    /// Drop the current track without recording it (deleted from library)
    pub fn unload_current(&mut self) -> Option<Track> {
        self.current.take()
    }

    // ===== Queue editing =====

    /// Append to the user queue. Returns evicted system tracks.
    pub fn enqueue(&mut self, track: Track) -> usize {
        self.queue.enqueue(track)
    }

    /// Insert at the head of the user queue. Returns evicted system tracks.
    pub fn enqueue_next(&mut self, track: Track) -> usize {
        self.queue.enqueue_next(track)
    }

    /// Remove the first equal track from the system queue
    pub fn remove_queued(&mut self, track: &Track) -> bool {
        self.queue.remove(track)
    }

    /// Move a system queue entry
    pub fn move_queued(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.reorder(from, to)
    }

    /// Empty the user queue
    pub fn clear_user_queue(&mut self) {
        self.queue.clear_user();
    }

    /// Append one picked track to the system queue
    ///
    /// The seed is the last system track, or `fallback` when the system queue
    /// is empty. Does nothing when the queue is already at capacity.
    pub fn top_up(
        &mut self,
        listing: &[Track],
        fallback: &Track,
        picker: &LinearPicker,
    ) -> Result<Option<TrackId>> {
        if !self.queue.has_room() {
            return Ok(None);
        }

        let seed = self.queue.last_system().unwrap_or(fallback).id;
        let picked = picker.pick_after(listing, seed)?.clone();
        let id = picked.id;
        self.queue.push_back_system(picked);
        Ok(Some(id))
    }

    /// Refill the system queue up to capacity by walking the listing
    ///
    /// Returns the number of tracks appended. An empty listing is a no-op.
    pub fn refill(&mut self, listing: &[Track], picker: &LinearPicker) -> Result<usize> {
        if listing.is_empty() {
            return Ok(0);
        }

        let start = match self.queue.last_system() {
            Some(last) => {
                position_of(listing, last.id).ok_or(PlaybackError::SeedNotFound(last.id))?
            }
            None => REFILL_START_INDEX,
        };

        let room = self.queue.capacity().saturating_sub(self.queue.len());
        let picked: Vec<Track> = picker.walk(listing, start, room).cloned().collect();
        let count = picked.len();
        for track in picked {
            self.queue.push_back_system(track);
        }
        Ok(count)
    }

    // ===== Reconciliation =====

    /// Every copy of a track held by the session, mutable
    fn copies_mut(&mut self, id: TrackId) -> impl Iterator<Item = &mut Track> {
        self.current
            .iter_mut()
            .chain(self.queue.iter_mut())
            .chain(self.history.iter_mut())
            .filter(move |t| t.id == id)
    }

    /// Flip the liked flag of the current track everywhere
    ///
    /// Returns the track ID and its new flag.
    pub fn toggle_liked(&mut self) -> Option<(TrackId, bool)> {
        let current = self.current.as_ref()?;
        let id = current.id;
        let liked = !current.liked;
        self.set_liked(id, liked);
        Some((id, liked))
    }

    /// Set the liked flag on every copy of a track. Returns copies touched.
    pub fn set_liked(&mut self, id: TrackId, liked: bool) -> usize {
        let mut touched = 0;
        for track in self.copies_mut(id) {
            track.liked = liked;
            touched += 1;
        }
        touched
    }

    /// Replace every copy of a track with its edited version
    pub fn replace(&mut self, updated: &Track) -> usize {
        let mut touched = 0;
        for track in self.copies_mut(updated.id) {
            track.clone_from(updated);
            touched += 1;
        }
        touched
    }

    /// Newly added track goes to the head of the system queue
    ///
    /// Tracks owned by another user are ignored.
    pub fn insert_new(&mut self, track: Track) -> bool {
        if self.user_id.as_ref() != Some(&track.user_id) {
            return false;
        }
        self.queue.push_front_system(track);
        true
    }

    /// Remove every queued and historic copy of a deleted track
    ///
    /// Returns the current track if it was the deleted one.
    pub fn remove_everywhere(&mut self, id: TrackId) -> Option<Track> {
        self.queue.retain(|t| t.id != id);
        self.history.retain(|t| t.id != id);
        if self.current.as_ref().is_some_and(|t| t.id == id) {
            self.current.take()
        } else {
            None
        }
    }

    // ===== Flags =====

    /// Flip repeat-one. Returns the new value.
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    /// Turn repeat-one off
    pub fn clear_repeat(&mut self) {
        self.repeat = false;
    }

    /// Flip shuffle. Returns the new value.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    // ===== State Queries =====

    /// Currently loaded track
    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// The two-tier queue
    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    /// History stack
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Repeat-one flag
    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Shuffle flag
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::MediaLocator;

    fn user() -> UserId {
        UserId::new("user")
    }

    fn track(id: i64) -> Track {
        Track::new(
            id,
            user(),
            format!("Track {}", id),
            "Artist",
            MediaLocator::Remote(format!("https://cdn.example/{}.mp3", id)),
        )
    }

    fn library(ids: &[i64]) -> Vec<Track> {
        ids.iter().map(|&id| track(id)).collect()
    }

    fn queue_ids(session: &Session) -> Vec<i64> {
        session.queue().to_vec().iter().map(|t| t.id.get()).collect()
    }

    fn history_ids(session: &Session) -> Vec<i64> {
        session.history().iter().map(|t| t.id.get()).collect()
    }

    fn session() -> Session {
        let mut session = Session::new(&EngineConfig::default());
        session.set_user(Some(user()));
        session
    }

    #[test]
    fn advance_and_top_up_follow_listing() {
        // Library A..G as 0..6
        let listing = library(&[0, 1, 2, 3, 4, 5, 6]);
        let picker = LinearPicker::default();
        let mut session = session();
        session.seed(&listing);
        assert_eq!(queue_ids(&session), vec![0, 1, 2, 3, 4]);

        let next = session.take_next().unwrap();
        session.begin(next.clone());
        assert_eq!(queue_ids(&session), vec![1, 2, 3, 4]);

        // Seed is E (index 4): (1 * 4 + 1) mod 7 = 5 -> F
        let picked = session.top_up(&listing, &next, &picker).unwrap();
        assert_eq!(picked, Some(TrackId::new(5)));
        assert_eq!(queue_ids(&session), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn top_up_uses_fallback_when_system_empty() {
        let listing = library(&[0, 1, 2]);
        let mut session = session();

        let picked = session
            .top_up(&listing, &track(2), &LinearPicker::default())
            .unwrap();
        assert_eq!(picked, Some(TrackId::new(0)));
    }

    #[test]
    fn top_up_skipped_at_capacity() {
        let listing = library(&[0, 1, 2, 3, 4, 5]);
        let mut session = session();
        session.seed(&listing);

        let picked = session
            .top_up(&listing, &track(0), &LinearPicker::default())
            .unwrap();
        assert_eq!(picked, None);
        assert_eq!(session.queue().len(), 5);
    }

    #[test]
    fn top_up_with_unknown_seed_leaves_queue() {
        let mut session = session();
        session.seed(&library(&[7, 8]));
        let result = session.top_up(&library(&[0, 1]), &track(7), &LinearPicker::default());

        assert!(matches!(result, Err(PlaybackError::SeedNotFound(_))));
        assert_eq!(queue_ids(&session), vec![7, 8]);
    }

    #[test]
    fn begin_records_outgoing() {
        let mut session = session();
        session.begin(track(1));
        session.begin(track(2));
        session.begin(track(3));

        assert_eq!(session.current().unwrap().id, TrackId::new(3));
        assert_eq!(history_ids(&session), vec![2, 1]);
    }

    #[test]
    fn replaying_current_does_not_touch_history() {
        let mut session = session();
        session.begin(track(1));
        session.begin(track(1));
        assert!(session.history().is_empty());
    }

    #[test]
    fn replaying_after_delete_drops_matching_history_head() {
        let mut session = session();
        session.begin(track(2));
        session.begin(track(3));
        assert_eq!(history_ids(&session), vec![2]);

        session.remove_everywhere(TrackId::new(3));
        assert!(session.current().is_none());

        session.begin(track(2));
        assert_eq!(session.current().unwrap().id, TrackId::new(2));
        assert!(session.history().is_empty());
    }

    #[test]
    fn step_back_requeues_current() {
        let mut session = session();
        session.seed(&library(&[5, 6]));
        session.begin(track(1));
        session.begin(track(2));

        let previous = session.step_back().unwrap();
        assert_eq!(previous.id, TrackId::new(1));
        assert_eq!(session.current().unwrap().id, TrackId::new(1));
        assert_eq!(queue_ids(&session), vec![2, 5, 6]);
        assert!(session.history().is_empty());
    }

    #[test]
    fn step_back_without_history() {
        let mut session = session();
        session.begin(track(1));
        assert!(session.step_back().is_none());
        assert_eq!(session.current().unwrap().id, TrackId::new(1));
    }

    #[test]
    fn refill_walks_from_last_queued() {
        let listing = library(&[0, 1, 2, 3, 4, 5, 6]);
        let mut session = session();
        session.seed(&library(&[3]));

        let added = session.refill(&listing, &LinearPicker::default()).unwrap();
        assert_eq!(added, 4);
        assert_eq!(queue_ids(&session), vec![3, 4, 5, 6, 0]);
    }

    #[test]
    fn refill_empty_queue_starts_after_index_one() {
        let listing = library(&[0, 1, 2, 3, 4, 5, 6]);
        let mut session = session();

        session.refill(&listing, &LinearPicker::default()).unwrap();
        assert_eq!(queue_ids(&session), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn refill_empty_library_is_noop() {
        let mut session = session();
        assert_eq!(session.refill(&[], &LinearPicker::default()).unwrap(), 0);
        assert!(session.queue().is_empty());
    }

    #[test]
    fn liked_flag_propagates_to_every_copy() {
        let mut session = session();
        session.seed(&library(&[1, 2]));
        session.enqueue(track(1));
        session.begin(track(1));
        session.begin(track(3));
        session.begin(track(1));

        let (id, liked) = session.toggle_liked().unwrap();
        assert_eq!(id, TrackId::new(1));
        assert!(liked);

        assert!(session.current().unwrap().liked);
        assert!(session.queue().to_vec().iter().filter(|t| t.id == id).all(|t| t.liked));
        assert!(session.history().iter().filter(|t| t.id == id).all(|t| t.liked));
        assert!(!session.queue().to_vec().iter().any(|t| t.id != id && t.liked));
    }

    #[test]
    fn toggle_liked_without_current() {
        let mut session = session();
        assert!(session.toggle_liked().is_none());
    }

    #[test]
    fn replace_updates_copies() {
        let mut session = session();
        session.seed(&library(&[1, 2]));
        let mut edited = track(2);
        edited.title = "Renamed".to_string();

        assert_eq!(session.replace(&edited), 1);
        assert_eq!(session.queue().to_vec()[1].title, "Renamed");
    }

    #[test]
    fn insert_new_respects_owner() {
        let mut session = session();
        session.seed(&library(&[1, 2, 3, 4, 5]));

        assert!(session.insert_new(track(9)));
        assert_eq!(queue_ids(&session), vec![9, 1, 2, 3, 4]);

        let mut foreign = track(10);
        foreign.user_id = UserId::new("someone-else");
        assert!(!session.insert_new(foreign));
    }

    #[test]
    fn remove_everywhere_reports_current() {
        let mut session = session();
        session.seed(&library(&[1, 2]));
        session.begin(track(2));
        session.begin(track(3));

        assert!(session.remove_everywhere(TrackId::new(2)).is_none());
        assert_eq!(queue_ids(&session), vec![1]);
        assert!(session.history().is_empty());

        let removed = session.remove_everywhere(TrackId::new(3)).unwrap();
        assert_eq!(removed.id, TrackId::new(3));
        assert!(session.current().is_none());
    }

    #[test]
    fn switching_user_resets() {
        let mut session = session();
        session.seed(&library(&[1, 2]));
        session.begin(track(3));
        session.toggle_repeat();

        assert!(!session.set_user(Some(user())));
        assert!(session.set_user(Some(UserId::new("other"))));
        assert!(session.current().is_none());
        assert!(session.queue().is_empty());
        assert!(!session.repeat());
        assert_eq!(session.user_id(), Some(&UserId::new("other")));
    }
}
