//! Property-based tests for the playback session
//!
//! Uses proptest to drive the session through random operation sequences and
//! check the queue, history and like-propagation invariants after each step.

use encore_core::{MediaLocator, Track, TrackId, UserId};
use encore_playback::{EngineConfig, LinearPicker, Session};
use proptest::prelude::*;

// ===== Helpers =====

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

fn library(len: i64) -> Vec<Track> {
    (0..len).map(track).collect()
}

#[derive(Debug, Clone)]
enum Op {
    /// Advance, then apply the top-up the engine would schedule
    Next,
    Previous,
    Enqueue(i64),
    EnqueueNext(i64),
    Play(i64),
    ToggleLiked,
    Refill,
}

fn arbitrary_op(library_len: i64) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Next),
        1 => Just(Op::Previous),
        2 => (0..library_len).prop_map(Op::Enqueue),
        1 => (0..library_len).prop_map(Op::EnqueueNext),
        1 => (0..library_len).prop_map(Op::Play),
        1 => Just(Op::ToggleLiked),
        1 => Just(Op::Refill),
    ]
}

fn scenario() -> impl Strategy<Value = (i64, usize, Vec<Op>)> {
    (1i64..30, 1usize..8).prop_flat_map(|(len, queue_size)| {
        (
            Just(len),
            Just(queue_size),
            prop::collection::vec(arbitrary_op(len), 1..60),
        )
    })
}

fn apply(session: &mut Session, listing: &[Track], picker: &LinearPicker, op: &Op) {
    match op {
        Op::Next => {
            if let Some(next) = session.take_next() {
                session.begin(next.clone());
                session.top_up(listing, &next, picker).ok();
            }
        }
        Op::Previous => {
            session.step_back();
        }
        Op::Enqueue(id) => {
            session.enqueue(listing[*id as usize].clone());
        }
        Op::EnqueueNext(id) => {
            session.enqueue_next(listing[*id as usize].clone());
        }
        Op::Play(id) => session.begin(listing[*id as usize].clone()),
        Op::ToggleLiked => {
            session.toggle_liked();
        }
        Op::Refill => {
            session.clear_user_queue();
            session.refill(listing, picker).ok();
        }
    }
}

fn all_copies(session: &Session, id: TrackId) -> Vec<bool> {
    session
        .current()
        .into_iter()
        .chain(session.queue().user())
        .chain(session.queue().system())
        .chain(session.history().iter())
        .filter(|t| t.id == id)
        .map(|t| t.liked)
        .collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: system tracks never push the queue past capacity
    #[test]
    fn queue_capacity_respected((len, queue_size, ops) in scenario()) {
        let listing = library(len);
        let config = EngineConfig { queue_size, ..EngineConfig::default() };
        let picker = LinearPicker::default();
        let mut session = Session::new(&config);
        session.set_user(Some(user()));
        session.seed(&listing);

        for op in &ops {
            apply(&mut session, &listing, &picker, op);

            let queue = session.queue();
            // User tracks are never evicted; system tracks fill the remainder only
            prop_assert!(queue.system_len() <= queue_size.saturating_sub(queue.user_len()));
            prop_assert!(queue.len() <= queue_size.max(queue.user_len()));
        }
    }

    /// Property: history never exceeds its bound and never starts with the current track
    #[test]
    fn history_bounded((len, queue_size, ops) in scenario(), max_history in 1usize..20) {
        let listing = library(len);
        let config = EngineConfig {
            queue_size,
            max_history_size: max_history,
            ..EngineConfig::default()
        };
        let picker = LinearPicker::default();
        let mut session = Session::new(&config);
        session.set_user(Some(user()));
        session.seed(&listing);

        for op in &ops {
            apply(&mut session, &listing, &picker, op);

            prop_assert!(session.history().len() <= max_history);
            if let (Some(current), Some(head)) = (session.current(), session.history().peek()) {
                prop_assert_ne!(current.id, head.id);
            }
        }
    }

    /// Property: toggling liked leaves every copy of the track with the same flag
    #[test]
    fn like_propagates_to_every_copy((len, queue_size, ops) in scenario()) {
        let listing = library(len);
        let config = EngineConfig { queue_size, ..EngineConfig::default() };
        let picker = LinearPicker::default();
        let mut session = Session::new(&config);
        session.set_user(Some(user()));
        session.seed(&listing);

        for op in &ops {
            apply(&mut session, &listing, &picker, op);
        }

        if let Some((id, liked)) = session.toggle_liked() {
            let copies = all_copies(&session, id);
            prop_assert!(!copies.is_empty());
            prop_assert!(copies.iter().all(|&flag| flag == liked));
        }
    }

    /// Property: beginning the current track again leaves queue and history alone
    #[test]
    fn beginning_current_again_is_idempotent((len, queue_size, ops) in scenario(), replays in 1usize..10) {
        let listing = library(len);
        let config = EngineConfig { queue_size, ..EngineConfig::default() };
        let picker = LinearPicker::default();
        let mut session = Session::new(&config);
        session.set_user(Some(user()));
        session.seed(&listing);

        for op in &ops {
            apply(&mut session, &listing, &picker, op);
        }

        let queue_before = session.queue().to_vec();
        let history_before = session.history().to_vec();
        let current_before = session.current().map(|t| t.id);

        for _ in 0..replays {
            if let Some(current) = session.current().cloned() {
                session.begin(current);
            }
        }

        prop_assert_eq!(session.current().map(|t| t.id), current_before);
        prop_assert_eq!(session.queue().to_vec(), queue_before);
        prop_assert_eq!(session.history().to_vec(), history_before);
    }

    /// Property: the picker always lands inside the listing
    #[test]
    fn picker_stays_in_bounds(
        len in 1usize..500,
        index in 0usize..500,
        multiplier in 1u64..1000,
        increment in 0u64..1000,
    ) {
        let picker = LinearPicker::new(&encore_playback::PickerConfig { multiplier, increment });
        let next = picker.step(index % len, len);
        prop_assert!(matches!(next, Some(i) if i < len));
    }
}
