//! Property-based tests for the queue controller
//!
//! Uses proptest to check cursor and queue invariants across random queues
//! and operation sequences.

mod common;

use cadence_playback::{PlayMode, PlaybackConfig, PlaybackError, Track};
use common::{create_track, harness, harness_with};
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

// ===== Helpers =====

fn arbitrary_track() -> impl Strategy<Value = Track> {
    (
        "[a-z0-9]{1,6}",   // id, collisions are intentional
        "[A-Za-z ]{1,30}", // title
        1u64..600,         // duration (1-600 seconds)
    )
        .prop_map(|(id, title, secs)| {
            let source = format!("/music/{}.mp3", id);
            Track::new(id, title, source, Duration::from_secs(secs))
        })
}

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec(arbitrary_track(), 1..40)
}

fn queue_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("t{}", i)).collect()
}

fn as_refs(ids: &[String]) -> Vec<&str> {
    ids.iter().map(String::as_str).collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: Queue never holds two tracks with the same id
    #[test]
    fn queue_ids_are_unique(batches in prop::collection::vec(arbitrary_tracks(), 1..4)) {
        let mut h = harness(&[]);
        for batch in batches {
            h.controller.replace_queue(batch, 0).unwrap();
        }

        let ids: HashSet<&str> = h.controller.queue().iter().map(|t| t.id.as_str()).collect();
        prop_assert_eq!(ids.len(), h.controller.queue().len());
    }

    /// Property: Loop advance visits every index exactly once per cycle
    #[test]
    fn loop_cycle_visits_every_index(len in 1usize..30, start in 0usize..30) {
        let ids = queue_ids(len);
        let mut h = harness(&as_refs(&ids));
        let start = start % len;
        h.controller.play_at(start).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..len {
            h.controller.advance().unwrap();
            seen.insert(h.controller.cursor());
        }

        prop_assert_eq!(seen.len(), len);
        prop_assert_eq!(h.controller.cursor(), start);
    }

    /// Property: Loop retreat undoes loop advance
    #[test]
    fn loop_retreat_inverts_advance(len in 1usize..30, steps in 1usize..50) {
        let ids = queue_ids(len);
        let mut h = harness(&as_refs(&ids));

        for _ in 0..steps {
            h.controller.advance().unwrap();
        }
        for _ in 0..steps {
            h.controller.retreat().unwrap();
        }

        prop_assert_eq!(h.controller.cursor(), 0);
    }

    /// Property: Repeat mode never moves the cursor
    #[test]
    fn repeat_never_moves(
        len in 1usize..20,
        start in 0usize..20,
        moves in prop::collection::vec(any::<bool>(), 1..30)
    ) {
        let ids = queue_ids(len);
        let mut h = harness(&as_refs(&ids));
        let start = start % len;
        h.controller.play_at(start).unwrap();
        h.controller.set_play_mode(PlayMode::Repeat);

        for forward in moves {
            if forward {
                h.controller.advance().unwrap();
            } else {
                h.controller.retreat().unwrap();
            }
            prop_assert_eq!(h.controller.cursor(), start);
        }
    }

    /// Property: Random mode always lands inside the queue
    #[test]
    fn random_stays_in_bounds(
        len in 1usize..25,
        seed in any::<u64>(),
        moves in prop::collection::vec(any::<bool>(), 1..50)
    ) {
        let config = PlaybackConfig {
            play_mode: PlayMode::Random,
            random_seed: Some(seed),
            ..Default::default()
        };
        let ids = queue_ids(len);
        let mut h = harness_with(&config, &as_refs(&ids));

        for forward in moves {
            if forward {
                h.controller.advance().unwrap();
            } else {
                h.controller.retreat().unwrap();
            }
            prop_assert!(h.controller.cursor() < len);
            prop_assert!(h.controller.current_track().is_ok());
        }
    }

    /// Property: play_at(i) makes queue[i] the current track
    #[test]
    fn play_at_selects_indexed_track(len in 1usize..30, index in 0usize..40) {
        let ids = queue_ids(len);
        let mut h = harness(&as_refs(&ids));

        match h.controller.play_at(index) {
            Ok(()) => {
                prop_assert!(index < len);
                let current = h.controller.current_track().unwrap();
                prop_assert_eq!(&current.id, &ids[index]);
            }
            Err(PlaybackError::IndexOutOfRange { index: i, len: l }) => {
                prop_assert!(index >= len);
                prop_assert_eq!((i, l), (index, len));
                prop_assert_eq!(h.controller.cursor(), 0);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Property: Enqueue grows the queue by one only for new ids
    #[test]
    fn enqueue_inserts_only_absent_tracks(
        len in 1usize..20,
        pick in 0usize..40,
        at in 0usize..20
    ) {
        let ids = queue_ids(len);
        let mut h = harness(&as_refs(&ids));
        let candidate = format!("t{}", pick);
        let was_present = pick < len;
        let at = at % (len + 1);

        h.controller.enqueue_and_play(create_track(&candidate), at).unwrap();

        let expected_len = if was_present { len } else { len + 1 };
        prop_assert_eq!(h.controller.queue().len(), expected_len);
        prop_assert_eq!(&h.controller.current_track().unwrap().id, &candidate);
        if !was_present {
            prop_assert_eq!(h.controller.cursor(), at);
        }
    }
}
