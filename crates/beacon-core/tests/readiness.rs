// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Readiness episodes after world transitions.
#![allow(missing_docs)]

use beacon_core::{ClientId, ClientSnapshot, Position, ReadinessState, WorldReadinessTracker};

const C: ClientId = ClientId::from_u128(42);

fn at(world: &str, x: f64) -> ClientSnapshot {
    ClientSnapshot {
        id: C,
        world: world.into(),
        position: Position::new(x, 64.0, 0.0),
    }
}

#[test]
fn world_then_location_then_stable_exactly_once() {
    let mut tracker = WorldReadinessTracker::new(0.5, 8);
    tracker.register_transition(C, "W");

    for _ in 0..20 {
        assert!(!tracker.update(&at("Other", 0.0)));
        assert_eq!(tracker.state(C), Some(ReadinessState::AwaitingWorldConfirmation));
    }

    // Confirms the world, then jitters by a full unit each tick.
    let mut x = 0.0;
    for _ in 0..5 {
        assert!(!tracker.update(&at("W", x)));
        assert_eq!(tracker.state(C), Some(ReadinessState::WorldConfirmed));
        x += 1.0;
    }

    let still = x - 1.0;
    let mut became_stable = Vec::new();
    for tick in 1..=8 {
        if tracker.update(&at("W", still + 0.1)) {
            became_stable.push(tick);
        }
    }
    assert_eq!(became_stable, vec![8]);
    assert_eq!(tracker.state(C), Some(ReadinessState::LocationStable));

    // Stays stable; never fires again for this episode.
    for _ in 0..10 {
        assert!(!tracker.update(&at("W", still)));
    }
    assert!(tracker.is_stable(C));
}

#[test]
fn new_transition_supersedes_stable_episode() {
    let mut tracker = WorldReadinessTracker::new(0.5, 2);
    tracker.register_transition(C, "W");
    tracker.update(&at("W", 0.0));
    tracker.update(&at("W", 0.0));
    assert!(tracker.update(&at("W", 0.0)));

    tracker.register_transition(C, "Nether");
    assert!(!tracker.is_stable(C));
    assert_eq!(tracker.state(C), Some(ReadinessState::AwaitingWorldConfirmation));
}

#[test]
fn force_stable_is_idempotent() {
    let mut tracker = WorldReadinessTracker::new(0.5, 8);
    tracker.register_transition(C, "W");
    assert!(tracker.force_stable(C));
    assert!(!tracker.force_stable(C));
    assert_eq!(tracker.pending_episodes(), 0);
    assert!(!tracker.update(&at("W", 0.0)));
}

#[test]
fn disconnect_drops_episode_quietly() {
    let mut tracker = WorldReadinessTracker::new(0.5, 8);
    tracker.register_transition(C, "W");
    tracker.forget(C);
    assert_eq!(tracker.state(C), None);
    assert!(!tracker.update(&at("W", 0.0)));
}
