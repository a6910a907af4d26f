// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World-readiness gating after world transitions.
//!
//! Right after a join, teleport or world change the host may still report a
//! stale world or a position that is about to snap. Spatial work for a client
//! is only safe once its world is confirmed and its position has held still
//! for a number of consecutive ticks.
//!
//! Each transition starts a fresh *episode* that advances one way:
//! `AwaitingWorldConfirmation -> WorldConfirmed -> LocationStable`.
//! A new transition replaces the episode; disconnect simply drops it.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::collab::{ClientSnapshot, Position};
use crate::ident::ClientId;

/// Readiness of one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadinessState {
    /// Waiting for the host to report the target world.
    AwaitingWorldConfirmation,
    /// In the right world; waiting for the position to settle.
    WorldConfirmed,
    /// Safe to run spatial computation.
    LocationStable,
}

#[derive(Debug)]
struct Episode {
    target_world: String,
    state: ReadinessState,
    anchor: Position,
    stable_ticks: u32,
}

/// Tracks one readiness episode per client.
#[derive(Debug)]
pub struct WorldReadinessTracker {
    episodes: HashMap<ClientId, Episode>,
    stable: HashSet<ClientId>,
    threshold_sq: f64,
    required_stable_ticks: u32,
}

impl WorldReadinessTracker {
    /// Movement strictly below `stability_threshold` counts as still; a client
    /// becomes stable after `required_stable_ticks` consecutive still ticks.
    pub fn new(stability_threshold: f64, required_stable_ticks: u32) -> Self {
        Self {
            episodes: HashMap::new(),
            stable: HashSet::new(),
            threshold_sq: stability_threshold * stability_threshold,
            required_stable_ticks: required_stable_ticks.max(1),
        }
    }

    /// Starts a new episode for `client` heading to `target_world`.
    ///
    /// Replaces any running episode and clears a previous stable state.
    pub fn register_transition(&mut self, client: ClientId, target_world: impl Into<String>) {
        let target_world = target_world.into();
        debug!(%client, world = %target_world, "readiness episode started");
        self.stable.remove(&client);
        self.episodes.insert(
            client,
            Episode {
                target_world,
                state: ReadinessState::AwaitingWorldConfirmation,
                anchor: Position::default(),
                stable_ticks: 0,
            },
        );
    }

    /// Advances `client`'s episode with this tick's observation.
    ///
    /// Returns `true` exactly once per episode: on the call that makes the
    /// client `LocationStable`.
    pub fn update(&mut self, snapshot: &ClientSnapshot) -> bool {
        let Some(episode) = self.episodes.get_mut(&snapshot.id) else {
            return false;
        };
        match episode.state {
            ReadinessState::AwaitingWorldConfirmation => {
                if snapshot.world == episode.target_world {
                    episode.state = ReadinessState::WorldConfirmed;
                    episode.anchor = snapshot.position;
                    episode.stable_ticks = 0;
                }
                false
            }
            ReadinessState::WorldConfirmed => {
                let moved = snapshot.world != episode.target_world
                    || snapshot.position.distance_sq(&episode.anchor) >= self.threshold_sq;
                if moved {
                    episode.anchor = snapshot.position;
                    episode.stable_ticks = 0;
                    return false;
                }
                episode.stable_ticks += 1;
                if episode.stable_ticks < self.required_stable_ticks {
                    return false;
                }
                self.episodes.remove(&snapshot.id);
                self.stable.insert(snapshot.id);
                debug!(client = %snapshot.id, "location stable");
                true
            }
            // Stable episodes are retired into `stable` and never stored here.
            ReadinessState::LocationStable => false,
        }
    }

    /// Administrative override: marks `client` stable immediately.
    ///
    /// Idempotent. Returns `true` only when the client was not already stable.
    pub fn force_stable(&mut self, client: ClientId) -> bool {
        self.episodes.remove(&client);
        self.stable.insert(client)
    }

    /// Current state, or `None` when the client has no episode and never
    /// became stable.
    pub fn state(&self, client: ClientId) -> Option<ReadinessState> {
        if self.stable.contains(&client) {
            return Some(ReadinessState::LocationStable);
        }
        self.episodes.get(&client).map(|e| e.state)
    }

    /// Whether spatial work may run for `client`.
    pub fn is_stable(&self, client: ClientId) -> bool {
        self.stable.contains(&client)
    }

    /// Drops everything known about `client` (disconnect).
    pub fn forget(&mut self, client: ClientId) {
        self.episodes.remove(&client);
        self.stable.remove(&client);
    }

    /// Number of clients with a running (not yet stable) episode.
    pub fn pending_episodes(&self) -> usize {
        self.episodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: ClientId = ClientId::from_u128(7);

    fn snap(world: &str, x: f64) -> ClientSnapshot {
        ClientSnapshot {
            id: C,
            world: world.to_owned(),
            position: Position::new(x, 64.0, 0.0),
        }
    }

    #[test]
    fn unknown_client_never_becomes_stable() {
        let mut t = WorldReadinessTracker::new(0.5, 2);
        for _ in 0..10 {
            assert!(!t.update(&snap("w", 0.0)));
        }
        assert_eq!(t.state(C), None);
    }

    #[test]
    fn leaving_target_world_resets_the_still_counter() {
        let mut t = WorldReadinessTracker::new(0.5, 3);
        t.register_transition(C, "w");
        t.update(&snap("w", 0.0));
        t.update(&snap("w", 0.0));
        t.update(&snap("w", 0.0));
        t.update(&snap("elsewhere", 0.0));
        assert_eq!(t.state(C), Some(ReadinessState::WorldConfirmed));
        t.update(&snap("w", 0.0));
        t.update(&snap("w", 0.0));
        assert!(t.update(&snap("w", 0.0)));
    }

    #[test]
    fn small_drift_accumulates_against_recorded_location() {
        // Each step is below threshold but the recorded location stays put,
        // so drift eventually counts as movement.
        let mut t = WorldReadinessTracker::new(0.5, 10);
        t.register_transition(C, "w");
        t.update(&snap("w", 0.0));
        for i in 1..=4 {
            t.update(&snap("w", f64::from(i) * 0.2));
        }
        assert_eq!(t.state(C), Some(ReadinessState::WorldConfirmed));
        assert_eq!(t.episodes[&C].stable_ticks, 1);
    }

    #[test]
    fn force_stable_is_idempotent() {
        let mut t = WorldReadinessTracker::new(0.5, 8);
        t.register_transition(C, "w");
        assert!(t.force_stable(C));
        assert!(!t.force_stable(C));
        assert!(t.is_stable(C));
        assert_eq!(t.pending_episodes(), 0);
    }

    #[test]
    fn new_transition_supersedes_stable_state() {
        let mut t = WorldReadinessTracker::new(0.5, 8);
        t.force_stable(C);
        t.register_transition(C, "nether");
        assert_eq!(t.state(C), Some(ReadinessState::AwaitingWorldConfirmation));
        t.forget(C);
        assert_eq!(t.state(C), None);
    }
}
