// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single source of truth for what is currently rendered.
//!
//! The orchestrator consults the cache before every backend call so that
//! unchanged anchors never reach the backend, and uses the per-client index
//! for bulk teardown. Entries are concurrent maps so statistics readers on
//! other threads never block the hot loop; all mutation happens on the hot
//! loop.

use std::collections::{HashMap, HashSet};

use beacon_render_port::{DisplayHandle, DisplayLocation};
use dashmap::DashMap;

use crate::ident::{AnchorId, ClientId};
use crate::state::{same_location, AnchorState, ContentHash};

/// A rendered anchor: backend handle plus last rendered state.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedAnchor {
    /// Handle issued by the active backend.
    pub handle: DisplayHandle,
    /// What was rendered.
    pub state: AnchorState,
}

/// Rendered-anchor bookkeeping keyed by anchor and by client.
#[derive(Debug, Default)]
pub struct AnchorStateCache {
    anchors: DashMap<AnchorId, TrackedAnchor>,
    by_client: DashMap<ClientId, HashSet<AnchorId>>,
}

impl AnchorStateCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `anchor_id` as rendered, replacing any previous entry.
    pub fn track(&self, anchor_id: AnchorId, handle: DisplayHandle, state: AnchorState) {
        self.by_client
            .entry(anchor_id.owner())
            .or_default()
            .insert(anchor_id.clone());
        self.anchors.insert(anchor_id, TrackedAnchor { handle, state });
    }

    /// Forgets `anchor_id`, returning its handle if it was tracked.
    pub fn untrack(&self, anchor_id: &AnchorId) -> Option<DisplayHandle> {
        let (_, tracked) = self.anchors.remove(anchor_id)?;
        let owner = anchor_id.owner();
        let now_empty = self.by_client.get_mut(&owner).is_some_and(|mut ids| {
            ids.remove(anchor_id);
            ids.is_empty()
        });
        if now_empty {
            self.by_client.remove_if(&owner, |_, ids| ids.is_empty());
        }
        Some(tracked.handle)
    }

    /// Last rendered state of `anchor_id`.
    pub fn state(&self, anchor_id: &AnchorId) -> Option<AnchorState> {
        self.anchors.get(anchor_id).map(|t| t.state.clone())
    }

    /// Backend handle of `anchor_id`.
    pub fn handle(&self, anchor_id: &AnchorId) -> Option<DisplayHandle> {
        self.anchors.get(anchor_id).map(|t| t.handle)
    }

    /// Whether `anchor_id` is rendered.
    pub fn is_tracked(&self, anchor_id: &AnchorId) -> bool {
        self.anchors.contains_key(anchor_id)
    }

    /// Every rendered anchor of `client`.
    pub fn client_anchor_keys(&self, client: ClientId) -> Vec<AnchorId> {
        self.by_client
            .get(&client)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forgets every anchor of `client` and returns what was tracked.
    pub fn remove_client_anchors(&self, client: ClientId) -> HashMap<AnchorId, TrackedAnchor> {
        let Some((_, ids)) = self.by_client.remove(&client) else {
            return HashMap::new();
        };
        ids.into_iter()
            .filter_map(|id| self.anchors.remove(&id))
            .collect()
    }

    /// Number of rendered anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether nothing is rendered.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Number of clients with at least one rendered anchor.
    pub fn client_count(&self) -> usize {
        self.by_client.len()
    }

    /// Whether rendering `(new_hash, new_location)` would change anything
    /// compared to `old`. This is the gate in front of every backend call.
    pub fn needs_update(
        old: &AnchorState,
        new_hash: ContentHash,
        new_location: &DisplayLocation,
    ) -> bool {
        old.content_hash() != new_hash
            || !same_location(old.location(), new_location)
            || !old.spawned()
            || !old.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Tick;
    use crate::ident::{RegionCoord, Side};
    use crate::state::content_hash;

    fn id(owner: u128, side: Side) -> AnchorId {
        AnchorId::new(ClientId::from_u128(owner), "w", RegionCoord::new(0, 0), side)
    }

    fn state(x: f64, text: &str) -> AnchorState {
        let loc = DisplayLocation::new("w", x, 65.0, 0.0);
        AnchorState::rendered(content_hash(&loc, &[text.to_owned()]), loc, Tick(1))
    }

    #[test]
    fn track_untrack_keeps_client_index_in_sync() {
        let cache = AnchorStateCache::new();
        cache.track(id(1, Side::North), DisplayHandle(1), state(0.0, "a"));
        cache.track(id(1, Side::South), DisplayHandle(2), state(0.0, "a"));
        cache.track(id(2, Side::North), DisplayHandle(3), state(0.0, "a"));
        assert_eq!(cache.client_count(), 2);

        assert_eq!(cache.untrack(&id(1, Side::North)), Some(DisplayHandle(1)));
        assert_eq!(cache.untrack(&id(1, Side::North)), None);
        assert_eq!(cache.client_anchor_keys(ClientId::from_u128(1)), vec![id(1, Side::South)]);

        cache.untrack(&id(1, Side::South));
        assert_eq!(cache.client_count(), 1);
        assert!(cache.client_anchor_keys(ClientId::from_u128(1)).is_empty());
    }

    #[test]
    fn remove_client_anchors_returns_handles() {
        let cache = AnchorStateCache::new();
        cache.track(id(1, Side::North), DisplayHandle(1), state(0.0, "a"));
        cache.track(id(1, Side::East), DisplayHandle(2), state(0.0, "a"));
        cache.track(id(2, Side::East), DisplayHandle(9), state(0.0, "a"));

        let removed = cache.remove_client_anchors(ClientId::from_u128(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[&id(1, Side::East)].handle, DisplayHandle(2));
        assert_eq!(cache.len(), 1);
        assert!(cache.remove_client_anchors(ClientId::from_u128(1)).is_empty());
    }

    #[test]
    fn retracking_replaces_state() {
        let cache = AnchorStateCache::new();
        cache.track(id(1, Side::West), DisplayHandle(1), state(0.0, "old"));
        cache.track(id(1, Side::West), DisplayHandle(1), state(0.0, "new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.state(&id(1, Side::West)), Some(state(0.0, "new")));
        assert!(cache.is_tracked(&id(1, Side::West)));
        assert_eq!(cache.handle(&id(1, Side::West)), Some(DisplayHandle(1)));
    }

    #[test]
    fn needs_update_only_on_real_change() {
        let old = state(1.0, "a");
        let same_loc = DisplayLocation::new("w", 1.0, 65.0, 0.0);
        let same = content_hash(&same_loc, &["a".to_owned()]);
        assert!(!AnchorStateCache::needs_update(&old, same, &same_loc));

        let changed = content_hash(&same_loc, &["b".to_owned()]);
        assert!(AnchorStateCache::needs_update(&old, changed, &same_loc));

        let moved = DisplayLocation::new("w", 2.0, 65.0, 0.0);
        assert!(AnchorStateCache::needs_update(&old, same, &moved));
    }
}
