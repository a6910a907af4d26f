// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable snapshots of rendered anchor content.
use core::fmt;

use beacon_render_port::DisplayLocation;
use blake3::Hasher;

use crate::canon::quantize_position;
use crate::clock::Tick;

/// BLAKE3 digest of an anchor's rendered content.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContentHash(pub [u8; 32]);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

/// Hashes `(location, lines)` with domain separation (prefix `b"anchor-content:"`).
///
/// Pure function of its inputs. Coordinates are hashed through their
/// canonical micro-unit projection; every variable-length field is
/// length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn content_hash(location: &DisplayLocation, lines: &[String]) -> ContentHash {
    let mut hasher = Hasher::new();
    hasher.update(b"anchor-content:");
    hasher.update(&(location.world.len() as u64).to_le_bytes());
    hasher.update(location.world.as_bytes());
    for q in quantize_position(location.x, location.y, location.z) {
        hasher.update(&q.to_le_bytes());
    }
    hasher.update(&(lines.len() as u64).to_le_bytes());
    for line in lines {
        hasher.update(&(line.len() as u64).to_le_bytes());
        hasher.update(line.as_bytes());
    }
    ContentHash(hasher.finalize().into())
}

/// Whether two locations are the same under canonical projection.
pub(crate) fn same_location(a: &DisplayLocation, b: &DisplayLocation) -> bool {
    a.world == b.world
        && quantize_position(a.x, a.y, a.z) == quantize_position(b.x, b.y, b.z)
}

/// What the backend last rendered for one anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorState {
    content_hash: ContentHash,
    location: DisplayLocation,
    spawned: bool,
    active: bool,
    last_update_tick: Tick,
}

impl AnchorState {
    /// State of an anchor the backend has just created or updated.
    pub fn rendered(content_hash: ContentHash, location: DisplayLocation, now: Tick) -> Self {
        Self {
            content_hash,
            location,
            spawned: true,
            active: true,
            last_update_tick: now,
        }
    }

    /// Digest of the rendered `(location, lines)`.
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// Where the anchor was rendered.
    pub fn location(&self) -> &DisplayLocation {
        &self.location
    }

    /// Whether the backend holds a display for this anchor.
    pub fn spawned(&self) -> bool {
        self.spawned
    }

    /// Whether the display is currently shown.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Tick of the last backend call that produced this state.
    pub fn last_update_tick(&self) -> Tick {
        self.last_update_tick
    }
}
