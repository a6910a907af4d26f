// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plain display types exchanged across the render port.

use core::fmt;

use serde::Serialize;

/// A point in a named world where a display is anchored.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayLocation {
    /// World the display lives in.
    pub world: String,
    /// X coordinate (world units).
    pub x: f64,
    /// Y coordinate (world units).
    pub y: f64,
    /// Z coordinate (world units).
    pub z: f64,
}

impl DisplayLocation {
    /// Creates a location in `world`.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for DisplayLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({:.2}, {:.2}, {:.2})", self.world, self.x, self.y, self.z)
    }
}

/// Everything a backend needs to render one anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorDisplay {
    /// Stable textual key of the anchor (its id string form).
    ///
    /// For logs and diagnostics. Backends address what they render by the
    /// [`DisplayHandle`] they return and pick their own native names.
    pub key: String,
    /// Where the display floats.
    pub location: DisplayLocation,
    /// Text lines, top to bottom.
    pub lines: Vec<String>,
}

/// Opaque, backend-issued handle for a rendered display.
///
/// Handles are only meaningful to the backend that issued them.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayHandle(pub u64);

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operational counters reported by a backend.
///
/// Observability only; the exact numbers are not a stability contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    /// Backend name.
    pub backend: &'static str,
    /// Displays currently alive on the provider side.
    pub live: usize,
    /// Successful `create` calls.
    pub created: u64,
    /// Successful `update` calls.
    pub updated: u64,
    /// Successful `remove` calls.
    pub removed: u64,
    /// Calls that failed for any reason.
    pub failures: u64,
}
