// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Display-anchor preferences (cadence, debounce, culling, readiness, backend).

use serde::{Deserialize, Serialize};

/// Config key under which [`DisplayPrefs`] are stored.
pub const DISPLAY_PREFS_KEY: &str = "display";

/// Which render backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackendChoice {
    /// First available backend in the fixed preference order.
    #[default]
    Auto,
    /// Name-addressed hologram library.
    Hologram,
    /// Native text-display entities.
    TextDisplay,
    /// Render nothing.
    Disabled,
}

/// Saved preferences for the display-anchor feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrefs {
    /// Ticks between periodic refreshes of one client.
    pub refresh_interval_ticks: u64,
    /// Ticks an update waits in the debouncer before it is applied.
    pub debounce_ticks: u64,
    /// Horizontal cull radius around the client (world units).
    pub max_distance: f64,
    /// Edge length of one region (world units).
    pub region_size: u32,
    /// Height of an anchor above the client's block position.
    pub anchor_height_offset: f64,
    /// Movement below this distance counts as "standing still".
    pub stability_threshold: f64,
    /// Consecutive still ticks before a client's location counts as stable.
    pub required_stable_ticks: u32,
    /// Render backend selection.
    pub backend: BackendChoice,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            refresh_interval_ticks: 20,
            debounce_ticks: 5,
            max_distance: 48.0,
            region_size: 16,
            anchor_height_offset: 1.5,
            stability_threshold: 0.5,
            required_stable_ticks: 8,
            backend: BackendChoice::Auto,
        }
    }
}

impl DisplayPrefs {
    /// Returns a copy with every out-of-range field reset to its default,
    /// together with the names of the fields that were corrected.
    pub fn sanitized(&self) -> (Self, Vec<&'static str>) {
        let defaults = Self::default();
        let mut out = self.clone();
        let mut fixed = Vec::new();

        if out.refresh_interval_ticks == 0 {
            out.refresh_interval_ticks = defaults.refresh_interval_ticks;
            fixed.push("refresh_interval_ticks");
        }
        if !(out.max_distance.is_finite() && out.max_distance > 0.0) {
            out.max_distance = defaults.max_distance;
            fixed.push("max_distance");
        }
        if out.region_size == 0 {
            out.region_size = defaults.region_size;
            fixed.push("region_size");
        }
        if !out.anchor_height_offset.is_finite() {
            out.anchor_height_offset = defaults.anchor_height_offset;
            fixed.push("anchor_height_offset");
        }
        if !(out.stability_threshold.is_finite() && out.stability_threshold > 0.0) {
            out.stability_threshold = defaults.stability_threshold;
            fixed.push("stability_threshold");
        }
        if out.required_stable_ticks == 0 {
            out.required_stable_ticks = defaults.required_stable_ticks;
            fixed.push("required_stable_ticks");
        }
        (out, fixed)
    }
}
