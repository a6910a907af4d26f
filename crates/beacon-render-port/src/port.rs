// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render backend trait defining the display contract.

use crate::{AnchorDisplay, BackendError, BackendStats, DisplayHandle};

/// Render backend capability trait.
///
/// This is the only seam allowed to create, update or remove an on-world
/// marker. Several mutually exclusive implementations exist (one per display
/// provider); exactly one is selected at startup.
///
/// # Availability
///
/// Each implementation checks its provider when constructed and reports the
/// outcome through [`RenderBackend::is_available`]. Selection skips backends
/// that report `false`.
///
/// # Fault Isolation
///
/// Every call stands alone. A failing `remove` or `update` for one handle must
/// leave the backend usable for every other handle; callers log the error and
/// carry on.
pub trait RenderBackend: Send {
    /// Short, stable backend name used in logs and statistics.
    fn name(&self) -> &'static str;

    /// Whether the underlying provider was present and compatible at construction.
    fn is_available(&self) -> bool;

    /// Create a display. Returns the handle used for later updates/removal.
    fn create(&mut self, display: &AnchorDisplay) -> Result<DisplayHandle, BackendError>;

    /// Replace location and/or text of an existing display.
    fn update(&mut self, handle: DisplayHandle, display: &AnchorDisplay)
        -> Result<(), BackendError>;

    /// Remove a display.
    fn remove(&mut self, handle: DisplayHandle) -> Result<(), BackendError>;

    /// Remove everything this backend created (shutdown path).
    fn cleanup(&mut self);

    /// Operational counters.
    fn statistics(&self) -> BackendStats;
}
