// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Provider contracts that concrete backends are written against.
//!
//! A provider is the third-party display facility itself (a hologram library,
//! the host's native text-entity API). Backends adapt a provider to
//! [`crate::RenderBackend`]; the host supplies the provider instance.

use core::fmt;

use crate::{DisplayLocation, ProviderError};

/// `major.minor` version reported by a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderVersion {
    /// Major version; breaking API changes.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl ProviderVersion {
    /// Creates a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ProviderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Name-addressed hologram library.
///
/// Holograms are identified by a caller-chosen unique name and hold a list of
/// text lines.
pub trait HologramProvider: Send {
    /// Version of the loaded library, or `None` when it is not installed.
    fn version(&self) -> Option<ProviderVersion>;

    /// Create a named hologram.
    fn create_hologram(
        &mut self,
        name: &str,
        location: &DisplayLocation,
        lines: &[String],
    ) -> Result<(), ProviderError>;

    /// Replace all lines of a hologram.
    fn set_lines(&mut self, name: &str, lines: &[String]) -> Result<(), ProviderError>;

    /// Move a hologram.
    fn move_hologram(&mut self, name: &str, location: &DisplayLocation)
        -> Result<(), ProviderError>;

    /// Delete a hologram.
    fn delete_hologram(&mut self, name: &str) -> Result<(), ProviderError>;
}

/// Native text-display entity facility of the host.
///
/// Entities are identified by a provider-issued numeric id and render a single
/// (possibly multi-line) text component.
pub trait TextEntityProvider: Send {
    /// Whether the running host supports text-display entities at all.
    fn supports_text_displays(&self) -> bool;

    /// Spawn a text display entity and return its entity id.
    fn spawn_text(&mut self, location: &DisplayLocation, text: &str) -> Result<u64, ProviderError>;

    /// Replace the text of an entity.
    fn set_text(&mut self, entity: u64, text: &str) -> Result<(), ProviderError>;

    /// Teleport an entity.
    fn teleport(&mut self, entity: u64, location: &DisplayLocation) -> Result<(), ProviderError>;

    /// Despawn an entity.
    fn despawn(&mut self, entity: u64) -> Result<(), ProviderError>;
}
