// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Display providers that log instead of drawing.

use std::collections::{HashMap, HashSet};

use beacon_core::render::{
    DisplayLocation, HologramProvider, ProviderError, ProviderVersion, TextEntityProvider,
};
use tracing::trace;

/// Hologram library stand-in.
#[derive(Debug, Default)]
pub struct LogHologramProvider {
    version: Option<ProviderVersion>,
    live: HashMap<String, usize>,
}

impl LogHologramProvider {
    /// A library reporting `version`; `None` means "not installed".
    pub fn new(version: Option<ProviderVersion>) -> Self {
        Self {
            version,
            live: HashMap::new(),
        }
    }
}

impl HologramProvider for LogHologramProvider {
    fn version(&self) -> Option<ProviderVersion> {
        self.version
    }

    fn create_hologram(
        &mut self,
        name: &str,
        location: &DisplayLocation,
        lines: &[String],
    ) -> Result<(), ProviderError> {
        if self.live.contains_key(name) {
            return Err(ProviderError::Rejected(format!("hologram {name} exists")));
        }
        trace!(name, %location, lines = lines.len(), "hologram created");
        self.live.insert(name.to_owned(), lines.len());
        Ok(())
    }

    fn set_lines(&mut self, name: &str, lines: &[String]) -> Result<(), ProviderError> {
        let count = self
            .live
            .get_mut(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_owned()))?;
        *count = lines.len();
        trace!(name, lines = lines.len(), "hologram lines set");
        Ok(())
    }

    fn move_hologram(
        &mut self,
        name: &str,
        location: &DisplayLocation,
    ) -> Result<(), ProviderError> {
        if !self.live.contains_key(name) {
            return Err(ProviderError::NotFound(name.to_owned()));
        }
        trace!(name, %location, "hologram moved");
        Ok(())
    }

    fn delete_hologram(&mut self, name: &str) -> Result<(), ProviderError> {
        if self.live.remove(name).is_none() {
            return Err(ProviderError::NotFound(name.to_owned()));
        }
        trace!(name, "hologram deleted");
        Ok(())
    }
}

/// Native text-display stand-in.
#[derive(Debug, Default)]
pub struct LogTextEntityProvider {
    supported: bool,
    next: u64,
    live: HashSet<u64>,
}

impl LogTextEntityProvider {
    /// A host with (or without) text-display entities.
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            ..Self::default()
        }
    }
}

impl TextEntityProvider for LogTextEntityProvider {
    fn supports_text_displays(&self) -> bool {
        self.supported
    }

    fn spawn_text(&mut self, location: &DisplayLocation, text: &str) -> Result<u64, ProviderError> {
        self.next += 1;
        self.live.insert(self.next);
        trace!(entity = self.next, %location, bytes = text.len(), "text display spawned");
        Ok(self.next)
    }

    fn set_text(&mut self, entity: u64, text: &str) -> Result<(), ProviderError> {
        if !self.live.contains(&entity) {
            return Err(ProviderError::NotFound(entity.to_string()));
        }
        trace!(entity, bytes = text.len(), "text display updated");
        Ok(())
    }

    fn teleport(&mut self, entity: u64, location: &DisplayLocation) -> Result<(), ProviderError> {
        if !self.live.contains(&entity) {
            return Err(ProviderError::NotFound(entity.to_string()));
        }
        trace!(entity, %location, "text display teleported");
        Ok(())
    }

    fn despawn(&mut self, entity: u64) -> Result<(), ProviderError> {
        if self.live.remove(&entity) {
            trace!(entity, "text display despawned");
            Ok(())
        } else {
            Err(ProviderError::NotFound(entity.to_string()))
        }
    }
}
