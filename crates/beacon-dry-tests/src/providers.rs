// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fake display providers for exercising the concrete backends.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use beacon_render_port::{
    DisplayLocation, HologramProvider, ProviderError, ProviderVersion, TextEntityProvider,
};

#[derive(Default)]
struct Holograms {
    live: BTreeMap<String, (DisplayLocation, Vec<String>)>,
    calls: usize,
}

/// In-memory hologram library. Clones share state.
#[derive(Clone)]
pub struct FakeHologramProvider {
    version: Option<ProviderVersion>,
    state: Arc<Mutex<Holograms>>,
}

impl FakeHologramProvider {
    /// A library reporting `version` (`None` = not installed).
    pub fn new(version: Option<ProviderVersion>) -> Self {
        Self {
            version,
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Holograms> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lines of every live hologram, by name.
    pub fn holograms(&self) -> BTreeMap<String, Vec<String>> {
        self.lock()
            .live
            .iter()
            .map(|(name, (_, lines))| (name.clone(), lines.clone()))
            .collect()
    }

    /// Mutating calls received so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }
}

impl HologramProvider for FakeHologramProvider {
    fn version(&self) -> Option<ProviderVersion> {
        self.version
    }

    fn create_hologram(
        &mut self,
        name: &str,
        location: &DisplayLocation,
        lines: &[String],
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls += 1;
        if state.live.contains_key(name) {
            return Err(ProviderError::Rejected(format!("{name} exists")));
        }
        state
            .live
            .insert(name.to_owned(), (location.clone(), lines.to_vec()));
        Ok(())
    }

    fn set_lines(&mut self, name: &str, lines: &[String]) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls += 1;
        let entry = state
            .live
            .get_mut(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_owned()))?;
        entry.1 = lines.to_vec();
        Ok(())
    }

    fn move_hologram(
        &mut self,
        name: &str,
        location: &DisplayLocation,
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls += 1;
        let entry = state
            .live
            .get_mut(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_owned()))?;
        entry.0 = location.clone();
        Ok(())
    }

    fn delete_hologram(&mut self, name: &str) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls += 1;
        state
            .live
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(name.to_owned()))
    }
}

#[derive(Default)]
struct Entities {
    next: u64,
    live: BTreeMap<u64, (DisplayLocation, String)>,
}

/// In-memory text-display entity host. Clones share state.
#[derive(Clone)]
pub struct FakeTextEntityProvider {
    supported: bool,
    state: Arc<Mutex<Entities>>,
}

impl FakeTextEntityProvider {
    /// A host that does (or does not) support text displays.
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entities> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Text of every live entity, by entity id.
    pub fn entities(&self) -> BTreeMap<u64, String> {
        self.lock()
            .live
            .iter()
            .map(|(id, (_, text))| (*id, text.clone()))
            .collect()
    }
}

impl TextEntityProvider for FakeTextEntityProvider {
    fn supports_text_displays(&self) -> bool {
        self.supported
    }

    fn spawn_text(&mut self, location: &DisplayLocation, text: &str) -> Result<u64, ProviderError> {
        let mut state = self.lock();
        state.next += 1;
        let id = state.next;
        state.live.insert(id, (location.clone(), text.to_owned()));
        Ok(id)
    }

    fn set_text(&mut self, entity: u64, text: &str) -> Result<(), ProviderError> {
        let mut state = self.lock();
        let entry = state
            .live
            .get_mut(&entity)
            .ok_or_else(|| ProviderError::NotFound(entity.to_string()))?;
        entry.1 = text.to_owned();
        Ok(())
    }

    fn teleport(&mut self, entity: u64, location: &DisplayLocation) -> Result<(), ProviderError> {
        let mut state = self.lock();
        let entry = state
            .live
            .get_mut(&entity)
            .ok_or_else(|| ProviderError::NotFound(entity.to_string()))?;
        entry.0 = location.clone();
        Ok(())
    }

    fn despawn(&mut self, entity: u64) -> Result<(), ProviderError> {
        self.lock()
            .live
            .remove(&entity)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(entity.to_string()))
    }
}
