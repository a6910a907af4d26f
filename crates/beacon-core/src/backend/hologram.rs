// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend for name-addressed hologram libraries.

use std::collections::HashMap;

use beacon_render_port::{
    AnchorDisplay, BackendError, BackendStats, DisplayHandle, DisplayLocation, HologramProvider,
    ProviderError, ProviderVersion, RenderBackend,
};
use tracing::{debug, info, warn};

use crate::state::same_location;

/// Oldest library version this backend is written against (same major only).
pub const MIN_HOLOGRAM_VERSION: ProviderVersion = ProviderVersion::new(2, 8);

const NAME_PREFIX: &str = "beacon";

#[derive(Debug)]
struct Hologram {
    name: String,
    location: DisplayLocation,
    lines: Vec<String>,
}

/// Renders anchors as named holograms.
pub struct HologramBackend<P> {
    provider: P,
    available: bool,
    holograms: HashMap<DisplayHandle, Hologram>,
    next_handle: u64,
    stats: BackendStats,
}

impl<P: HologramProvider> HologramBackend<P> {
    /// Wraps `provider` and checks its version.
    pub fn new(provider: P) -> Self {
        let available = match provider.version() {
            Some(v) if v.major == MIN_HOLOGRAM_VERSION.major && v >= MIN_HOLOGRAM_VERSION => {
                info!(version = %v, "hologram provider detected");
                true
            }
            Some(v) => {
                warn!(
                    version = %v,
                    required = %MIN_HOLOGRAM_VERSION,
                    "incompatible hologram provider"
                );
                false
            }
            None => {
                debug!("no hologram provider installed");
                false
            }
        };
        Self {
            provider,
            available,
            holograms: HashMap::new(),
            next_handle: 1,
            stats: BackendStats {
                backend: "hologram",
                ..BackendStats::default()
            },
        }
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available {
            Ok(())
        } else {
            Err(BackendError::Unavailable("hologram provider missing".into()))
        }
    }

    fn track<T>(&mut self, result: Result<T, BackendError>) -> Result<T, BackendError> {
        if result.is_err() {
            self.stats.failures += 1;
        }
        result
    }

    fn apply_update(
        &mut self,
        handle: DisplayHandle,
        display: &AnchorDisplay,
    ) -> Result<(), BackendError> {
        let holo = self
            .holograms
            .get_mut(&handle)
            .ok_or(BackendError::UnknownHandle(handle))?;
        if !same_location(&holo.location, &display.location) {
            self.provider.move_hologram(&holo.name, &display.location)?;
            holo.location = display.location.clone();
        }
        if holo.lines != display.lines {
            self.provider.set_lines(&holo.name, &display.lines)?;
            holo.lines.clone_from(&display.lines);
        }
        Ok(())
    }
}

impl<P: HologramProvider> RenderBackend for HologramBackend<P> {
    fn name(&self) -> &'static str {
        "hologram"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&mut self, display: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
        let result = self.ensure_available().and_then(|()| {
            let handle = DisplayHandle(self.next_handle);
            let name = format!("{NAME_PREFIX}-{}", handle.0);
            self.provider
                .create_hologram(&name, &display.location, &display.lines)?;
            self.next_handle += 1;
            self.holograms.insert(
                handle,
                Hologram {
                    name,
                    location: display.location.clone(),
                    lines: display.lines.clone(),
                },
            );
            Ok(handle)
        });
        if result.is_ok() {
            self.stats.created += 1;
        }
        self.track(result)
    }

    fn update(
        &mut self,
        handle: DisplayHandle,
        display: &AnchorDisplay,
    ) -> Result<(), BackendError> {
        let result = self
            .ensure_available()
            .and_then(|()| self.apply_update(handle, display));
        if result.is_ok() {
            self.stats.updated += 1;
        }
        self.track(result)
    }

    fn remove(&mut self, handle: DisplayHandle) -> Result<(), BackendError> {
        let result = match self.holograms.remove(&handle) {
            None => Err(BackendError::UnknownHandle(handle)),
            Some(holo) => match self.provider.delete_hologram(&holo.name) {
                // Already gone on the provider side: the goal is met.
                Ok(()) | Err(ProviderError::NotFound(_)) => Ok(()),
                Err(err) => Err(err.into()),
            },
        };
        if result.is_ok() {
            self.stats.removed += 1;
        }
        self.track(result)
    }

    fn cleanup(&mut self) {
        let handles: Vec<DisplayHandle> = self.holograms.keys().copied().collect();
        for handle in handles {
            if let Err(err) = self.remove(handle) {
                warn!(%handle, %err, "hologram cleanup failed");
            }
        }
    }

    fn statistics(&self) -> BackendStats {
        BackendStats {
            live: self.holograms.len(),
            ..self.stats.clone()
        }
    }
}
