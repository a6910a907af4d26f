// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend for the host's native text-display entities.

use std::collections::HashMap;

use beacon_render_port::{
    AnchorDisplay, BackendError, BackendStats, DisplayHandle, DisplayLocation, ProviderError,
    RenderBackend, TextEntityProvider,
};
use tracing::{debug, info, warn};

use crate::state::same_location;

#[derive(Debug)]
struct Entity {
    id: u64,
    location: DisplayLocation,
    text: String,
}

/// Renders anchors as text-display entities (one entity, lines joined by `\n`).
pub struct TextDisplayBackend<P> {
    provider: P,
    available: bool,
    entities: HashMap<DisplayHandle, Entity>,
    next_handle: u64,
    stats: BackendStats,
}

impl<P: TextEntityProvider> TextDisplayBackend<P> {
    /// Wraps `provider` and checks for text-display support.
    pub fn new(provider: P) -> Self {
        let available = provider.supports_text_displays();
        if available {
            info!("text-display entities supported");
        } else {
            debug!("host has no text-display entities");
        }
        Self {
            provider,
            available,
            entities: HashMap::new(),
            next_handle: 1,
            stats: BackendStats {
                backend: "text-display",
                ..BackendStats::default()
            },
        }
    }

    fn render_text(display: &AnchorDisplay) -> String {
        display.lines.join("\n")
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available {
            Ok(())
        } else {
            Err(BackendError::Unavailable("text displays unsupported".into()))
        }
    }

    fn count<T>(&mut self, result: Result<T, BackendError>) -> Result<T, BackendError> {
        if result.is_err() {
            self.stats.failures += 1;
        }
        result
    }

    fn spawn(&mut self, display: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
        self.ensure_available()?;
        let text = Self::render_text(display);
        let id = self.provider.spawn_text(&display.location, &text)?;
        let handle = DisplayHandle(self.next_handle);
        self.next_handle += 1;
        self.entities.insert(
            handle,
            Entity {
                id,
                location: display.location.clone(),
                text,
            },
        );
        Ok(handle)
    }

    fn refresh(
        &mut self,
        handle: DisplayHandle,
        display: &AnchorDisplay,
    ) -> Result<(), BackendError> {
        self.ensure_available()?;
        let entity = self
            .entities
            .get_mut(&handle)
            .ok_or(BackendError::UnknownHandle(handle))?;
        if !same_location(&entity.location, &display.location) {
            // Entities cannot cross worlds by teleport on every host; respawn instead.
            if entity.location.world != display.location.world {
                match self.provider.despawn(entity.id) {
                    Ok(()) | Err(ProviderError::NotFound(_)) => {}
                    Err(err) => {
                        // Still tracked, so a later remove can retry the despawn.
                        warn!(%handle, entity = entity.id, %err, "despawn before respawn failed");
                        return Err(err.into());
                    }
                }
                entity.id = self
                    .provider
                    .spawn_text(&display.location, &Self::render_text(display))?;
                entity.location = display.location.clone();
                entity.text = Self::render_text(display);
                return Ok(());
            }
            self.provider.teleport(entity.id, &display.location)?;
            entity.location = display.location.clone();
        }
        let text = Self::render_text(display);
        if entity.text != text {
            self.provider.set_text(entity.id, &text)?;
            entity.text = text;
        }
        Ok(())
    }
}

impl<P: TextEntityProvider> RenderBackend for TextDisplayBackend<P> {
    fn name(&self) -> &'static str {
        "text-display"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&mut self, display: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
        let result = self.spawn(display);
        if result.is_ok() {
            self.stats.created += 1;
        }
        self.count(result)
    }

    fn update(
        &mut self,
        handle: DisplayHandle,
        display: &AnchorDisplay,
    ) -> Result<(), BackendError> {
        let result = self.refresh(handle, display);
        if result.is_ok() {
            self.stats.updated += 1;
        }
        self.count(result)
    }

    fn remove(&mut self, handle: DisplayHandle) -> Result<(), BackendError> {
        let result = match self.entities.remove(&handle) {
            None => Err(BackendError::UnknownHandle(handle)),
            Some(entity) => match self.provider.despawn(entity.id) {
                Ok(()) | Err(ProviderError::NotFound(_)) => Ok(()),
                Err(err) => Err(err.into()),
            },
        };
        if result.is_ok() {
            self.stats.removed += 1;
        }
        self.count(result)
    }

    fn cleanup(&mut self) {
        let handles: Vec<DisplayHandle> = self.entities.keys().copied().collect();
        for handle in handles {
            if let Err(err) = self.remove(handle) {
                warn!(%handle, %err, "text-display cleanup failed");
            }
        }
    }

    fn statistics(&self) -> BackendStats {
        BackendStats {
            live: self.entities.len(),
            ..self.stats.clone()
        }
    }
}
