// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Startup backend selection.

use beacon_app_core::prefs::BackendChoice;
use beacon_render_port::RenderBackend;
use tracing::{info, warn};

/// Kinds of backend this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// [`super::HologramBackend`].
    Hologram,
    /// [`super::TextDisplayBackend`].
    TextDisplay,
}

impl BackendKind {
    const fn matches(self, choice: BackendChoice) -> bool {
        matches!(
            (self, choice),
            (Self::Hologram, BackendChoice::Hologram)
                | (Self::TextDisplay, BackendChoice::TextDisplay)
        )
    }
}

/// Order in which `auto` tries candidates.
pub const PREFERENCE_ORDER: [BackendKind; 2] = [BackendKind::Hologram, BackendKind::TextDisplay];

/// Picks the backend to render with, or `None` when anchors are disabled or
/// nothing usable is installed.
///
/// Candidates are checked through [`RenderBackend::is_available`]; their order
/// in `candidates` does not matter. Unselected candidates are dropped.
pub fn select_backend(
    choice: BackendChoice,
    mut candidates: Vec<(BackendKind, Box<dyn RenderBackend>)>,
) -> Option<Box<dyn RenderBackend>> {
    let position = match choice {
        BackendChoice::Disabled => {
            info!("display anchors disabled by configuration");
            return None;
        }
        BackendChoice::Auto => PREFERENCE_ORDER.iter().find_map(|kind| {
            candidates
                .iter()
                .position(|(k, b)| k == kind && b.is_available())
        }),
        explicit => {
            let found = candidates
                .iter()
                .position(|(k, b)| k.matches(explicit) && b.is_available());
            if found.is_none() {
                warn!(?explicit, "configured backend is not available; anchors disabled");
            }
            found
        }
    };

    match position {
        Some(idx) => {
            let (kind, backend) = candidates.swap_remove(idx);
            info!(?kind, backend = backend.name(), "render backend selected");
            Some(backend)
        }
        None => {
            if choice == BackendChoice::Auto {
                warn!("no render backend available; anchors disabled");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_render_port::{AnchorDisplay, BackendError, BackendStats, DisplayHandle};

    struct Stub {
        name: &'static str,
        available: bool,
    }

    impl RenderBackend for Stub {
        fn name(&self) -> &'static str {
            self.name
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn create(&mut self, _: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
            Ok(DisplayHandle(1))
        }
        fn update(&mut self, _: DisplayHandle, _: &AnchorDisplay) -> Result<(), BackendError> {
            Ok(())
        }
        fn remove(&mut self, _: DisplayHandle) -> Result<(), BackendError> {
            Ok(())
        }
        fn cleanup(&mut self) {}
        fn statistics(&self) -> BackendStats {
            BackendStats::default()
        }
    }

    fn stub(name: &'static str, available: bool) -> Box<dyn RenderBackend> {
        Box::new(Stub { name, available })
    }

    fn candidates(holo: bool, text: bool) -> Vec<(BackendKind, Box<dyn RenderBackend>)> {
        vec![
            (BackendKind::TextDisplay, stub("text-display", text)),
            (BackendKind::Hologram, stub("hologram", holo)),
        ]
    }

    fn picked(choice: BackendChoice, holo: bool, text: bool) -> Option<&'static str> {
        select_backend(choice, candidates(holo, text)).map(|b| b.name())
    }

    #[test]
    fn auto_prefers_holograms_then_text() {
        assert_eq!(picked(BackendChoice::Auto, true, true), Some("hologram"));
        assert_eq!(picked(BackendChoice::Auto, false, true), Some("text-display"));
        assert_eq!(picked(BackendChoice::Auto, false, false), None);
    }

    #[test]
    fn explicit_choice_never_falls_back() {
        assert_eq!(
            picked(BackendChoice::TextDisplay, true, true),
            Some("text-display")
        );
        assert_eq!(picked(BackendChoice::Hologram, false, true), None);
    }

    #[test]
    fn disabled_selects_nothing() {
        assert_eq!(picked(BackendChoice::Disabled, true, true), None);
    }
}
