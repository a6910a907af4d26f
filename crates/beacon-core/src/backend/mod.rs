// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Concrete render backends and startup selection.
//!
//! One backend per display provider, each written against a statically known
//! provider trait from `beacon-render-port`. Availability is checked once, at
//! construction; [`select_backend`] then picks the first available candidate
//! in [`PREFERENCE_ORDER`] (or honours an explicit choice).

mod hologram;
mod select;
mod text_display;

pub use hologram::{HologramBackend, MIN_HOLOGRAM_VERSION};
pub use select::{select_backend, BackendKind, PREFERENCE_ORDER};
pub use text_display::TextDisplayBackend;
