// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render port contract for Beacon display anchors.
//!
//! This crate defines the boundary between the anchor pipeline and whatever
//! actually puts floating text into the world. It contains NO selection or
//! diffing logic; that lives in `beacon-core`.
//!
//! # Design Principles
//!
//! - **Backends are dumb**: they receive a display and render it. No eligibility logic.
//! - **No time ownership**: all timing comes from the hot loop, not the backend.
//! - **Fault isolation**: every call is independent; a failure for one anchor
//!   never poisons the backend for the others.

use thiserror::Error;

/// Error type for backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The underlying provider is missing or incompatible.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The handle does not belong to this backend (or was already removed).
    #[error("unknown handle {0}")]
    UnknownHandle(DisplayHandle),
    /// The provider rejected or failed the call.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Error reported by a third-party display provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider refused the request (name clash, invalid world, ...).
    #[error("rejected: {0}")]
    Rejected(String),
    /// The referenced display no longer exists on the provider side.
    #[error("display not found: {0}")]
    NotFound(String),
    /// Catch-all failure.
    #[error("{0}")]
    Other(String),
}

mod port;
mod provider;
mod types;

pub use port::RenderBackend;
pub use provider::{HologramProvider, ProviderVersion, TextEntityProvider};
pub use types::{AnchorDisplay, BackendStats, DisplayHandle, DisplayLocation};
