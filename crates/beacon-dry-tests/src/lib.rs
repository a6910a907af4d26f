// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Beacon crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`world`] - Fake world implementing every collaborator port
//! - [`backend`] - Recording render backend with failure injection
//! - [`providers`] - Fake hologram and text-entity providers
//! - [`pump`] - Helpers that drive an orchestrator until the worker is idle

pub mod backend;
pub mod config;
pub mod providers;
pub mod pump;
pub mod world;

pub use backend::{BackendLog, RecordingBackend};
pub use config::InMemoryConfigStore;
pub use providers::{FakeHologramProvider, FakeTextEntityProvider};
pub use pump::{settle, settle_and_flush};
pub use world::FakeWorld;
