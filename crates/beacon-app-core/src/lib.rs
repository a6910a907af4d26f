// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Beacon (config storage, display prefs).
//! Keeps host adapters thin and framework-agnostic.

pub mod config;
pub mod prefs;
