// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! beacon-core: per-client, world-anchored status markers for locked regions.
//!
//! The pipeline runs beside a fixed-rate hot loop that must never block:
//! readiness gating decides when spatial work is safe, a single background
//! worker computes which anchors a client should see, results come back to
//! the hot loop, get diffed against what is already rendered, and only real
//! changes are debounced into render-backend calls.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

/// Concrete render backends and startup selection.
pub mod backend;
mod canon;
mod clock;
mod collab;
mod content;
mod debounce;
mod eligibility;
mod ident;
mod orchestrator;
mod readiness;
mod state;
mod tracker;

/// Tick counter of the hot loop.
pub use clock::Tick;
/// Collaborator ports consumed read-only by the pipeline.
pub use collab::{
    ClientDirectory, ClientSnapshot, Collaborators, LookupError, Position, RegionOwnership,
    Requirement, RequirementSource, WorldGate,
};
/// Anchor text construction.
pub use content::anchor_lines;
/// Per-anchor last-write-wins update coalescing.
pub use debounce::{PendingUpdate, SweepReport, UpdateDebouncer};
/// Off-loop eligibility computation and job bookkeeping.
pub use eligibility::{
    compute_eligible, AnchorGeometry, CompletedJob, EligibilityComputer, EligibilityError,
    EligibilityRequest, EligibilityResult, JobId, JobLedger, Placement, RegionStatus,
};
/// Identifiers for clients, regions and anchors.
pub use ident::{AnchorId, ClientId, InvalidAnchorId, RegionCoord, Side};
/// The coordinating state machine.
pub use orchestrator::{DisplayOrchestrator, DisplayStats, UpsertRequest};
/// World-transition readiness gating.
pub use readiness::{ReadinessState, WorldReadinessTracker};
/// Rendered-content snapshots and hashing.
pub use state::{content_hash, AnchorState, ContentHash};
/// Bookkeeping of what is currently rendered.
pub use tracker::{AnchorStateCache, TrackedAnchor};

/// Re-export of the render port so hosts need only one dependency.
pub use beacon_render_port as render;
