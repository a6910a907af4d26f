// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collaborator ports: the narrow, read-only views of the rest of the system.
//!
//! Ownership persistence, pricing, world gating and session management are
//! implemented elsewhere. The pipeline only ever asks these questions, and may
//! ask them from the eligibility worker thread, hence `Send + Sync`.

use std::sync::Arc;

use thiserror::Error;

use crate::ident::{ClientId, RegionCoord};

/// Failure of a collaborator query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The backing service is not reachable right now.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    /// Any other failure.
    #[error("lookup failed: {0}")]
    Other(String),
}

/// World-space position of a client.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate (height).
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared 3D distance to `other`.
    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// Point-in-time view of one connected client.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientSnapshot {
    /// Client id.
    pub id: ClientId,
    /// World the client is currently in.
    pub world: String,
    /// Current position.
    pub position: Position,
}

/// Session queries. `None` means the client is offline or unknown.
pub trait ClientDirectory: Send + Sync {
    /// Current world and position of `client`.
    fn snapshot(&self, client: ClientId) -> Option<ClientSnapshot>;
}

/// Region ownership and lock queries.
pub trait RegionOwnership: Send + Sync {
    /// Whether `region` in `world` is still locked.
    fn is_locked(&self, world: &str, region: RegionCoord) -> Result<bool, LookupError>;

    /// Owner of `region` in `world`, if any.
    fn owner(&self, world: &str, region: RegionCoord) -> Result<Option<ClientId>, LookupError>;

    /// Every region in `world` recorded as owned by `owner`.
    ///
    /// Callers re-check each entry against [`RegionOwnership::is_locked`] and
    /// [`RegionOwnership::owner`]; stale entries are tolerated.
    fn regions_owned_by(
        &self,
        world: &str,
        owner: ClientId,
    ) -> Result<Vec<RegionCoord>, LookupError>;
}

/// Per-world feature switch.
pub trait WorldGate: Send + Sync {
    /// Whether display anchors are enabled in `world`.
    fn is_enabled(&self, world: &str) -> bool;
}

/// What unlocking a region costs, as display material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// An item cost.
    Items {
        /// Material name.
        material: String,
        /// Quantity required.
        amount: u32,
    },
    /// Free-form cost description.
    Description(String),
}

/// Read-only source of unlock requirements.
pub trait RequirementSource: Send + Sync {
    /// Requirement to unlock `region` in `world`, if known.
    fn requirement(&self, world: &str, region: RegionCoord) -> Option<Requirement>;
}

/// Bundle of collaborator handles injected into the orchestrator.
#[derive(Clone)]
pub struct Collaborators {
    /// Session queries.
    pub clients: Arc<dyn ClientDirectory>,
    /// Ownership and lock queries.
    pub ownership: Arc<dyn RegionOwnership>,
    /// Per-world feature switch.
    pub gate: Arc<dyn WorldGate>,
    /// Unlock requirement text.
    pub requirements: Arc<dyn RequirementSource>,
}

impl Collaborators {
    /// Uses a single object for every port (typical for tests and simple hosts).
    pub fn from_shared<T>(world: &Arc<T>) -> Self
    where
        T: ClientDirectory + RegionOwnership + WorldGate + RequirementSource + 'static,
    {
        Self {
            clients: world.clone(),
            ownership: world.clone(),
            gate: world.clone(),
            requirements: world.clone(),
        }
    }
}
