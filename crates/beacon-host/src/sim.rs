// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic simulated world the host runs against.
//!
//! Players start in the middle of their home region in the overworld and
//! stand still for a while, then wander along their home row. Every so often
//! one of them claims the next region east. Player 0 periodically visits the
//! nether, where the feature is disabled.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use beacon_core::{
    ClientDirectory, ClientId, ClientSnapshot, LookupError, Position, RegionCoord,
    RegionOwnership, Requirement, RequirementSource, Tick, WorldGate,
};

/// Main world.
pub const OVERWORLD: &str = "overworld";
/// Side world with display anchors disabled.
pub const NETHER: &str = "nether";

const WANDER_EVERY: u64 = 200;
const CLAIM_EVERY: u64 = 600;
const MAX_CLAIMS: i32 = 3;
const VISIT_EVERY: u64 = 1_000;
const PLAYER_SPACING: i32 = 6;

/// Something the host must forward to the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// A player changed world.
    WorldChanged {
        /// Who moved.
        client: ClientId,
        /// Where to.
        world: String,
    },
}

#[derive(Debug)]
struct Player {
    world: String,
    home: RegionCoord,
    position: Position,
    claims: i32,
}

#[derive(Debug, Default)]
struct SimState {
    players: BTreeMap<ClientId, Player>,
    owners: HashMap<(String, RegionCoord), ClientId>,
}

/// The simulated world.
#[derive(Debug)]
pub struct SimWorld {
    region_size: u32,
    state: RwLock<SimState>,
}

/// Id of simulated player `index`.
pub fn player_id(index: u32) -> ClientId {
    ClientId::from_u128(0x5EED_0000 + u128::from(index))
}

impl SimWorld {
    /// `players` players, each owning their home region in the overworld.
    pub fn new(players: u32, region_size: u32) -> Self {
        let mut state = SimState::default();
        for i in 0..players {
            let column = i32::try_from(i).unwrap_or(i32::MAX);
            let home = RegionCoord::new(column.saturating_mul(PLAYER_SPACING), 0);
            let client = player_id(i);
            state.owners.insert((OVERWORLD.to_owned(), home), client);
            let player = Player {
                world: OVERWORLD.to_owned(),
                home,
                position: Position::default(),
                claims: 0,
            };
            state.players.insert(client, player);
        }
        let sim = Self {
            region_size,
            state: RwLock::new(state),
        };
        sim.settle_positions(Tick::ZERO);
        sim
    }

    fn read(&self) -> RwLockReadGuard<'_, SimState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SimState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every online player and their world.
    pub fn online(&self) -> Vec<(ClientId, String)> {
        self.read()
            .players
            .iter()
            .map(|(id, p)| (*id, p.world.clone()))
            .collect()
    }

    /// Advances the simulation to `tick`.
    pub fn step(&self, tick: Tick) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if tick.0 > 0 && tick.0.is_multiple_of(CLAIM_EVERY) {
            self.claim_next(tick);
        }
        if tick.0 > 0 && tick.0.is_multiple_of(VISIT_EVERY) {
            events.extend(self.toggle_visit());
        }
        if tick.0.is_multiple_of(WANDER_EVERY) {
            self.settle_positions(tick);
        }
        events
    }

    fn claim_next(&self, tick: Tick) {
        let mut state = self.write();
        let count = state.players.len();
        if count == 0 {
            return;
        }
        let index = usize::try_from(tick.0 / CLAIM_EVERY).unwrap_or(0) % count;
        let Some((client, player)) = state.players.iter_mut().nth(index) else {
            return;
        };
        if player.claims >= MAX_CLAIMS {
            return;
        }
        player.claims += 1;
        let region = RegionCoord::new(player.home.x + player.claims, player.home.z);
        let client = *client;
        state.owners.insert((OVERWORLD.to_owned(), region), client);
        tracing::debug!(%client, %region, "simulated claim");
    }

    fn toggle_visit(&self) -> Option<SimEvent> {
        let mut state = self.write();
        let (client, player) = state.players.iter_mut().next()?;
        player.world = if player.world == OVERWORLD {
            NETHER.to_owned()
        } else {
            OVERWORLD.to_owned()
        };
        Some(SimEvent::WorldChanged {
            client: *client,
            world: player.world.clone(),
        })
    }

    /// Places every player on their home row; the column depends on `tick`.
    fn settle_positions(&self, tick: Tick) {
        let size = f64::from(self.region_size);
        let phase = f64::from(u8::try_from((tick.0 / WANDER_EVERY) % 4).unwrap_or(0));
        let mut state = self.write();
        for player in state.players.values_mut() {
            let x = f64::from(player.home.x).mul_add(size, size / 2.0) + phase * size / 4.0;
            let z = f64::from(player.home.z).mul_add(size, size / 2.0);
            player.position = Position::new(x, 64.0, z);
        }
    }
}

impl ClientDirectory for SimWorld {
    fn snapshot(&self, client: ClientId) -> Option<ClientSnapshot> {
        self.read().players.get(&client).map(|p| ClientSnapshot {
            id: client,
            world: p.world.clone(),
            position: p.position,
        })
    }
}

impl RegionOwnership for SimWorld {
    fn is_locked(&self, world: &str, region: RegionCoord) -> Result<bool, LookupError> {
        Ok(!self.read().owners.contains_key(&(world.to_owned(), region)))
    }

    fn owner(&self, world: &str, region: RegionCoord) -> Result<Option<ClientId>, LookupError> {
        Ok(self.read().owners.get(&(world.to_owned(), region)).copied())
    }

    fn regions_owned_by(
        &self,
        world: &str,
        owner: ClientId,
    ) -> Result<Vec<RegionCoord>, LookupError> {
        Ok(self
            .read()
            .owners
            .iter()
            .filter(|((w, _), o)| w == world && **o == owner)
            .map(|((_, region), _)| *region)
            .collect())
    }
}

impl WorldGate for SimWorld {
    fn is_enabled(&self, world: &str) -> bool {
        world != NETHER
    }
}

impl RequirementSource for SimWorld {
    fn requirement(&self, _world: &str, region: RegionCoord) -> Option<Requirement> {
        let distance = region.x.unsigned_abs() + region.z.unsigned_abs();
        Some(Requirement::Items {
            material: "emerald".to_owned(),
            amount: 2 + distance,
        })
    }
}
