// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fake world implementing every collaborator port.
//!
//! Regions default to locked and unowned, so any region next to a granted
//! one is automatically a frontier region. Clones share state; tests keep one
//! clone to mutate the world while the orchestrator and its worker read it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::time::Duration;

use beacon_core::{
    ClientDirectory, ClientId, ClientSnapshot, Collaborators, LookupError, Position,
    RegionCoord, RegionOwnership, Requirement, RequirementSource, WorldGate,
};

#[derive(Clone, Copy, Debug)]
struct Region {
    owner: Option<ClientId>,
    locked: bool,
}

#[derive(Default)]
struct State {
    clients: HashMap<ClientId, ClientSnapshot>,
    regions: HashMap<(String, RegionCoord), Region>,
    disabled_worlds: HashSet<String>,
    requirements: HashMap<(String, RegionCoord), Requirement>,
    fail_lookups: bool,
    panic_lookups: bool,
    panic_snapshots: bool,
    panic_gate: bool,
    panic_requirements: HashSet<(String, RegionCoord)>,
}

#[derive(Default)]
struct Pause {
    paused: Mutex<bool>,
    resumed: Condvar,
    entered: AtomicUsize,
}

/// In-memory world: sessions, ownership, per-world gate and requirements.
#[derive(Clone, Default)]
pub struct FakeWorld {
    state: Arc<RwLock<State>>,
    pause: Arc<Pause>,
}

impl FakeWorld {
    /// An empty world with every world enabled.
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Collaborator bundle backed by this world.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::from_shared(&Arc::new(self.clone()))
    }

    /// Puts `client` online in `world` at `position`, or moves it there.
    pub fn place(&self, client: ClientId, world: &str, position: Position) -> &Self {
        self.write().clients.insert(
            client,
            ClientSnapshot {
                id: client,
                world: world.to_owned(),
                position,
            },
        );
        self
    }

    /// Moves an online client within its current world.
    pub fn move_to(&self, client: ClientId, position: Position) -> &Self {
        if let Some(snapshot) = self.write().clients.get_mut(&client) {
            snapshot.position = position;
        }
        self
    }

    /// Takes `client` offline.
    pub fn disconnect(&self, client: ClientId) -> &Self {
        self.write().clients.remove(&client);
        self
    }

    /// Marks `region` unlocked and owned by `owner`.
    pub fn grant(&self, world: &str, region: RegionCoord, owner: ClientId) -> &Self {
        self.write().regions.insert(
            (world.to_owned(), region),
            Region {
                owner: Some(owner),
                locked: false,
            },
        );
        self
    }

    /// Resets `region` to locked and unowned.
    pub fn revoke(&self, world: &str, region: RegionCoord) -> &Self {
        self.write().regions.remove(&(world.to_owned(), region));
        self
    }

    /// Marks `region` unlocked but owned by nobody.
    pub fn unlock_unowned(&self, world: &str, region: RegionCoord) -> &Self {
        self.write().regions.insert(
            (world.to_owned(), region),
            Region {
                owner: None,
                locked: false,
            },
        );
        self
    }

    /// Turns the feature on or off for `world`.
    pub fn set_world_enabled(&self, world: &str, enabled: bool) -> &Self {
        let mut state = self.write();
        if enabled {
            state.disabled_worlds.remove(world);
        } else {
            state.disabled_worlds.insert(world.to_owned());
        }
        drop(state);
        self
    }

    /// Sets the unlock requirement shown for `region`.
    pub fn set_requirement(
        &self,
        world: &str,
        region: RegionCoord,
        requirement: Requirement,
    ) -> &Self {
        self.write()
            .requirements
            .insert((world.to_owned(), region), requirement);
        self
    }

    /// Makes every ownership query fail.
    pub fn set_fail_lookups(&self, fail: bool) -> &Self {
        self.write().fail_lookups = fail;
        self
    }

    /// Makes every ownership query panic.
    pub fn set_panic_lookups(&self, panic: bool) -> &Self {
        self.write().panic_lookups = panic;
        self
    }

    /// Makes every client snapshot panic.
    pub fn set_panic_snapshots(&self, panic: bool) -> &Self {
        self.write().panic_snapshots = panic;
        self
    }

    /// Makes every world-gate query panic.
    pub fn set_panic_gate(&self, panic: bool) -> &Self {
        self.write().panic_gate = panic;
        self
    }

    /// Makes requirement queries for one region panic.
    pub fn panic_requirement_at(&self, world: &str, region: RegionCoord) -> &Self {
        self.write()
            .panic_requirements
            .insert((world.to_owned(), region));
        self
    }

    /// Blocks `regions_owned_by` calls after they have read the world, until
    /// [`FakeWorld::resume_lookups`].
    pub fn pause_lookups(&self) {
        *self.pause.paused.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// Releases calls held by [`FakeWorld::pause_lookups`].
    pub fn resume_lookups(&self) {
        *self.pause.paused.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.pause.resumed.notify_all();
    }

    /// Number of `regions_owned_by` calls so far.
    pub fn lookups_started(&self) -> usize {
        self.pause.entered.load(Ordering::SeqCst)
    }

    /// Waits up to `timeout` for at least `n` `regions_owned_by` calls.
    pub fn wait_for_lookups(&self, n: usize, timeout: Duration) -> bool {
        let step = Duration::from_millis(1);
        let mut waited = Duration::ZERO;
        while self.lookups_started() < n {
            if waited >= timeout {
                return false;
            }
            std::thread::sleep(step);
            waited += step;
        }
        true
    }

    fn hold_if_paused(&self) {
        let mut paused = self.pause.paused.lock().unwrap_or_else(PoisonError::into_inner);
        while *paused {
            paused = self
                .pause
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn check_lookup(state: &State) -> Result<(), LookupError> {
        #[allow(clippy::panic)]
        if state.panic_lookups {
            panic!("simulated ownership backend panic");
        }
        if state.fail_lookups {
            return Err(LookupError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }

    fn region(state: &State, world: &str, region: RegionCoord) -> Region {
        state
            .regions
            .get(&(world.to_owned(), region))
            .copied()
            .unwrap_or(Region {
                owner: None,
                locked: true,
            })
    }
}

impl ClientDirectory for FakeWorld {
    fn snapshot(&self, client: ClientId) -> Option<ClientSnapshot> {
        let (snapshot, explode) = {
            let state = self.read();
            (state.clients.get(&client).cloned(), state.panic_snapshots)
        };
        #[allow(clippy::panic)]
        if explode {
            panic!("simulated session lookup panic");
        }
        snapshot
    }
}

impl RegionOwnership for FakeWorld {
    fn is_locked(&self, world: &str, region: RegionCoord) -> Result<bool, LookupError> {
        let state = self.read();
        Self::check_lookup(&state)?;
        Ok(Self::region(&state, world, region).locked)
    }

    fn owner(&self, world: &str, region: RegionCoord) -> Result<Option<ClientId>, LookupError> {
        let state = self.read();
        Self::check_lookup(&state)?;
        Ok(Self::region(&state, world, region).owner)
    }

    fn regions_owned_by(
        &self,
        world: &str,
        owner: ClientId,
    ) -> Result<Vec<RegionCoord>, LookupError> {
        let owned = {
            let state = self.read();
            Self::check_lookup(&state)?;
            state
                .regions
                .iter()
                .filter(|((w, _), r)| w == world && r.owner == Some(owner))
                .map(|((_, coord), _)| *coord)
                .collect()
        };
        self.pause.entered.fetch_add(1, Ordering::SeqCst);
        self.hold_if_paused();
        Ok(owned)
    }
}

impl WorldGate for FakeWorld {
    fn is_enabled(&self, world: &str) -> bool {
        let (enabled, explode) = {
            let state = self.read();
            (!state.disabled_worlds.contains(world), state.panic_gate)
        };
        #[allow(clippy::panic)]
        if explode {
            panic!("simulated world gate panic");
        }
        enabled
    }
}

impl RequirementSource for FakeWorld {
    fn requirement(&self, world: &str, region: RegionCoord) -> Option<Requirement> {
        let key = (world.to_owned(), region);
        let (requirement, explode) = {
            let state = self.read();
            (
                state.requirements.get(&key).cloned(),
                state.panic_requirements.contains(&key),
            )
        };
        #[allow(clippy::panic)]
        if explode {
            panic!("simulated requirement lookup panic");
        }
        requirement
    }
}
