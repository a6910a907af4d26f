// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The coordinating state machine.
//!
//! [`DisplayOrchestrator`] owns every piece of per-client and per-anchor
//! state and is driven by [`DisplayOrchestrator::tick`] from the host's hot
//! loop. One tick, in order:
//!
//! 1. advance readiness for every known client (offline clients are dropped,
//!    clients that just became stable are refreshed at once);
//! 2. run refresh cycles that are due;
//! 3. apply eligibility results delivered by the worker since the last tick;
//! 4. sweep the debouncer into backend calls.
//!
//! Nothing here returns an error to the caller. Collaborator and backend
//! failures are logged and absorbed; the next refresh repairs what they left
//! behind. Collaborator calls made on the hot loop run under `catch_unwind`:
//! a panicking directory reads as offline, a panicking gate as disabled and a
//! panicking requirement source as an unknown requirement.

use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use beacon_app_core::prefs::DisplayPrefs;
use beacon_render_port::{
    AnchorDisplay, BackendError, BackendStats, DisplayHandle, RenderBackend,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::clock::Tick;
use crate::collab::{ClientSnapshot, Collaborators, Requirement};
use crate::content::anchor_lines;
use crate::debounce::UpdateDebouncer;
use crate::eligibility::{
    AnchorGeometry, EligibilityComputer, EligibilityError, EligibilityRequest, EligibilityResult,
    RegionStatus,
};
use crate::ident::{AnchorId, ClientId, RegionCoord};
use crate::readiness::{ReadinessState, WorldReadinessTracker};
use crate::state::{content_hash, AnchorState, ContentHash};
use crate::tracker::AnchorStateCache;

/// Vertical distance an anchor may lag behind its client before it is moved.
const HEIGHT_HYSTERESIS: f64 = 3.0;

/// Payload of a debounced create-or-update.
#[derive(Clone, Debug, PartialEq)]
pub struct UpsertRequest {
    /// What to render.
    pub display: AnchorDisplay,
    /// Hash of `display`'s location and lines.
    pub hash: ContentHash,
}

/// Operational counters. Observability only; the shape may change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DisplayStats {
    /// Clients with a refresh schedule.
    pub clients: usize,
    /// Clients still waiting for readiness.
    pub awaiting_readiness: usize,
    /// Anchors currently rendered.
    pub active_anchors: usize,
    /// Clients with an eligibility job in flight.
    pub pending_jobs: usize,
    /// Debounced updates not yet applied.
    pub pending_updates: usize,
    /// Counters of the active backend, if any.
    pub backend: Option<BackendStats>,
}

/// Drives display anchors for every connected client.
pub struct DisplayOrchestrator {
    prefs: DisplayPrefs,
    collab: Collaborators,
    readiness: WorldReadinessTracker,
    computer: EligibilityComputer,
    debouncer: UpdateDebouncer<UpsertRequest>,
    cache: AnchorStateCache,
    backend: Option<Box<dyn RenderBackend>>,
    next_refresh: BTreeMap<ClientId, Tick>,
    bypass: HashSet<ClientId>,
    now: Tick,
}

impl DisplayOrchestrator {
    /// Builds an orchestrator and starts its eligibility worker.
    ///
    /// `backend` is the outcome of [`crate::backend::select_backend`]; `None`
    /// keeps readiness tracking alive but never renders anything.
    pub fn new(
        prefs: &DisplayPrefs,
        collab: Collaborators,
        backend: Option<Box<dyn RenderBackend>>,
    ) -> Result<Self, EligibilityError> {
        let (prefs, fixed) = prefs.sanitized();
        if !fixed.is_empty() {
            warn!(?fixed, "display prefs out of range; defaults used");
        }
        let geometry = AnchorGeometry {
            region_size: prefs.region_size,
            height_offset: prefs.anchor_height_offset,
        };
        let computer = EligibilityComputer::spawn(collab.ownership.clone(), geometry)?;
        match &backend {
            Some(b) => info!(backend = b.name(), "display orchestrator ready"),
            None => info!("display orchestrator ready without a backend"),
        }
        Ok(Self {
            readiness: WorldReadinessTracker::new(
                prefs.stability_threshold,
                prefs.required_stable_ticks,
            ),
            debouncer: UpdateDebouncer::new(prefs.debounce_ticks),
            prefs,
            collab,
            computer,
            cache: AnchorStateCache::new(),
            backend,
            next_refresh: BTreeMap::new(),
            bypass: HashSet::new(),
            now: Tick::ZERO,
        })
    }

    /// Effective (sanitized) preferences.
    pub fn prefs(&self) -> &DisplayPrefs {
        &self.prefs
    }

    /// Tick of the most recent [`DisplayOrchestrator::tick`].
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Name of the active backend, if any.
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// A client connected in `world`.
    pub fn client_joined(&mut self, client: ClientId, world: &str) {
        info!(%client, world, "client joined");
        self.register_world_transition(client, world);
    }

    /// A client disconnected: tear down and forget everything about it.
    pub fn client_left(&mut self, client: ClientId) {
        self.remove_all_for_client(client);
        self.readiness.forget(client);
        self.next_refresh.remove(&client);
        self.bypass.remove(&client);
        info!(%client, "client left");
    }

    /// The client is moving to `target_world` (join, teleport, world change).
    ///
    /// Its anchors go away immediately; a new readiness episode starts and
    /// the client is scheduled for refresh.
    pub fn register_world_transition(&mut self, client: ClientId, target_world: &str) {
        self.remove_all_for_client(client);
        self.readiness.register_transition(client, target_world);
        self.next_refresh.entry(client).or_insert(self.now);
    }

    /// Turns administrative bypass on or off for `client`.
    pub fn set_bypass(&mut self, client: ClientId, bypass: bool) {
        if bypass {
            if self.bypass.insert(client) {
                debug!(%client, "bypass enabled");
                self.remove_all_for_client(client);
            }
        } else if self.bypass.remove(&client) {
            debug!(%client, "bypass disabled");
            self.refresh_for_client(client);
        }
    }

    /// Whether `client` is in bypass mode.
    pub fn is_bypassed(&self, client: ClientId) -> bool {
        self.bypass.contains(&client)
    }

    /// Marks `client` stable without waiting; refreshes if that changed
    /// anything.
    pub fn force_stable(&mut self, client: ClientId) {
        if self.readiness.force_stable(client) {
            debug!(%client, "readiness forced");
            self.next_refresh.entry(client).or_insert(self.now);
            self.refresh_for_client(client);
        }
    }

    /// Readiness of `client`.
    pub fn readiness(&self, client: ClientId) -> Option<ReadinessState> {
        self.readiness.state(client)
    }

    /// Recomputes `client`'s anchors now, outside the normal cadence, and
    /// restarts its refresh interval.
    pub fn refresh_for_client(&mut self, client: ClientId) {
        self.run_cycle(client);
        if let Some(next) = self.next_refresh.get_mut(&client) {
            *next = self.now.after(self.prefs.refresh_interval_ticks);
        }
    }

    /// Removes every anchor of `client` right away (no debounce) and cancels
    /// its in-flight job and pending updates.
    pub fn remove_all_for_client(&mut self, client: ClientId) {
        self.computer.cancel_pending(client);
        let cancelled = self.debouncer.cancel_for_client(client);
        let removed = self.cache.remove_client_anchors(client);
        if removed.is_empty() && cancelled == 0 {
            return;
        }
        let mut failed = 0_usize;
        if let Some(backend) = self.backend.as_mut() {
            for (id, tracked) in &removed {
                if !remove_isolated(&mut **backend, id, tracked.handle) {
                    failed += 1;
                }
            }
        }
        debug!(%client, removed = removed.len(), cancelled, failed, "client anchors torn down");
    }

    /// Anchors currently rendered for `client`.
    pub fn tracked_anchors(&self, client: ClientId) -> Vec<AnchorId> {
        let mut ids = self.cache.client_anchor_keys(client);
        ids.sort_unstable();
        ids
    }

    /// Last rendered state of `anchor`.
    pub fn anchor_state(&self, anchor: &AnchorId) -> Option<AnchorState> {
        self.cache.state(anchor)
    }

    /// Advances the pipeline to `now`. Call once per hot-loop tick.
    pub fn tick(&mut self, now: Tick) {
        self.now = now;
        self.poll_readiness();
        self.run_due_refreshes();
        for done in self.computer.drain_completed() {
            self.apply_result(done.job.client, &done.result);
        }
        self.sweep_updates();
    }

    /// Current counters.
    pub fn statistics(&self) -> DisplayStats {
        DisplayStats {
            clients: self.next_refresh.len(),
            awaiting_readiness: self.readiness.pending_episodes(),
            active_anchors: self.cache.len(),
            pending_jobs: self.computer.pending_jobs(),
            pending_updates: self.debouncer.len(),
            backend: self
                .backend
                .as_ref()
                .and_then(|b| isolated("backend statistics", None, || Some(b.statistics()))),
        }
    }

    /// Tears down every client, cleans up the backend and stops the worker.
    #[instrument(skip(self))]
    pub fn shutdown(&mut self) {
        let clients: Vec<ClientId> = self.next_refresh.keys().copied().collect();
        for client in clients {
            self.remove_all_for_client(client);
        }
        self.next_refresh.clear();
        if let Some(backend) = self.backend.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| backend.cleanup())).is_err() {
                error!(backend = backend.name(), "backend cleanup panicked");
            }
        }
        self.computer.shutdown();
        info!("display orchestrator stopped");
    }

    fn snapshot(&self, client: ClientId) -> Option<ClientSnapshot> {
        isolated("client directory", None, || self.collab.clients.snapshot(client))
    }

    fn world_enabled(&self, world: &str) -> bool {
        isolated("world gate", false, || self.collab.gate.is_enabled(world))
    }

    fn requirement(&self, world: &str, region: RegionCoord) -> Option<Requirement> {
        isolated("requirement source", None, || self.collab.requirements.requirement(world, region))
    }

    fn poll_readiness(&mut self) {
        let clients: Vec<ClientId> = self.next_refresh.keys().copied().collect();
        for client in clients {
            match self.snapshot(client) {
                None => {
                    debug!(%client, "client offline");
                    self.client_left(client);
                }
                Some(snapshot) => {
                    if self.readiness.update(&snapshot) {
                        self.refresh_for_client(client);
                    }
                }
            }
        }
    }

    fn run_due_refreshes(&mut self) {
        let now = self.now;
        let due: Vec<ClientId> = self
            .next_refresh
            .iter()
            .filter(|(_, next)| now.reached(**next))
            .map(|(client, _)| *client)
            .collect();
        for client in due {
            self.refresh_for_client(client);
        }
    }

    fn run_cycle(&mut self, client: ClientId) {
        if self.backend.is_none() {
            return;
        }
        let Some(snapshot) = self.snapshot(client) else {
            self.remove_all_for_client(client);
            return;
        };
        let skip = if !self.readiness.is_stable(client) {
            Some("not stable")
        } else if self.bypass.contains(&client) {
            Some("bypassed")
        } else if !self.world_enabled(&snapshot.world) {
            Some("world disabled")
        } else {
            None
        };
        if let Some(reason) = skip {
            trace!(%client, reason, "refresh skipped");
            self.remove_all_for_client(client);
            return;
        }
        self.computer.compute_eligible_async(EligibilityRequest {
            client,
            world: snapshot.world,
            position: snapshot.position,
            max_distance: self.prefs.max_distance,
        });
    }

    fn still_applicable(&self, client: ClientId, result: &EligibilityResult) -> bool {
        let Some(snapshot) = self.snapshot(client) else {
            return false;
        };
        snapshot.world == result.world
            && self.readiness.is_stable(client)
            && !self.bypass.contains(&client)
            && self.world_enabled(&result.world)
    }

    fn apply_result(&mut self, client: ClientId, result: &EligibilityResult) {
        if !self.still_applicable(client, result) {
            trace!(%client, "eligibility result no longer applicable");
            return;
        }

        let mut scheduled = 0_usize;
        for (id, placement) in &result.anchors {
            let requirement = match placement.status {
                RegionStatus::Locked => self.requirement(&result.world, id.region()),
                RegionStatus::Unlocked => None,
            };
            let lines = anchor_lines(id.region(), placement.status, requirement.as_ref());
            let rendered = self.cache.state(id);
            let mut location = placement.location.clone();
            if let Some(state) = &rendered {
                if (state.location().y - location.y).abs() < HEIGHT_HYSTERESIS {
                    location.y = state.location().y;
                }
            }
            let hash = content_hash(&location, &lines);

            if let Some(state) = &rendered {
                if !AnchorStateCache::needs_update(state, hash, &location) {
                    self.debouncer.cancel_update(id);
                    continue;
                }
            }
            if self
                .debouncer
                .pending(id)
                .is_some_and(|p| p.payload.hash == hash)
            {
                continue;
            }
            let display = AnchorDisplay {
                key: id.to_string(),
                location,
                lines,
            };
            self.debouncer
                .schedule_update(id.clone(), UpsertRequest { display, hash }, self.now);
            scheduled += 1;
        }

        let mut removed = 0_usize;
        for id in self.cache.client_anchor_keys(client) {
            if result.anchors.contains_key(&id) {
                continue;
            }
            self.debouncer.cancel_update(&id);
            if let Some(handle) = self.cache.untrack(&id) {
                if let Some(backend) = self.backend.as_mut() {
                    remove_isolated(&mut **backend, &id, handle);
                }
                removed += 1;
            }
        }
        for id in self.debouncer.pending_for_client(client) {
            if !result.anchors.contains_key(&id) {
                self.debouncer.cancel_update(&id);
            }
        }

        trace!(
            %client,
            eligible = result.len(),
            unlocked = result.unlocked_count,
            frontier = result.frontier_count,
            scheduled,
            removed,
            "eligibility applied"
        );
    }

    fn sweep_updates(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let cache = &self.cache;
        let now = self.now;
        let report = self.debouncer.sweep(now, |id, request| {
            apply_upsert(&mut **backend, cache, id, request, now)
        });
        if report.failed > 0 {
            debug!(applied = report.applied, failed = report.failed, "update sweep had failures");
        }
    }
}

/// Creates or updates one anchor and records the result.
///
/// A failed update removes the anchor from the backend and the cache so the
/// next refresh recreates it from scratch; a failed create tracks nothing.
fn apply_upsert(
    backend: &mut dyn RenderBackend,
    cache: &AnchorStateCache,
    id: &AnchorId,
    request: UpsertRequest,
    now: Tick,
) -> Result<(), BackendError> {
    let UpsertRequest { display, hash } = request;
    if let Some(handle) = cache.handle(id) {
        if let Err(err) = backend.update(handle, &display) {
            cache.untrack(id);
            if let Err(remove_err) = backend.remove(handle) {
                trace!(anchor = %id, %remove_err, "remove after failed update also failed");
            }
            return Err(err);
        }
        trace!(anchor = %id, %handle, "anchor updated");
        cache.track(id.clone(), handle, AnchorState::rendered(hash, display.location, now));
    } else {
        let handle = backend.create(&display)?;
        trace!(anchor = %id, %handle, "anchor created");
        cache.track(id.clone(), handle, AnchorState::rendered(hash, display.location, now));
    }
    Ok(())
}

/// Runs one collaborator call on the hot loop; a panic yields `fallback`.
fn isolated<T>(collaborator: &'static str, fallback: T, call: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|_| {
        error!(collaborator, "collaborator panicked; fallback used");
        fallback
    })
}

/// Removes one anchor, absorbing errors and panics. Returns success.
fn remove_isolated(
    backend: &mut dyn RenderBackend,
    id: &AnchorId,
    handle: DisplayHandle,
) -> bool {
    match catch_unwind(AssertUnwindSafe(|| backend.remove(handle))) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!(anchor = %id, %handle, %err, "anchor removal failed");
            false
        }
        Err(_) => {
            error!(anchor = %id, %handle, "anchor removal panicked");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use beacon_render_port::DisplayLocation;

    use super::*;
    use crate::collab::{
        ClientDirectory, ClientSnapshot, LookupError, Position, RegionOwnership, Requirement,
        RequirementSource, WorldGate,
    };
    use crate::ident::RegionCoord;

    const ALICE: ClientId = ClientId::from_u128(0xA11CE);

    /// Alice stands still at the centre of region (0,0), which she owns.
    struct Plot;

    impl ClientDirectory for Plot {
        fn snapshot(&self, client: ClientId) -> Option<ClientSnapshot> {
            (client == ALICE).then(|| ClientSnapshot {
                id: ALICE,
                world: "w".into(),
                position: Position::new(8.0, 64.0, 8.0),
            })
        }
    }

    impl RegionOwnership for Plot {
        fn is_locked(&self, _: &str, region: RegionCoord) -> Result<bool, LookupError> {
            Ok(region != RegionCoord::new(0, 0))
        }
        fn owner(&self, _: &str, region: RegionCoord) -> Result<Option<ClientId>, LookupError> {
            Ok((region == RegionCoord::new(0, 0)).then_some(ALICE))
        }
        fn regions_owned_by(
            &self,
            _: &str,
            owner: ClientId,
        ) -> Result<Vec<RegionCoord>, LookupError> {
            Ok(if owner == ALICE {
                vec![RegionCoord::new(0, 0)]
            } else {
                Vec::new()
            })
        }
    }

    impl WorldGate for Plot {
        fn is_enabled(&self, _: &str) -> bool {
            true
        }
    }

    impl RequirementSource for Plot {
        fn requirement(&self, _: &str, _: RegionCoord) -> Option<Requirement> {
            Some(Requirement::Items { material: "gold".into(), amount: 3 })
        }
    }

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<&'static str>>>);

    impl Calls {
        fn count(&self, what: &str) -> usize {
            self.0.lock().unwrap().iter().filter(|c| **c == what).count()
        }
    }

    struct Counting {
        calls: Calls,
        next: u64,
    }

    impl RenderBackend for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn create(&mut self, _: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
            self.calls.0.lock().unwrap().push("create");
            self.next += 1;
            Ok(DisplayHandle(self.next))
        }
        fn update(&mut self, _: DisplayHandle, _: &AnchorDisplay) -> Result<(), BackendError> {
            self.calls.0.lock().unwrap().push("update");
            Ok(())
        }
        fn remove(&mut self, _: DisplayHandle) -> Result<(), BackendError> {
            self.calls.0.lock().unwrap().push("remove");
            Ok(())
        }
        fn cleanup(&mut self) {
            self.calls.0.lock().unwrap().push("cleanup");
        }
        fn statistics(&self) -> BackendStats {
            BackendStats { backend: "counting", ..BackendStats::default() }
        }
    }

    fn prefs() -> DisplayPrefs {
        DisplayPrefs {
            refresh_interval_ticks: 1_000,
            debounce_ticks: 2,
            max_distance: 1_000.0,
            ..DisplayPrefs::default()
        }
    }

    fn orchestrator(backend: bool) -> (DisplayOrchestrator, Calls) {
        let calls = Calls::default();
        let backend: Option<Box<dyn RenderBackend>> = backend.then(|| {
            Box::new(Counting { calls: calls.clone(), next: 0 }) as Box<dyn RenderBackend>
        });
        let orch =
            DisplayOrchestrator::new(&prefs(), Collaborators::from_shared(&Arc::new(Plot)), backend)
                .unwrap();
        (orch, calls)
    }

    /// Ticks at `now` until the worker has delivered everything.
    fn settle(orch: &mut DisplayOrchestrator, now: Tick) {
        for _ in 0..2_000 {
            orch.tick(now);
            if orch.statistics().pending_jobs == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("eligibility worker did not settle");
    }

    #[test]
    fn broken_prefs_are_sanitized() {
        let bad = DisplayPrefs { refresh_interval_ticks: 0, ..prefs() };
        let orch =
            DisplayOrchestrator::new(&bad, Collaborators::from_shared(&Arc::new(Plot)), None)
                .unwrap();
        assert_eq!(orch.prefs().refresh_interval_ticks, 20);
    }

    #[test]
    fn without_backend_nothing_is_computed() {
        let (mut orch, _) = orchestrator(false);
        orch.client_joined(ALICE, "w");
        orch.force_stable(ALICE);
        orch.tick(Tick(1));
        let stats = orch.statistics();
        assert_eq!(stats.pending_jobs, 0);
        assert_eq!(stats.backend, None);
        assert_eq!(orch.backend_name(), None);
    }

    #[test]
    fn stable_client_gets_anchors_after_debounce() {
        let (mut orch, calls) = orchestrator(true);
        orch.client_joined(ALICE, "w");
        orch.force_stable(ALICE);
        settle(&mut orch, Tick(0));
        // Owned region plus four locked neighbours, four sides each.
        assert_eq!(orch.statistics().pending_updates, 20);
        assert_eq!(calls.count("create"), 0);

        orch.tick(Tick(2));
        assert_eq!(calls.count("create"), 20);
        assert_eq!(orch.tracked_anchors(ALICE).len(), 20);
        let first = orch.tracked_anchors(ALICE)[0].clone();
        let state = orch.anchor_state(&first).unwrap();
        assert!(state.spawned() && state.active());
        assert_eq!(state.last_update_tick(), Tick(2));
    }

    #[test]
    fn bypass_tears_down_and_release_refreshes() {
        let (mut orch, calls) = orchestrator(true);
        orch.client_joined(ALICE, "w");
        orch.force_stable(ALICE);
        settle(&mut orch, Tick(0));
        orch.tick(Tick(2));
        assert_eq!(orch.statistics().active_anchors, 20);

        orch.set_bypass(ALICE, true);
        assert!(orch.is_bypassed(ALICE));
        assert_eq!(orch.statistics().active_anchors, 0);
        assert_eq!(calls.count("remove"), 20);

        orch.set_bypass(ALICE, false);
        settle(&mut orch, Tick(3));
        orch.tick(Tick(5));
        assert_eq!(orch.statistics().active_anchors, 20);
    }

    #[test]
    fn isolated_call_falls_back_on_panic() {
        assert_eq!(isolated("test", 7, || panic!("collaborator blew up")), 7);
        assert_eq!(isolated("test", 7, || 3), 3);
    }

    #[test]
    fn shutdown_cleans_up_backend() {
        let (mut orch, calls) = orchestrator(true);
        orch.client_joined(ALICE, "w");
        orch.shutdown();
        assert_eq!(calls.count("cleanup"), 1);
        assert_eq!(orch.statistics().clients, 0);
    }

    #[test]
    fn upsert_failure_on_update_untracks() {
        struct Broken;
        impl RenderBackend for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn is_available(&self) -> bool {
                true
            }
            fn create(&mut self, _: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
                Ok(DisplayHandle(7))
            }
            fn update(&mut self, h: DisplayHandle, _: &AnchorDisplay) -> Result<(), BackendError> {
                Err(BackendError::UnknownHandle(h))
            }
            fn remove(&mut self, _: DisplayHandle) -> Result<(), BackendError> {
                Ok(())
            }
            fn cleanup(&mut self) {}
            fn statistics(&self) -> BackendStats {
                BackendStats::default()
            }
        }

        let cache = AnchorStateCache::new();
        let id = AnchorId::new(ALICE, "w", RegionCoord::new(0, 0), crate::ident::Side::North);
        let display = AnchorDisplay {
            key: id.to_string(),
            location: DisplayLocation::new("w", 8.0, 65.5, 0.0),
            lines: vec!["Unlocked".into()],
        };
        let hash = content_hash(&display.location, &display.lines);
        let request = UpsertRequest { display, hash };

        apply_upsert(&mut Broken, &cache, &id, request.clone(), Tick(1)).unwrap();
        assert_eq!(cache.handle(&id), Some(DisplayHandle(7)));
        assert!(apply_upsert(&mut Broken, &cache, &id, request, Tick(2)).is_err());
        assert!(!cache.is_tracked(&id));
    }
}
