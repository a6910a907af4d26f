// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Off-loop computation of the anchors a client should see.
//!
//! All computation runs on one dedicated worker thread fed by a FIFO queue, so
//! reads of ownership state never race each other and worst-case overhead is a
//! single computation at a time regardless of how many clients are online.
//!
//! # Supersession
//!
//! Every request gets a job sequence number, recorded as the client's
//! *latest* before the job is queued. Results whose number is no longer the
//! latest are dropped, both on the worker when the computation finishes and on
//! the hot loop when the result is drained. Cancellation is soft: forgetting
//! the latest marker makes any in-flight result irrelevant; the computation
//! itself is never interrupted.

use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use beacon_render_port::DisplayLocation;
use crossbeam::channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::collab::{LookupError, Position, RegionOwnership};
use crate::ident::{AnchorId, ClientId, RegionCoord, Side};

/// Failure inside the eligibility pipeline.
#[derive(Debug, Error)]
pub enum EligibilityError {
    /// An ownership query failed.
    #[error("ownership lookup failed: {0}")]
    Lookup(#[from] LookupError),
    /// The computation panicked.
    #[error("computation panicked: {0}")]
    Panicked(String),
    /// The worker thread could not be started.
    #[error("failed to spawn eligibility worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a region shows up in a client's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionStatus {
    /// Unlocked and owned by the client.
    Unlocked,
    /// Locked and cardinally adjacent to a region the client owns (frontier).
    Locked,
}

/// Where an eligible anchor goes and why it exists.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Status of the anchored region.
    pub status: RegionStatus,
    /// World-space anchor point.
    pub location: DisplayLocation,
}

/// Output of one eligibility computation.
#[derive(Clone, Debug, PartialEq)]
pub struct EligibilityResult {
    /// World the computation ran against.
    pub world: String,
    /// Every anchor that survived the distance cull.
    pub anchors: BTreeMap<AnchorId, Placement>,
    /// Number of owned, unlocked regions considered.
    pub unlocked_count: usize,
    /// Number of frontier regions considered.
    pub frontier_count: usize,
}

impl EligibilityResult {
    /// A result with no anchors.
    pub fn empty(world: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            anchors: BTreeMap::new(),
            unlocked_count: 0,
            frontier_count: 0,
        }
    }

    /// Ids of all eligible anchors.
    pub fn ids(&self) -> impl Iterator<Item = &AnchorId> {
        self.anchors.keys()
    }

    /// Number of eligible anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchor is eligible.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Everything the worker needs; captured on the hot loop at submit time.
#[derive(Clone, Debug, PartialEq)]
pub struct EligibilityRequest {
    /// Client the anchors are for.
    pub client: ClientId,
    /// World the client is in.
    pub world: String,
    /// Client position used for the distance cull.
    pub position: Position,
    /// Horizontal cull radius.
    pub max_distance: f64,
}

/// Maps regions and sides to world-space anchor points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorGeometry {
    /// Edge length of a region in world units.
    pub region_size: u32,
    /// Height of anchors above the client's block Y.
    pub height_offset: f64,
}

impl AnchorGeometry {
    /// Midpoint of `side`'s edge of `region`, at `y`.
    pub fn anchor_point(
        &self,
        world: &str,
        region: RegionCoord,
        side: Side,
        y: f64,
    ) -> DisplayLocation {
        let size = f64::from(self.region_size);
        let min_x = f64::from(region.x) * size;
        let min_z = f64::from(region.z) * size;
        let half = size / 2.0;
        let (x, z) = match side {
            Side::North => (min_x + half, min_z),
            Side::South => (min_x + half, min_z + size),
            Side::West => (min_x, min_z + half),
            Side::East => (min_x + size, min_z + half),
        };
        DisplayLocation::new(world, x, y, z)
    }

    /// Anchor height for a client standing at `position`.
    pub fn anchor_height(&self, position: &Position) -> f64 {
        position.y.floor() + self.height_offset
    }
}

/// Computes eligibility synchronously. Runs on the worker; exposed for tests
/// and for hosts that want a one-shot answer.
///
/// "Owned" means not locked and owned by the client. The frontier is every
/// locked cardinal neighbour of an owned region. Each region of the union
/// contributes one anchor per side whose anchor point lies within
/// `max_distance` (horizontal, compared squared) of the client.
pub fn compute_eligible(
    ownership: &dyn RegionOwnership,
    geometry: &AnchorGeometry,
    request: &EligibilityRequest,
) -> Result<EligibilityResult, EligibilityError> {
    let world = request.world.as_str();
    let client = request.client;

    let mut owned = HashSet::new();
    for region in ownership.regions_owned_by(world, client)? {
        if !ownership.is_locked(world, region)? && ownership.owner(world, region)? == Some(client) {
            owned.insert(region);
        }
    }

    let mut frontier = HashSet::new();
    for region in &owned {
        for neighbor in region.cardinal_neighbors() {
            if owned.contains(&neighbor) || frontier.contains(&neighbor) {
                continue;
            }
            if ownership.is_locked(world, neighbor)? {
                frontier.insert(neighbor);
            }
        }
    }

    let y = geometry.anchor_height(&request.position);
    let max_sq = request.max_distance * request.max_distance;
    let mut anchors = BTreeMap::new();
    let tagged = owned
        .iter()
        .map(|r| (*r, RegionStatus::Unlocked))
        .chain(frontier.iter().map(|r| (*r, RegionStatus::Locked)));
    for (region, status) in tagged {
        for side in Side::ALL {
            let location = geometry.anchor_point(world, region, side, y);
            let dx = location.x - request.position.x;
            let dz = location.z - request.position.z;
            if dx * dx + dz * dz > max_sq {
                continue;
            }
            anchors.insert(
                AnchorId::new(client, world, region, side),
                Placement { status, location },
            );
        }
    }

    Ok(EligibilityResult {
        world: request.world.clone(),
        anchors,
        unlocked_count: owned.len(),
        frontier_count: frontier.len(),
    })
}

/// Identifies one eligibility job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId {
    /// Client the job is for.
    pub client: ClientId,
    /// Sequence number; higher means newer.
    pub seq: u64,
}

/// Latest-job bookkeeping shared between the hot loop and the worker.
#[derive(Debug, Default)]
pub struct JobLedger {
    latest: DashMap<ClientId, u64>,
    next_seq: AtomicU64,
}

impl JobLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new job for `client` and records it as the latest.
    pub fn issue(&self, client: ClientId) -> JobId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest.insert(client, seq);
        JobId { client, seq }
    }

    /// Whether `job` is still the latest for its client.
    pub fn is_current(&self, job: JobId) -> bool {
        self.latest
            .get(&job.client)
            .is_some_and(|seq| *seq == job.seq)
    }

    /// Consumes the latest marker if `job` holds it. Returns `false` for
    /// superseded or cancelled jobs.
    pub fn accept(&self, job: JobId) -> bool {
        self.latest
            .remove_if(&job.client, |_, seq| *seq == job.seq)
            .is_some()
    }

    /// Forgets the latest marker for `client`; any in-flight result is ignored.
    pub fn cancel(&self, client: ClientId) {
        self.latest.remove(&client);
    }

    /// Number of clients with an outstanding job.
    pub fn outstanding(&self) -> usize {
        self.latest.len()
    }
}

/// A finished, still-current job.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedJob {
    /// The job.
    pub job: JobId,
    /// Its result (empty when the computation failed).
    pub result: EligibilityResult,
}

enum WorkerMsg {
    Compute {
        job: JobId,
        request: EligibilityRequest,
    },
    Shutdown,
}

/// Single-lane background eligibility computer.
pub struct EligibilityComputer {
    ledger: Arc<JobLedger>,
    jobs: Sender<WorkerMsg>,
    results: Receiver<CompletedJob>,
    worker: Option<JoinHandle<()>>,
}

impl EligibilityComputer {
    /// Starts the worker thread.
    pub fn spawn(
        ownership: Arc<dyn RegionOwnership>,
        geometry: AnchorGeometry,
    ) -> Result<Self, EligibilityError> {
        let ledger = Arc::new(JobLedger::new());
        let (jobs, job_rx) = unbounded();
        let (result_tx, results) = unbounded();
        let worker_ledger = ledger.clone();
        let worker = std::thread::Builder::new()
            .name("beacon-eligibility".into())
            .spawn(move || run_worker(&*ownership, geometry, &worker_ledger, &job_rx, &result_tx))?;
        info!("eligibility worker started");
        Ok(Self {
            ledger,
            jobs,
            results,
            worker: Some(worker),
        })
    }

    /// Queues a computation for `request.client`, superseding any earlier one.
    pub fn compute_eligible_async(&self, request: EligibilityRequest) -> JobId {
        let job = self.ledger.issue(request.client);
        trace!(client = %job.client, seq = job.seq, "eligibility job queued");
        if self.jobs.send(WorkerMsg::Compute { job, request }).is_err() {
            warn!(client = %job.client, "eligibility worker gone; job dropped");
            self.ledger.cancel(job.client);
        }
        job
    }

    /// Soft-cancels whatever is in flight for `client`.
    pub fn cancel_pending(&self, client: ClientId) {
        self.ledger.cancel(client);
    }

    /// Whether `job` is still the latest for its client.
    pub fn is_latest(&self, job: JobId) -> bool {
        self.ledger.is_current(job)
    }

    /// Number of clients with an outstanding job.
    pub fn pending_jobs(&self) -> usize {
        self.ledger.outstanding()
    }

    /// Non-blocking: collects finished jobs that are still current.
    ///
    /// Call from the hot loop; this is where results cross back.
    pub fn drain_completed(&self) -> Vec<CompletedJob> {
        self.results
            .try_iter()
            .filter(|done| {
                let keep = self.ledger.accept(done.job);
                if !keep {
                    trace!(
                        client = %done.job.client,
                        seq = done.job.seq,
                        "superseded result dropped"
                    );
                }
                keep
            })
            .collect()
    }

    /// Stops the worker and waits for it. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.jobs.send(WorkerMsg::Shutdown);
        if worker.join().is_err() {
            warn!("eligibility worker panicked during shutdown");
        }
        info!("eligibility worker stopped");
    }
}

impl Drop for EligibilityComputer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    ownership: &dyn RegionOwnership,
    geometry: AnchorGeometry,
    ledger: &JobLedger,
    jobs: &Receiver<WorkerMsg>,
    results: &Sender<CompletedJob>,
) {
    for msg in jobs {
        let (job, request) = match msg {
            WorkerMsg::Compute { job, request } => (job, request),
            WorkerMsg::Shutdown => break,
        };
        // Queued behind a newer job for the same client: nothing to compute.
        if !ledger.is_current(job) {
            trace!(client = %job.client, seq = job.seq, "skipping superseded job");
            continue;
        }
        let result = run_guarded(ownership, &geometry, &request);
        if !ledger.is_current(job) {
            trace!(client = %job.client, seq = job.seq, "discarding superseded result");
            continue;
        }
        debug!(
            client = %job.client,
            seq = job.seq,
            anchors = result.len(),
            unlocked = result.unlocked_count,
            frontier = result.frontier_count,
            "eligibility computed"
        );
        if results.send(CompletedJob { job, result }).is_err() {
            break;
        }
    }
}

fn run_guarded(
    ownership: &dyn RegionOwnership,
    geometry: &AnchorGeometry,
    request: &EligibilityRequest,
) -> EligibilityResult {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        compute_eligible(ownership, geometry, request)
    }))
    .unwrap_or_else(|payload| Err(EligibilityError::Panicked(panic_message(&*payload))));
    outcome.unwrap_or_else(|err| {
        warn!(
            client = %request.client,
            world = %request.world,
            %err,
            "eligibility computation failed"
        );
        EligibilityResult::empty(request.world.clone())
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
