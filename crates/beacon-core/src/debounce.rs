// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-anchor update coalescing.
//!
//! Bursts of changes (rapid inventory edits, ownership churn) would otherwise
//! turn into a backend call per change. The debouncer keeps at most one
//! pending update per anchor; scheduling again replaces the payload and pushes
//! the deadline out (last write wins, no history). A sweep on every tick
//! applies whatever is due.

use std::collections::HashMap;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, trace, warn};

use crate::clock::Tick;
use crate::ident::{AnchorId, ClientId};

/// One pending update.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingUpdate<P> {
    /// Anchor the update is for.
    pub anchor_id: AnchorId,
    /// Tick at which the update becomes due.
    pub scheduled_tick: Tick,
    /// What to apply.
    pub payload: P,
}

/// Outcome counters of one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Updates applied successfully.
    pub applied: usize,
    /// Updates whose action returned an error or panicked.
    pub failed: usize,
}

/// Last-write-wins debouncer keyed by anchor.
#[derive(Debug)]
pub struct UpdateDebouncer<P> {
    pending: HashMap<AnchorId, PendingUpdate<P>>,
    delay: u64,
}

impl<P> UpdateDebouncer<P> {
    /// Creates a debouncer that defers every update by `delay_ticks`.
    pub fn new(delay_ticks: u64) -> Self {
        Self {
            pending: HashMap::new(),
            delay: delay_ticks,
        }
    }

    /// Replaces any pending update for `anchor_id` with `payload`, due at
    /// `now + delay`.
    pub fn schedule_update(&mut self, anchor_id: AnchorId, payload: P, now: Tick) {
        let scheduled_tick = now.after(self.delay);
        trace!(anchor = %anchor_id, due = %scheduled_tick, "update scheduled");
        self.pending.insert(
            anchor_id.clone(),
            PendingUpdate {
                anchor_id,
                scheduled_tick,
                payload,
            },
        );
    }

    /// The pending update for `anchor_id`, if any.
    pub fn pending(&self, anchor_id: &AnchorId) -> Option<&PendingUpdate<P>> {
        self.pending.get(anchor_id)
    }

    /// Drops the pending update for `anchor_id` without applying it.
    pub fn cancel_update(&mut self, anchor_id: &AnchorId) -> Option<PendingUpdate<P>> {
        self.pending.remove(anchor_id)
    }

    /// Drops every pending update owned by `client`. Returns how many were dropped.
    pub fn cancel_for_client(&mut self, client: ClientId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|id, _| id.owner() != client);
        before - self.pending.len()
    }

    /// Ids of `client`'s pending updates.
    pub fn pending_for_client(&self, client: ClientId) -> Vec<AnchorId> {
        self.pending
            .keys()
            .filter(|id| id.owner() == client)
            .cloned()
            .collect()
    }

    /// Number of pending updates.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and applies every update due at `now`.
    ///
    /// Each application is isolated: an error or a panic in one does not stop
    /// the others. Due updates are applied in anchor-id order.
    pub fn sweep<F, E>(&mut self, now: Tick, mut apply: F) -> SweepReport
    where
        F: FnMut(&AnchorId, P) -> Result<(), E>,
        E: Display,
    {
        let mut report = SweepReport::default();
        if self.pending.is_empty() {
            return report;
        }
        let mut due: Vec<AnchorId> = self
            .pending
            .values()
            .filter(|u| now.reached(u.scheduled_tick))
            .map(|u| u.anchor_id.clone())
            .collect();
        due.sort_unstable();
        for id in due {
            let Some(update) = self.pending.remove(&id) else {
                continue;
            };
            match catch_unwind(AssertUnwindSafe(|| apply(&id, update.payload))) {
                Ok(Ok(())) => report.applied += 1,
                Ok(Err(err)) => {
                    warn!(anchor = %id, %err, "debounced update failed");
                    report.failed += 1;
                }
                Err(_) => {
                    error!(anchor = %id, "debounced update panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
