// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Drive an orchestrator until its eligibility worker is idle.

use std::time::Duration;

use beacon_core::{DisplayOrchestrator, Tick};

const MAX_ROUNDS: usize = 5_000;

/// Ticks `orch` at `now` (without advancing time) until no eligibility job is
/// outstanding. Returns `false` if the worker never went idle.
pub fn settle(orch: &mut DisplayOrchestrator, now: Tick) -> bool {
    for _ in 0..MAX_ROUNDS {
        orch.tick(now);
        if orch.statistics().pending_jobs == 0 {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// [`settle`]s at `now`, then ticks once past the debounce window so every
/// scheduled update reaches the backend. Returns the tick it stopped at.
pub fn settle_and_flush(orch: &mut DisplayOrchestrator, now: Tick) -> Option<Tick> {
    if !settle(orch, now) {
        return None;
    }
    let flushed = now.after(orch.prefs().debounce_ticks);
    orch.tick(flushed);
    Some(flushed)
}
