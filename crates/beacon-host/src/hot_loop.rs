// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed-rate hot loop driving the simulation and the orchestrator.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use beacon_core::{DisplayOrchestrator, Tick};
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, instrument};

use crate::sim::{SimEvent, SimWorld};

/// Ticks the world and the orchestrator at a fixed interval.
pub struct HotLoop {
    interval: Duration,
    stats_every: u64,
    tick: Tick,
}

impl HotLoop {
    /// A loop ticking every `interval_ms`, logging statistics every
    /// `stats_every` ticks (0 = never).
    pub fn new(interval_ms: u64, stats_every: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            stats_every,
            tick: Tick::ZERO,
        }
    }

    /// Last tick executed.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Runs until `shutdown` resolves or `limit` ticks have run.
    ///
    /// Late ticks are skipped rather than bunched up; the orchestrator only
    /// ever sees monotonically increasing ticks.
    #[instrument(skip_all)]
    pub async fn run<F>(
        &mut self,
        orch: &mut DisplayOrchestrator,
        sim: &SimWorld,
        limit: Option<u64>,
        shutdown: F,
    ) -> Result<Tick>
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, ?limit, "hot loop started");
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(tick = %self.tick, "shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.step(orch, sim)?;
                    if limit.is_some_and(|l| self.tick.0 >= l) {
                        break;
                    }
                }
            }
        }
        Ok(self.tick)
    }

    fn step(&mut self, orch: &mut DisplayOrchestrator, sim: &SimWorld) -> Result<()> {
        self.tick = self.tick.next();
        for event in sim.step(self.tick) {
            match event {
                SimEvent::WorldChanged { client, world } => {
                    orch.register_world_transition(client, &world);
                }
            }
        }
        orch.tick(self.tick);
        if self.stats_every > 0 && self.tick.0.is_multiple_of(self.stats_every) {
            let stats = serde_json::to_string(&orch.statistics())?;
            info!(tick = %self.tick, %stats, "display stats");
        }
        Ok(())
    }
}
