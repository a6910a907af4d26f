// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless Beacon host: runs the display-anchor pipeline against a
//! simulated world at a fixed tick rate.

mod hot_loop;
mod providers;
mod sim;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use beacon_app_core::config::ConfigService;
use beacon_app_core::prefs::{DisplayPrefs, DISPLAY_PREFS_KEY};
use beacon_config_fs::FsConfigStore;
use beacon_core::backend::{
    select_backend, BackendKind, HologramBackend, TextDisplayBackend, MIN_HOLOGRAM_VERSION,
};
use beacon_core::render::RenderBackend;
use beacon_core::{Collaborators, DisplayOrchestrator};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::hot_loop::HotLoop;
use crate::providers::{LogHologramProvider, LogTextEntityProvider};
use crate::sim::SimWorld;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Beacon display-anchor host")]
struct Args {
    /// Hot-loop tick interval in milliseconds
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Number of simulated players
    #[arg(long, default_value_t = 4)]
    players: u32,
    /// Stop after this many ticks (runs until Ctrl-C when omitted)
    #[arg(long)]
    ticks: Option<u64>,
    /// Log statistics every N ticks (0 disables)
    #[arg(long, default_value_t = 100)]
    stats_every: u64,
    /// Config directory (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Pretend no hologram library is installed
    #[arg(long)]
    no_holograms: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = load_prefs(args.config_dir.as_deref());
    let sim = Arc::new(SimWorld::new(args.players, prefs.region_size));
    let backend = select_backend(prefs.backend, candidates(args.no_holograms));
    let mut orch = DisplayOrchestrator::new(&prefs, Collaborators::from_shared(&sim), backend)?;
    for (client, world) in sim.online() {
        orch.client_joined(client, &world);
    }

    let mut hot_loop = HotLoop::new(args.tick_ms, args.stats_every);
    hot_loop
        .run(&mut orch, &sim, args.ticks, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(%err, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    orch.shutdown();
    let stats = serde_json::to_string(&orch.statistics())?;
    info!(tick = %hot_loop.tick(), %stats, "host stopped");
    Ok(())
}

/// Loads display prefs, writing defaults on first run. Any config failure
/// falls back to defaults; the host never refuses to start over config.
fn load_prefs(dir: Option<&Path>) -> DisplayPrefs {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    };
    match store
        .map(ConfigService::new)
        .and_then(|config| config.load_or_init(DISPLAY_PREFS_KEY))
    {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!(%err, "display prefs unavailable; using defaults");
            DisplayPrefs::default()
        }
    }
}

/// Every backend this host can offer, availability checked at construction.
fn candidates(no_holograms: bool) -> Vec<(BackendKind, Box<dyn RenderBackend>)> {
    let version = (!no_holograms).then_some(MIN_HOLOGRAM_VERSION);
    let holograms: Box<dyn RenderBackend> =
        Box::new(HologramBackend::new(LogHologramProvider::new(version)));
    let text: Box<dyn RenderBackend> =
        Box::new(TextDisplayBackend::new(LogTextEntityProvider::new(true)));
    vec![
        (BackendKind::Hologram, holograms),
        (BackendKind::TextDisplay, text),
    ]
}
