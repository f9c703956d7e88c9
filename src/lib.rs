#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Chunk Generation Pipeline
//!
//! A multithreaded chunk generation pipeline for voxel worlds. Chunks stream
//! in around a pivot position and move through five staged tasks (landscape,
//! decorations, light, geometry, model packaging) until each holds renderable
//! vertex models; evicted chunks are persisted to an LRU-backed store.
//!
//! ## Key Modules
//!
//! * `core` - Concurrency primitives: shared resources and the job pool
//! * `engine_state` - The world, the generation pipeline, settings and storage
//!
//! ## Architecture
//!
//! One driver thread owns all pipeline state and steps every chunk's worker
//! once per tick. The heavy stage work runs as jobs on a worker pool, and the
//! driver observes completion by polling, so a tick never blocks on
//! generation. Neighbor-dependent stages re-check their preconditions each
//! tick instead of registering callbacks.
//!
//! ## Usage
//!
//! ```no_run
//! voxel_pipeline::run();
//! ```
//!
//! Embedders that need their own loop construct an
//! [`engine_state::EngineState`] and call `update` with their pivot directly.

use std::path::Path;
use std::thread;
use std::time::Duration;

use cgmath::Point3;
use log::info;

use crate::engine_state::settings::WorldSettings;
use crate::engine_state::EngineState;

pub mod core;
pub mod engine_state;

/// The settings file `run` looks for in the working directory.
const SETTINGS_FILE: &str = "settings.json";

/// How many update ticks `run` drives before shutting down.
const RUN_TICKS: u32 = 1200;

/// How far the pivot walks along +X every tick, in blocks.
const PIVOT_SPEED: f32 = 0.25;

/// Runs a self-contained generation session: chunks stream in ahead of a
/// pivot walking along +X and are persisted as they fall behind it.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let settings = WorldSettings::load_or_default(Path::new(SETTINGS_FILE));
    info!("Settings: {:?}", settings);
    let mut engine = EngineState::new(&settings);

    for tick in 0..RUN_TICKS {
        let pivot = Point3::new(8.0 + tick as f32 * PIVOT_SPEED, 64.0, 8.0);
        engine.update(pivot);
        if tick % 100 == 0 {
            info!(
                "Tick {}: {} live chunks, {} in the pipeline",
                tick,
                engine.world.chunks.len(),
                engine.active_worker_count()
            );
        }
        thread::sleep(Duration::from_millis(1));
    }

    engine.shutdown();
    info!("World persisted, shutting down");
}
