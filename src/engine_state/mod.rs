//! # Engine State Module
//!
//! The central module wiring the chunk generation pipeline together. The
//! `EngineState` owns the world, the generation director and the job pool,
//! and advances all of them once per `update` call.
//!
//! ## Key Components
//!
//! * `EngineState` - The per-session state container and update loop body
//! * `generation` - The staged chunk generation pipeline
//! * `settings` - World settings loaded from an optional JSON file
//! * `storage` - The LRU chunk store with optional JSON spill directory
//! * `voxels` - Blocks, chunks, the streamed world and the texture atlas
//!
//! ## Update Flow
//!
//! 1. The world streams chunks in and out around the pivot, creating and
//!    retiring generation workers as it goes.
//! 2. The director steps every live worker once; the worker for the pivot's
//!    own chunk may run several steps within its time budget.
//! 3. Builds finished this tick are attached to their chunks, where a
//!    rendering collaborator can pick them up.

use cgmath::Point3;

use crate::core::JobPool;
use crate::engine_state::generation::director::GenerationDirector;
use crate::engine_state::settings::WorldSettings;
use crate::engine_state::voxels::chunk::Chunk;
use crate::engine_state::voxels::world::World;

pub mod generation;
pub mod settings;
pub mod storage;
pub mod voxels;

/// The complete state of one generation session.
pub struct EngineState {
    /// The streamed world of live chunks.
    pub world: World,

    director: GenerationDirector,
    job_pool: JobPool,
}

impl EngineState {
    /// Builds the engine from world settings.
    ///
    /// # Arguments
    /// * `settings` - Streaming, generation and persistence parameters
    pub fn new(settings: &WorldSettings) -> Self {
        EngineState {
            world: World::new(settings),
            director: GenerationDirector::new(settings.generation()),
            job_pool: JobPool::new(settings.worker_threads),
        }
    }

    /// Advances the whole pipeline by one tick.
    ///
    /// # Arguments
    /// * `pivot` - The world position chunks are streamed around; its own
    ///   chunk is generated with priority
    pub fn update(&mut self, pivot: Point3<f32>) {
        self.world.update(pivot, &mut self.director);
        let priority_position = Chunk::position_containing(pivot);
        let builds = self
            .director
            .process_workers(&self.world, &self.job_pool, priority_position);
        for (position, build) in builds {
            self.world.attach_build(position, build);
        }
    }

    /// Returns `true` while any chunk is still being generated.
    pub fn has_active_workers(&self) -> bool {
        !self.director.is_idle()
    }

    /// Returns how many chunks are currently being generated.
    pub fn active_worker_count(&self) -> usize {
        self.director.worker_count()
    }

    /// Retires all workers, persists the world and flushes the store.
    pub fn shutdown(&mut self) {
        self.world.finish(&mut self.director);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_directory(label: &str) -> PathBuf {
        let directory =
            std::env::temp_dir().join(format!("engine_state_{}_{}", label, std::process::id()));
        let _ = std::fs::remove_dir_all(&directory);
        directory
    }

    #[test]
    fn the_first_update_spins_up_workers() {
        let settings = WorldSettings {
            caching_radius: 12.0,
            ..WorldSettings::default()
        };
        let mut engine = EngineState::new(&settings);
        assert!(!engine.has_active_workers());

        engine.update(Point3::new(8.0, 64.0, 8.0));
        assert!(engine.has_active_workers());
        assert_eq!(engine.active_worker_count(), 1);
        assert!(engine.world.has_chunk(Point3::new(0, 0, 0)));
    }

    #[test]
    fn a_session_builds_the_pivot_chunk_and_persists_the_decorated_area() {
        let directory = temp_directory("session");
        let settings = WorldSettings {
            caching_radius: 40.0,
            store_directory: Some(directory.clone()),
            ..WorldSettings::default()
        };
        let mut engine = EngineState::new(&settings);
        let pivot = Point3::new(8.0, 64.0, 8.0);
        let pivot_chunk = Point3::new(0, 0, 0);

        let mut built = false;
        for _ in 0..200_000 {
            engine.update(pivot);
            let chunk = engine.world.get_chunk_at(pivot_chunk).unwrap();
            if chunk.get().build.is_some() {
                built = true;
                break;
            }
        }
        assert!(built, "the pivot chunk never finished its pipeline");

        let chunk = engine.world.get_chunk_at(pivot_chunk).unwrap();
        let build = chunk.get().build.clone().unwrap();
        assert!(
            !build.model_for_opaque.is_empty(),
            "generated terrain must mesh opaque geometry"
        );

        engine.shutdown();
        assert!(!engine.has_active_workers());
        assert!(engine.world.chunks.is_empty());
        // The pivot chunk and its edge-adjacent neighbors got decorated, so
        // they are saved. Chunks parked waiting for landscape neighbors that
        // never streamed in hold bare terrain and are discarded.
        assert!(directory.join("chunk_0_0_0.json").exists());
        assert!(directory.join("chunk_16_0_0.json").exists());
        assert!(!directory.join("chunk_16_0_16.json").exists());

        let _ = std::fs::remove_dir_all(&directory);
    }
}
