//! # Generation Director Module
//!
//! This module owns the table of live generation workers and steps each of
//! them once per engine tick. Stepping happens on the driver thread; the
//! heavy stage work itself runs on the shared job pool.
//!
//! ## Detached Stepping
//!
//! A worker being stepped needs to read its neighbors' workers, so it cannot
//! sit in the table while it runs. The director removes one worker at a time,
//! steps it against a context borrowing the rest of the table, and puts it
//! back unless it finished. A finished worker is dropped and its build handed
//! to the caller.

use std::collections::HashMap;

use cgmath::Point3;
use log::debug;

use crate::core::{JobPool, MtResource};
use crate::engine_state::generation::build::ChunkBuild;
use crate::engine_state::generation::worker::GenerationWorker;
use crate::engine_state::generation::GenerationStatus;
use crate::engine_state::settings::GenerationSettings;
use crate::engine_state::voxels::chunk::Chunk;
use crate::engine_state::voxels::world::World;

/// Everything a worker may read while it is being stepped.
///
/// The context borrows the world and the worker table immutably; a worker
/// only ever mutates its own workspace, which the director detaches from the
/// table before stepping.
pub struct GenerationContext<'a> {
    /// The world the chunks live in.
    pub world: &'a World,

    /// All other live workers, keyed by chunk position.
    pub workers: &'a HashMap<Point3<i32>, GenerationWorker>,

    /// The pool heavy stage work is submitted to.
    pub job_pool: &'a JobPool,
}

impl GenerationContext<'_> {
    /// Returns the worker generating the chunk at `position`, if any.
    pub fn find_worker(&self, position: Point3<i32>) -> Option<&GenerationWorker> {
        self.workers.get(&position)
    }

    /// Checks whether the chunk at `position` has progressed at least to
    /// `minimum`.
    ///
    /// A chunk that is live in the world without a worker finished its whole
    /// pipeline at some point, so it counts as ready for any minimum. A chunk
    /// that exists nowhere is not ready.
    pub fn is_chunk_ready(&self, position: Point3<i32>, minimum: GenerationStatus) -> bool {
        match self.find_worker(position) {
            Some(worker) => worker.status() >= minimum,
            None => self.world.has_chunk(position),
        }
    }
}

/// Drives all chunk generation workers from the engine's update tick.
pub struct GenerationDirector {
    workers: HashMap<Point3<i32>, GenerationWorker>,
    settings: GenerationSettings,
}

impl GenerationDirector {
    /// Creates a director with no live workers.
    pub fn new(settings: GenerationSettings) -> Self {
        GenerationDirector {
            workers: HashMap::new(),
            settings,
        }
    }

    /// Starts a worker for a chunk entering the pipeline.
    ///
    /// # Arguments
    /// * `chunk` - Shared handle to the chunk to generate
    /// * `generate_landscape_and_decorations` - `false` for chunks whose
    ///   terrain already exists and only needs light and meshing
    pub fn create_worker(
        &mut self,
        chunk: MtResource<Chunk>,
        generate_landscape_and_decorations: bool,
    ) {
        let worker = GenerationWorker::new(chunk, generate_landscape_and_decorations, self.settings);
        self.workers.insert(worker.position(), worker);
    }

    /// Returns `true` when a worker is generating the chunk at `position`.
    pub fn have_worker(&self, position: Point3<i32>) -> bool {
        self.workers.contains_key(&position)
    }

    /// Returns how many workers are live.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` when no worker is live.
    pub fn is_idle(&self) -> bool {
        self.workers.is_empty()
    }

    /// Removes the worker for the chunk at `position` and drains its
    /// in-flight work.
    ///
    /// # Returns
    /// The stage the worker had completed when it was retired, or `None` if
    /// no worker was generating that chunk. The caller uses the stage to
    /// decide whether the half-generated chunk is worth keeping.
    pub fn retire_worker(&mut self, position: Point3<i32>) -> Option<GenerationStatus> {
        let mut worker = self.workers.remove(&position)?;
        worker.stop_workflow();
        worker.wait_for_finish_of_task();
        debug!(
            "Retired the worker for chunk at {:?} with status {:?}",
            position,
            worker.status()
        );
        Some(worker.status())
    }

    /// Steps every live worker once and collects finished builds.
    ///
    /// The worker for `priority_position` is allowed to run multiple steps
    /// within its time budget, so the chunk the player stands on pops in as
    /// fast as the pipeline allows.
    ///
    /// # Arguments
    /// * `world` - The world the chunks live in
    /// * `job_pool` - The pool stage work is submitted to
    /// * `priority_position` - Chunk position stepped with the at-once budget
    ///
    /// # Returns
    /// Position/build pairs for every worker that reached the terminal stage
    /// this tick. Those workers are dropped.
    pub fn process_workers(
        &mut self,
        world: &World,
        job_pool: &JobPool,
        priority_position: Point3<i32>,
    ) -> Vec<(Point3<i32>, ChunkBuild)> {
        let mut builds = Vec::new();
        let positions: Vec<Point3<i32>> = self.workers.keys().copied().collect();
        for position in positions {
            let Some(mut worker) = self.workers.remove(&position) else {
                continue;
            };
            let context = GenerationContext {
                world,
                workers: &self.workers,
                job_pool,
            };
            match worker.process(&context, position == priority_position) {
                Some(build) => {
                    debug!("Chunk at {:?} finished its build", position);
                    builds.push((position, build));
                }
                None => {
                    self.workers.insert(position, worker);
                }
            }
        }
        builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::settings::WorldSettings;
    use crate::engine_state::voxels::chunk::{CHUNK_DEPTH, CHUNK_WIDTH};

    fn chunk_position(x: i32, z: i32) -> Point3<i32> {
        Point3::new(x * CHUNK_WIDTH, 0, z * CHUNK_DEPTH)
    }

    #[test]
    fn readiness_prefers_worker_status_over_world_presence() {
        let settings = WorldSettings::default();
        let mut world = World::new(&settings);
        let jobs = JobPool::new(1);
        let mut workers = HashMap::new();

        let working = chunk_position(0, 0);
        workers.insert(
            working,
            GenerationWorker::new(
                MtResource::new(Chunk::empty(working)),
                true,
                settings.generation(),
            ),
        );
        let live = chunk_position(1, 0);
        world.chunks.insert(live, MtResource::new(Chunk::empty(live)));

        let context = GenerationContext {
            world: &world,
            workers: &workers,
            job_pool: &jobs,
        };
        // A fresh worker has completed nothing yet.
        assert!(context.is_chunk_ready(working, GenerationStatus::Nothing));
        assert!(!context.is_chunk_ready(working, GenerationStatus::GeneratedLandscape));
        // A worker-less live chunk is ready for anything.
        assert!(context.is_chunk_ready(live, GenerationStatus::GeneratedModel));
        // A chunk that exists nowhere is ready for nothing.
        assert!(!context.is_chunk_ready(chunk_position(2, 0), GenerationStatus::Nothing));
    }

    #[test]
    fn a_five_by_five_grid_builds_exactly_its_center() {
        let settings = WorldSettings::default();
        let world = World::new(&settings);
        let jobs = JobPool::new(4);
        let mut director = GenerationDirector::new(settings.generation());

        for x in -2..=2 {
            for z in -2..=2 {
                let position = chunk_position(x, z);
                director.create_worker(MtResource::new(Chunk::empty(position)), true);
            }
        }
        assert_eq!(director.worker_count(), 25);

        // Only the center chunk has a full neighborhood: its decoration ring
        // and the light of its four edge-adjacent chunks all fit in the grid.
        let center = chunk_position(0, 0);
        let mut builds = Vec::new();
        for _ in 0..100_000 {
            builds.extend(director.process_workers(&world, &jobs, center));
            if !builds.is_empty() {
                break;
            }
        }

        assert_eq!(builds.len(), 1);
        let (position, build) = &builds[0];
        assert_eq!(*position, center);
        assert!(!build.model_for_opaque.is_empty());
        assert!(!director.have_worker(center));
        assert_eq!(director.worker_count(), 24);

        // No other chunk can pass its geometry precondition.
        for _ in 0..100 {
            assert!(director.process_workers(&world, &jobs, center).is_empty());
        }
    }

    #[test]
    fn retiring_a_worker_reports_how_far_it_got() {
        let settings = WorldSettings::default();
        let world = World::new(&settings);
        let jobs = JobPool::new(1);
        let mut director = GenerationDirector::new(settings.generation());

        let position = chunk_position(0, 0);
        director.create_worker(MtResource::new(Chunk::empty(position)), true);

        // One step launches the landscape task; retiring drains it.
        director.process_workers(&world, &jobs, chunk_position(9, 9));
        assert_eq!(
            director.retire_worker(position),
            Some(GenerationStatus::GeneratedLandscape)
        );
        assert!(director.is_idle());
        assert_eq!(director.retire_worker(position), None);
    }

    #[test]
    fn restored_chunks_run_the_short_pipeline() {
        let settings = WorldSettings::default();
        let mut world = World::new(&settings);
        let jobs = JobPool::new(2);
        let mut director = GenerationDirector::new(settings.generation());

        let position = chunk_position(0, 0);
        for x in -1..=1 {
            for z in -1..=1 {
                let neighbor = chunk_position(x, z);
                if neighbor != position {
                    world
                        .chunks
                        .insert(neighbor, MtResource::new(Chunk::empty(neighbor)));
                }
            }
        }
        director.create_worker(MtResource::new(Chunk::empty(position)), false);

        let mut builds = Vec::new();
        for _ in 0..100_000 {
            builds.extend(director.process_workers(&world, &jobs, position));
            if !builds.is_empty() {
                break;
            }
        }
        // An empty restored chunk surrounded by empty chunks meshes nothing,
        // but it still reaches the terminal stage and hands back a build.
        assert_eq!(builds.len(), 1);
        assert!(builds[0].1.model_for_opaque.is_empty());
        assert!(director.is_idle());
    }
}
