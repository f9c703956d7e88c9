//! # Generation Worker Module
//!
//! This module drives one chunk through the generation pipeline. A worker
//! owns the chunk's workspace and at most one live task; each engine tick the
//! director steps it once, which either polls the running task, launches the
//! next one, or leaves it parked waiting for a neighbor.
//!
//! ## Neighbor Readiness
//!
//! Two stages gate on neighbors, and both readiness checks treat a chunk that
//! is live in the world without a worker as fully generated. Workers exist
//! exactly while a chunk is still being built, so a missing worker over a
//! present chunk means the pipeline already ran to completion there. This
//! keeps chunks from deadlocking when a neighbor finishes and retires while
//! they are still mid-pipeline.

use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::debug;
use web_time::Instant;

use crate::core::MtResource;
use crate::engine_state::generation::build::{ChunkBuild, ChunkModel};
use crate::engine_state::generation::director::GenerationContext;
use crate::engine_state::generation::tasks::{GenerationTask, TaskState};
use crate::engine_state::generation::workspace::{
    derive_surface_columns, side_of_neighbor, Batch, BoundaryPlane, ChunkWorkspace, WorkspaceState,
};
use crate::engine_state::generation::GenerationStatus;
use crate::engine_state::settings::GenerationSettings;
use crate::engine_state::voxels::chunk::Chunk;

/// How long `process` may keep stepping a priority chunk within one call.
const BUILD_AT_ONCE_BUDGET: Duration = Duration::from_millis(1);

/// The per-chunk pipeline state machine.
///
/// `status` is the last stage the chunk completed and `next_status` the stage
/// the current (or next) task produces. Progress is strictly monotonic; a
/// worker is dropped once it reaches the terminal status or its chunk is
/// evicted.
pub struct GenerationWorker {
    workspace: ChunkWorkspace,
    task: Option<GenerationTask>,
    status: GenerationStatus,
    next_status: GenerationStatus,
    is_workflow_stopped: bool,
    settings: GenerationSettings,
}

impl GenerationWorker {
    /// Creates a worker for a chunk entering the pipeline.
    ///
    /// # Arguments
    /// * `chunk` - Shared handle to the chunk to generate
    /// * `generate_landscape_and_decorations` - `false` for chunks whose
    ///   terrain already exists (restored from the store, or live chunks that
    ///   only need their boundaries re-meshed); they skip straight to light
    /// * `settings` - World generation parameters
    pub fn new(
        chunk: MtResource<Chunk>,
        generate_landscape_and_decorations: bool,
        settings: GenerationSettings,
    ) -> Self {
        let (status, workspace_state) = if generate_landscape_and_decorations {
            (GenerationStatus::Nothing, WorkspaceState::Created)
        } else {
            (
                GenerationStatus::GeneratedDecorations,
                WorkspaceState::DecorationsDone,
            )
        };
        GenerationWorker {
            workspace: ChunkWorkspace::new(chunk, workspace_state),
            task: None,
            status,
            next_status: status.next(),
            is_workflow_stopped: false,
            settings,
        }
    }

    /// Returns the last stage the chunk completed.
    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    /// Returns the chunk's world position.
    pub fn position(&self) -> Point3<i32> {
        self.workspace.position
    }

    /// Returns `true` once the worker has produced its build.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advances the pipeline by one step, or by as many steps as fit in the
    /// at-once budget.
    ///
    /// # Arguments
    /// * `context` - The other workers, the world and the job pool
    /// * `try_build_at_once` - Keep stepping until the budget runs out; used
    ///   for the chunk the pivot currently stands on
    ///
    /// # Returns
    /// The chunk's build once the terminal stage is reached, `None` while
    /// work remains or the workflow is stopped.
    pub fn process(
        &mut self,
        context: &GenerationContext,
        try_build_at_once: bool,
    ) -> Option<ChunkBuild> {
        if self.is_workflow_stopped {
            return None;
        }
        let deadline = try_build_at_once.then(Instant::now);
        loop {
            self.step(context);
            if self.status.is_terminal() {
                return Some(self.package_build());
            }
            match deadline {
                Some(started) if started.elapsed() < BUILD_AT_ONCE_BUDGET => {}
                _ => return None,
            }
        }
    }

    /// Stops the workflow; subsequent `process` calls do nothing.
    ///
    /// In-flight jobs keep running until `wait_for_finish_of_task` drains
    /// them.
    pub fn stop_workflow(&mut self) {
        self.is_workflow_stopped = true;
    }

    /// Blocks until the current task, if any, has finished and is folded
    /// back into the workspace.
    ///
    /// A task that was never launched is discarded instead; it has no side
    /// effects to wait for.
    pub fn wait_for_finish_of_task(&mut self) {
        let finished = match self.task.as_mut() {
            Some(task) => task.wait(&mut self.workspace) == TaskState::Done,
            None => return,
        };
        if finished {
            self.complete_task();
        } else {
            self.task = None;
        }
    }

    fn step(&mut self, context: &GenerationContext) {
        if self.status.is_terminal() {
            return;
        }
        if self.task.is_none() {
            self.task = Some(GenerationTask::for_status(self.next_status));
        }
        let Some(task) = self.task.as_mut() else {
            return;
        };

        let mut finished = false;
        match task.state() {
            TaskState::Deferred => {
                if !preconditions_met(self.workspace.position, self.next_status, context) {
                    return;
                }
                collect_shares(&mut self.workspace, context);
                debug!(
                    "Chunk at {:?} launches its {} task",
                    self.workspace.position,
                    task.kind()
                );
                task.launch(&mut self.workspace, context.job_pool, self.settings);
            }
            TaskState::Launched => {
                finished = task.poll(&mut self.workspace) == TaskState::Done;
            }
            TaskState::Done => finished = true,
        }
        if finished {
            self.complete_task();
        }
    }

    fn complete_task(&mut self) {
        self.task = None;
        self.status = self.next_status;
        self.next_status = self.status.next();
        debug!(
            "Chunk at {:?} reached {:?}",
            self.workspace.position, self.status
        );
    }

    fn package_build(&self) -> ChunkBuild {
        ChunkBuild {
            model_for_opaque: packaged_model(&self.workspace.batch_for_opaque),
            model_for_transparent: packaged_model(&self.workspace.batch_for_transparent),
            model_for_partially_transparent: packaged_model(
                &self.workspace.batch_for_partially_transparent,
            ),
        }
    }
}

fn packaged_model(batch: &Batch) -> Arc<ChunkModel> {
    match &batch.model {
        Some(model) => Arc::clone(model),
        None => panic!("build packaged before the model task finished"),
    }
}

/// Checks the neighbor progress gate for the stage about to launch.
///
/// Decorations need landscape data from all eight horizontal neighbors;
/// geometry needs lit boundary planes from the four edge-adjacent ones. All
/// other stages launch unconditionally.
fn preconditions_met(
    position: Point3<i32>,
    next_status: GenerationStatus,
    context: &GenerationContext,
) -> bool {
    match next_status {
        GenerationStatus::GeneratedDecorations => {
            Chunk::horizontal_neighbor_offsets().iter().all(|offset| {
                context.is_chunk_ready(position + offset, GenerationStatus::GeneratedLandscape)
            })
        }
        GenerationStatus::GeneratedGeometry => {
            Chunk::cardinal_neighbor_offsets().iter().all(|offset| {
                context.is_chunk_ready(position + offset, GenerationStatus::GeneratedLight)
            })
        }
        _ => true,
    }
}

/// Copies whatever the upcoming stage needs out of the neighbors.
///
/// Keyed on the workspace's own state: after landscape it collects surface
/// rings, after light it collects boundary planes. Neighbors with workers
/// share through their workspaces; worker-less live chunks are fully
/// generated, so their share is derived straight from the chunk contents.
fn collect_shares(workspace: &mut ChunkWorkspace, context: &GenerationContext) {
    let position = workspace.position;
    match workspace.state {
        WorkspaceState::LandscapeDone => {
            for offset in Chunk::horizontal_neighbor_offsets() {
                collect_share_from(workspace, position + offset, context);
            }
        }
        WorkspaceState::LightDone => {
            for offset in Chunk::cardinal_neighbor_offsets() {
                collect_share_from(workspace, position + offset, context);
            }
        }
        _ => {}
    }
}

fn collect_share_from(
    workspace: &mut ChunkWorkspace,
    neighbor_position: Point3<i32>,
    context: &GenerationContext,
) {
    if let Some(worker) = context.find_worker(neighbor_position) {
        worker.workspace.share(workspace);
        return;
    }
    let Some(chunk) = context.world.get_chunk_at(neighbor_position) else {
        return;
    };
    match workspace.state {
        WorkspaceState::LandscapeDone => {
            let columns = derive_surface_columns(&chunk.get());
            workspace.accept_surface_ring(&columns, neighbor_position);
        }
        WorkspaceState::LightDone => {
            let Some(side) = side_of_neighbor(workspace.position, neighbor_position) else {
                return;
            };
            let plane = BoundaryPlane::from_chunk(&chunk.get(), side.opposite());
            workspace.accept_boundary_plane(side, plane);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JobPool;
    use crate::engine_state::generation::workspace::DECORATION_MARGIN;
    use crate::engine_state::settings::WorldSettings;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::chunk::{CHUNK_DEPTH, CHUNK_WIDTH};
    use crate::engine_state::voxels::world::World;
    use std::collections::HashMap;

    fn settings() -> GenerationSettings {
        WorldSettings::default().generation()
    }

    fn fresh_worker(position: Point3<i32>) -> GenerationWorker {
        let chunk = MtResource::new(Chunk::empty(position));
        GenerationWorker::new(chunk, true, settings())
    }

    fn known_worker(position: Point3<i32>) -> GenerationWorker {
        let chunk = MtResource::new(Chunk::empty(position));
        GenerationWorker::new(chunk, false, settings())
    }

    /// One deterministic pipeline step: launch (or poll), then drain.
    fn drive_one_stage(
        worker: &mut GenerationWorker,
        world: &World,
        workers: &HashMap<Point3<i32>, GenerationWorker>,
        jobs: &JobPool,
    ) {
        let context = GenerationContext {
            world,
            workers,
            job_pool: jobs,
        };
        worker.process(&context, false);
        worker.wait_for_finish_of_task();
    }

    #[test]
    fn a_fresh_worker_generates_landscape_without_neighbors() {
        let jobs = JobPool::new(1);
        let world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let mut worker = fresh_worker(Point3::new(0, 0, 0));

        assert_eq!(worker.status(), GenerationStatus::Nothing);
        drive_one_stage(&mut worker, &world, &workers, &jobs);
        assert_eq!(worker.status(), GenerationStatus::GeneratedLandscape);
        assert!(!worker.workspace.surface.is_empty());
    }

    #[test]
    fn decoration_waits_for_horizontal_neighbors() {
        let jobs = JobPool::new(1);
        let mut world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let mut worker = fresh_worker(Point3::new(0, 0, 0));
        drive_one_stage(&mut worker, &world, &workers, &jobs);

        // No neighbors at all: the decoration task stays parked.
        drive_one_stage(&mut worker, &world, &workers, &jobs);
        assert_eq!(worker.status(), GenerationStatus::GeneratedLandscape);

        // Worker-less chunks in the world count as fully generated.
        for offset in Chunk::horizontal_neighbor_offsets() {
            let position = Point3::new(0, 0, 0) + offset;
            world
                .chunks
                .insert(position, MtResource::new(Chunk::empty(position)));
        }
        drive_one_stage(&mut worker, &world, &workers, &jobs);
        assert_eq!(worker.status(), GenerationStatus::GeneratedDecorations);
    }

    #[test]
    fn shares_flow_between_neighboring_workers() {
        let jobs = JobPool::new(2);
        let world = World::new(&WorldSettings::default());
        let center_position = Point3::new(0, 0, 0);

        let mut center = fresh_worker(center_position);
        drive_one_stage(&mut center, &world, &HashMap::new(), &jobs);

        let mut workers = HashMap::new();
        for offset in Chunk::horizontal_neighbor_offsets() {
            let position = center_position + offset;
            let mut neighbor = fresh_worker(position);
            drive_one_stage(&mut neighbor, &world, &HashMap::new(), &jobs);
            assert_eq!(neighbor.status(), GenerationStatus::GeneratedLandscape);
            workers.insert(position, neighbor);
        }

        drive_one_stage(&mut center, &world, &workers, &jobs);
        assert_eq!(center.status(), GenerationStatus::GeneratedDecorations);

        let extended_width = CHUNK_WIDTH + 2 * DECORATION_MARGIN;
        let extended_depth = CHUNK_DEPTH + 2 * DECORATION_MARGIN;
        let ring = extended_width * extended_depth - CHUNK_WIDTH * CHUNK_DEPTH;
        assert_eq!(center.workspace.shared_surface.len(), ring as usize);
    }

    #[test]
    fn a_known_chunk_skips_straight_to_light() {
        let jobs = JobPool::new(1);
        let world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let mut worker = known_worker(Point3::new(0, 0, 0));

        assert_eq!(worker.status(), GenerationStatus::GeneratedDecorations);
        drive_one_stage(&mut worker, &world, &workers, &jobs);
        assert_eq!(worker.status(), GenerationStatus::GeneratedLight);
    }

    #[test]
    fn the_pipeline_ends_with_a_packaged_build() {
        let jobs = JobPool::new(1);
        let mut world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let position = Point3::new(0, 0, 0);
        for offset in Chunk::cardinal_neighbor_offsets() {
            let neighbor = position + offset;
            world
                .chunks
                .insert(neighbor, MtResource::new(Chunk::solid(neighbor, BlockType::STONE)));
        }

        let mut worker = known_worker(position);
        for _ in 0..3 {
            drive_one_stage(&mut worker, &world, &workers, &jobs);
        }
        assert_eq!(worker.status(), GenerationStatus::GeneratedModel);
        assert!(worker.is_finished());

        let context = GenerationContext {
            world: &world,
            workers: &workers,
            job_pool: &jobs,
        };
        let build = worker.process(&context, false).unwrap();
        // An empty chunk walled in by stone meshes nothing.
        assert!(build.model_for_opaque.is_empty());
        assert!(build.model_for_transparent.is_empty());
        assert!(build.model_for_partially_transparent.is_empty());
    }

    #[test]
    fn a_stopped_worker_refuses_to_advance() {
        let jobs = JobPool::new(1);
        let world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let mut worker = fresh_worker(Point3::new(0, 0, 0));

        worker.stop_workflow();
        let context = GenerationContext {
            world: &world,
            workers: &workers,
            job_pool: &jobs,
        };
        assert!(worker.process(&context, false).is_none());
        assert_eq!(worker.status(), GenerationStatus::Nothing);
    }

    #[test]
    fn stopping_mid_task_still_drains_cleanly() {
        let jobs = JobPool::new(1);
        let world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let mut worker = fresh_worker(Point3::new(0, 0, 0));

        let context = GenerationContext {
            world: &world,
            workers: &workers,
            job_pool: &jobs,
        };
        worker.process(&context, false);
        worker.stop_workflow();
        worker.wait_for_finish_of_task();

        // The landscape job was already in flight, so its result lands.
        assert_eq!(worker.status(), GenerationStatus::GeneratedLandscape);
        assert!(worker.process(&context, false).is_none());
        assert_eq!(worker.status(), GenerationStatus::GeneratedLandscape);
    }

    #[test]
    fn at_once_processing_reaches_the_build_without_external_draining() {
        let jobs = JobPool::new(2);
        let mut world = World::new(&WorldSettings::default());
        let workers = HashMap::new();
        let mut worker = known_worker(Point3::new(0, 0, 0));
        // Geometry parks until the four edge-adjacent chunks exist.
        for offset in Chunk::cardinal_neighbor_offsets() {
            let neighbor = Point3::new(0, 0, 0) + offset;
            world
                .chunks
                .insert(neighbor, MtResource::new(Chunk::empty(neighbor)));
        }

        let context = GenerationContext {
            world: &world,
            workers: &workers,
            job_pool: &jobs,
        };
        for _ in 0..10_000 {
            if let Some(build) = worker.process(&context, true) {
                assert!(build.model_for_opaque.is_empty());
                return;
            }
        }
        panic!("the worker never finished its build");
    }
}
