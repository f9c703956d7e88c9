//! # Generation Tasks Module
//!
//! This module defines the five pipeline tasks a chunk runs through on its way
//! from bare coordinates to renderable models: landscape, decoration, light,
//! geometry and model packaging.
//!
//! ## Task Lifecycle
//!
//! Every task moves through the same three states:
//!
//! 1. `Deferred` - constructed but not yet submitted; preconditions such as
//!    neighbor progress may still be unmet
//! 2. `Launched` - jobs are running on the pool
//! 3. `Done` - results are folded back into the workspace
//!
//! Tasks never block the driver thread on their own: `poll` collects whatever
//! has finished and returns immediately. `wait` is the blocking variant used
//! when a worker has to be drained before its chunk is dropped.

use crate::core::JobPool;
use crate::engine_state::generation::workspace::ChunkWorkspace;
use crate::engine_state::generation::GenerationStatus;
use crate::engine_state::settings::GenerationSettings;

pub mod decoration_task;
pub mod geometry;
pub mod landscape_task;
pub mod light_task;
pub mod model_task;

use decoration_task::DecorationTask;
use geometry::GeometryTask;
use landscape_task::LandscapeTask;
use light_task::LightTask;
use model_task::ModelTask;

/// The lifecycle state of a pipeline task.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Created but not yet submitted to the job pool.
    Deferred,

    /// Jobs are in flight on the pool.
    Launched,

    /// All results are folded back into the workspace.
    Done,
}

/// One stage of the chunk generation pipeline.
///
/// The worker holds at most one of these at a time and drives it with
/// `launch`, `poll` and `wait`; which variant comes next is decided purely by
/// the status the worker is trying to reach.
pub enum GenerationTask {
    /// Terrain generation from world noise.
    Landscape(LandscapeTask),

    /// Tree and flower placement over the terrain.
    Decoration(DecorationTask),

    /// Sky light propagation through the chunk.
    Light(LightTask),

    /// Meshing the chunk into its three geometry batches.
    Geometry(GeometryTask),

    /// Interleaving the batches into GPU-ready models.
    Model(ModelTask),
}

impl GenerationTask {
    /// Creates the task that produces the given status.
    ///
    /// # Panics
    /// Panics if `status` is `Nothing`; no task produces it.
    pub fn for_status(status: GenerationStatus) -> Self {
        match status {
            GenerationStatus::GeneratedLandscape => GenerationTask::Landscape(LandscapeTask::new()),
            GenerationStatus::GeneratedDecorations => {
                GenerationTask::Decoration(DecorationTask::new())
            }
            GenerationStatus::GeneratedLight => GenerationTask::Light(LightTask::new()),
            GenerationStatus::GeneratedGeometry => GenerationTask::Geometry(GeometryTask::new()),
            GenerationStatus::GeneratedModel => GenerationTask::Model(ModelTask::new()),
            GenerationStatus::Nothing => panic!("no task produces status {:?}", status),
        }
    }

    /// Returns the task's lifecycle state.
    pub fn state(&self) -> TaskState {
        match self {
            GenerationTask::Landscape(task) => task.state(),
            GenerationTask::Decoration(task) => task.state(),
            GenerationTask::Light(task) => task.state(),
            GenerationTask::Geometry(task) => task.state(),
            GenerationTask::Model(task) => task.state(),
        }
    }

    /// A short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationTask::Landscape(_) => "landscape",
            GenerationTask::Decoration(_) => "decoration",
            GenerationTask::Light(_) => "light",
            GenerationTask::Geometry(_) => "geometry",
            GenerationTask::Model(_) => "model",
        }
    }

    /// Submits the task's jobs to the pool.
    ///
    /// # Arguments
    /// * `workspace` - The chunk workspace the task reads from and advances
    /// * `jobs` - The pool heavy work runs on
    /// * `settings` - World generation parameters for the noise-driven stages
    pub fn launch(
        &mut self,
        workspace: &mut ChunkWorkspace,
        jobs: &JobPool,
        settings: GenerationSettings,
    ) {
        match self {
            GenerationTask::Landscape(task) => task.launch(workspace, jobs, settings),
            GenerationTask::Decoration(task) => task.launch(workspace, jobs, settings),
            GenerationTask::Light(task) => task.launch(workspace, jobs),
            GenerationTask::Geometry(task) => task.launch(workspace, jobs),
            GenerationTask::Model(task) => task.launch(workspace, jobs),
        }
    }

    /// Collects finished jobs without blocking.
    ///
    /// # Returns
    /// The task state after collection.
    pub fn poll(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        match self {
            GenerationTask::Landscape(task) => task.poll(workspace),
            GenerationTask::Decoration(task) => task.poll(workspace),
            GenerationTask::Light(task) => task.poll(workspace),
            GenerationTask::Geometry(task) => task.poll(workspace),
            GenerationTask::Model(task) => task.poll(workspace),
        }
    }

    /// Blocks until every in-flight job has finished and is folded back.
    ///
    /// # Returns
    /// The task state after draining, `Done` unless the task was never
    /// launched.
    pub fn wait(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        match self {
            GenerationTask::Landscape(task) => task.wait(workspace),
            GenerationTask::Decoration(task) => task.wait(workspace),
            GenerationTask::Light(task) => task.wait(workspace),
            GenerationTask::Geometry(task) => task.wait(workspace),
            GenerationTask::Model(task) => task.wait(workspace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_past_nothing_maps_to_its_task() {
        let statuses = [
            GenerationStatus::GeneratedLandscape,
            GenerationStatus::GeneratedDecorations,
            GenerationStatus::GeneratedLight,
            GenerationStatus::GeneratedGeometry,
            GenerationStatus::GeneratedModel,
        ];
        let kinds = ["landscape", "decoration", "light", "geometry", "model"];
        for (status, kind) in statuses.into_iter().zip(kinds) {
            let task = GenerationTask::for_status(status);
            assert_eq!(task.kind(), kind);
            assert_eq!(task.state(), TaskState::Deferred);
        }
    }

    #[test]
    #[should_panic(expected = "no task produces status")]
    fn nothing_has_no_task() {
        let _ = GenerationTask::for_status(GenerationStatus::Nothing);
    }
}
