//! # Model Task
//!
//! This module packages the three filled geometry batches into the interleaved
//! vertex models the renderer consumes. Packaging is the last pipeline stage;
//! once it completes the worker can hand the chunk's build to the engine and
//! retire.

use std::sync::Arc;

use crate::core::{JobHandle, JobPool};
use crate::engine_state::generation::tasks::TaskState;
use crate::engine_state::generation::workspace::{Batch, ChunkWorkspace, WorkspaceState};

/// The model packaging task.
///
/// Runs as a single job that interleaves all three batches; the batches come
/// back with their `model` slots filled.
pub struct ModelTask {
    state: TaskState,
    pending: Option<JobHandle<[Batch; 3]>>,
}

impl ModelTask {
    /// Creates the task in its deferred state.
    pub fn new() -> Self {
        ModelTask {
            state: TaskState::Deferred,
            pending: None,
        }
    }

    /// Returns the task's lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Moves the batches out of the workspace and submits the packaging job.
    ///
    /// # Panics
    /// Panics if the workspace hasn't finished its geometry stage.
    pub fn launch(&mut self, workspace: &mut ChunkWorkspace, jobs: &JobPool) {
        workspace.assert_state(WorkspaceState::GeometryDone);
        let batches = [
            std::mem::take(&mut workspace.batch_for_opaque),
            std::mem::take(&mut workspace.batch_for_transparent),
            std::mem::take(&mut workspace.batch_for_partially_transparent),
        ];
        self.pending = Some(jobs.submit(move || {
            let mut batches = batches;
            for batch in &mut batches {
                batch.model = Some(Arc::new(batch.to_model()));
            }
            batches
        }));
        self.state = TaskState::Launched;
    }

    /// Collects the packaging job if it has finished, without blocking.
    pub fn poll(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.as_mut() {
            if let Some(batches) = handle.try_take() {
                self.pending = None;
                self.finish(workspace, batches);
            }
        }
        self.state
    }

    /// Blocks until the packaging job has finished and is folded back.
    pub fn wait(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.take() {
            let batches = handle.wait_take();
            self.finish(workspace, batches);
        }
        self.state
    }

    fn finish(&mut self, workspace: &mut ChunkWorkspace, batches: [Batch; 3]) {
        let [opaque, transparent, partially_transparent] = batches;
        workspace.batch_for_opaque = opaque;
        workspace.batch_for_transparent = transparent;
        workspace.batch_for_partially_transparent = partially_transparent;
        workspace.advance_state(WorkspaceState::GeometryDone, WorkspaceState::ModelDone);
        self.state = TaskState::Done;
    }
}

impl Default for ModelTask {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MtResource;
    use crate::engine_state::voxels::chunk::Chunk;
    use cgmath::Point3;

    fn quad_batch() -> Batch {
        Batch {
            vertices: vec![
                0.0, 0.0, 1.0, //
                1.0, 0.0, 1.0, //
                0.0, 1.0, 1.0, //
                1.0, 1.0, 1.0,
            ],
            texture_coordinates: vec![0.0, 0.0, 0.1, 0.0, 0.0, 0.1, 0.1, 0.1],
            light_levels: vec![15.0, 15.0, 14.0, 14.0],
            indices: vec![0, 1, 3, 0, 3, 2],
            ..Batch::default()
        }
    }

    #[test]
    fn packaging_interleaves_the_batch_attributes() {
        let jobs = JobPool::new(1);
        let chunk = MtResource::new(Chunk::empty(Point3::new(0, 0, 0)));
        let mut workspace = ChunkWorkspace::new(chunk, WorkspaceState::GeometryDone);
        workspace.batch_for_opaque = quad_batch();

        let mut task = ModelTask::new();
        task.launch(&mut workspace, &jobs);
        assert_eq!(task.wait(&mut workspace), TaskState::Done);
        assert_eq!(workspace.state, WorkspaceState::ModelDone);

        let model = workspace.batch_for_opaque.model.as_ref().unwrap();
        assert_eq!(model.vertices.len(), 4);
        assert_eq!(model.indices, vec![0, 1, 3, 0, 3, 2]);
        assert_eq!(model.vertices[1].position, [1.0, 0.0, 1.0]);
        assert_eq!(model.vertices[1].tex_coords, [0.1, 0.0]);
        assert_eq!(model.vertices[2].light, 14.0);
        assert!(!model.is_empty());
    }

    #[test]
    fn empty_batches_package_into_empty_models() {
        let jobs = JobPool::new(1);
        let chunk = MtResource::new(Chunk::empty(Point3::new(0, 0, 0)));
        let mut workspace = ChunkWorkspace::new(chunk, WorkspaceState::GeometryDone);

        let mut task = ModelTask::new();
        task.launch(&mut workspace, &jobs);
        task.wait(&mut workspace);

        for batch in [
            &workspace.batch_for_opaque,
            &workspace.batch_for_transparent,
            &workspace.batch_for_partially_transparent,
        ] {
            let model = batch.model.as_ref().unwrap();
            assert!(model.is_empty());
        }
    }

    #[test]
    fn polling_before_launch_stays_deferred() {
        let chunk = MtResource::new(Chunk::empty(Point3::new(0, 0, 0)));
        let mut workspace = ChunkWorkspace::new(chunk, WorkspaceState::GeometryDone);

        let mut task = ModelTask::new();
        assert_eq!(task.poll(&mut workspace), TaskState::Deferred);
        assert_eq!(task.wait(&mut workspace), TaskState::Deferred);
        assert_eq!(workspace.state, WorkspaceState::GeometryDone);
    }
}
