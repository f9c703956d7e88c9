//! # Light Task
//!
//! This module computes block light for a chunk. Sky light pours straight
//! down every open column at full strength, then floods sideways and down
//! through non-opaque cells, losing one level per step until it peters out.
//!
//! Light is computed per chunk over an opacity snapshot; the resulting buffer
//! is both published into the chunk's blocks and kept on the workspace so the
//! boundary planes shared with neighbors carry lit cells.

use std::collections::VecDeque;

use bitvec::prelude::BitVec;
use cgmath::Point3;

use crate::core::{JobHandle, JobPool};
use crate::engine_state::generation::tasks::TaskState;
use crate::engine_state::generation::workspace::{ChunkWorkspace, WorkspaceState};
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::MAX_LIGHT_LEVEL;
use crate::engine_state::voxels::chunk::{
    Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_WIDTH,
};

/// Floods light through the opacity mask of one chunk.
///
/// # Arguments
/// * `opaque` - One bit per cell in block array order, set for cells that
///   block light
///
/// # Returns
/// A light level per cell in block array order.
fn compute_light(opaque: &BitVec) -> Vec<u8> {
    let mut levels = vec![0u8; CHUNK_SIZE as usize];
    let mut queue = VecDeque::new();

    // Sky light falls undiminished until the first opaque cell of a column.
    for z in 0..CHUNK_DEPTH {
        for x in 0..CHUNK_WIDTH {
            for y in (0..CHUNK_HEIGHT).rev() {
                let index = Chunk::index_of(x, y, z);
                if opaque[index] {
                    break;
                }
                levels[index] = MAX_LIGHT_LEVEL;
                queue.push_back((Point3::new(x, y, z), MAX_LIGHT_LEVEL));
            }
        }
    }

    // Flood outward, one level weaker per step.
    while let Some((cell, level)) = queue.pop_front() {
        if level <= 1 {
            continue;
        }
        let next = level - 1;
        for side in BlockSide::all() {
            let neighbor = cell + side.offset();
            if !Chunk::contains_local(neighbor.x, neighbor.y, neighbor.z) {
                continue;
            }
            let index = Chunk::index_of(neighbor.x, neighbor.y, neighbor.z);
            if opaque[index] || levels[index] >= next {
                continue;
            }
            levels[index] = next;
            queue.push_back((neighbor, next));
        }
    }

    levels
}

/// The light computation task.
///
/// Launching snapshots which cells are opaque under a short read lock; the
/// flood itself runs as a single job. Folding the result back publishes the
/// levels into the chunk's blocks and retains the buffer on the workspace.
pub struct LightTask {
    state: TaskState,
    pending: Option<JobHandle<Vec<u8>>>,
}

impl LightTask {
    /// Creates the task in its deferred state.
    pub fn new() -> Self {
        LightTask {
            state: TaskState::Deferred,
            pending: None,
        }
    }

    /// Returns the task's lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Snapshots the chunk's opacity and submits the flood job.
    ///
    /// # Panics
    /// Panics if the workspace hasn't finished its decoration stage.
    pub fn launch(&mut self, workspace: &mut ChunkWorkspace, jobs: &JobPool) {
        workspace.assert_state(WorkspaceState::DecorationsDone);

        let mut opaque = BitVec::with_capacity(CHUNK_SIZE as usize);
        for block in workspace.chunk.get().blocks() {
            opaque.push(block.meta_type().is_opaque());
        }

        self.pending = Some(jobs.submit(move || compute_light(&opaque)));
        self.state = TaskState::Launched;
    }

    /// Collects the flood job if it has finished, without blocking.
    pub fn poll(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.as_mut() {
            if let Some(levels) = handle.try_take() {
                self.pending = None;
                self.finish(workspace, levels);
            }
        }
        self.state
    }

    /// Blocks until the flood job has finished and is folded back.
    pub fn wait(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.take() {
            let levels = handle.wait_take();
            self.finish(workspace, levels);
        }
        self.state
    }

    fn finish(&mut self, workspace: &mut ChunkWorkspace, levels: Vec<u8>) {
        {
            let mut chunk = workspace.chunk.get_mut();
            for (block, level) in chunk.blocks_mut().iter_mut().zip(&levels) {
                block.light_level = *level;
            }
        }
        workspace.light_levels = levels;
        workspace.advance_state(WorkspaceState::DecorationsDone, WorkspaceState::LightDone);
        self.state = TaskState::Done;
    }
}

impl Default for LightTask {
    fn default() -> Self {
        Self::new()
    }
}
