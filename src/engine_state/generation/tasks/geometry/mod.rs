//! # Geometry Generation Module
//!
//! This module meshes a chunk's blocks into the three geometry batches the
//! renderer draws (opaque, transparent, partially transparent). Meshing runs
//! as three parallel jobs, one per batch, over a shared immutable view of the
//! chunk's cells plus the boundary planes its cardinal neighbors shared in.
//!
//! ## Face Culling
//!
//! A face is meshed or skipped purely from the meta types of the block and the
//! neighbor cell the face opens onto:
//!
//! * opaque against opaque is skipped
//! * transparent against opaque or transparent is skipped
//! * partially transparent against opaque is skipped
//! * everything else is drawn, and faces at the edge of the known world are
//!   always drawn
//!
//! Diagonal blocks ignore face culling entirely: they always contribute two
//! crossed quads lit by their own cell.

use std::sync::Arc;

use cgmath::Point3;

use crate::core::JobHandle;
use crate::core::JobPool;
use crate::engine_state::generation::tasks::TaskState;
use crate::engine_state::generation::workspace::{Batch, BoundaryPlane, ChunkWorkspace, WorkspaceState};
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::{Block, MAX_VERTEX_LIGHT, MIN_VERTEX_LIGHT};
use crate::engine_state::voxels::block::DEFAULT_LIGHT_LEVEL;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::engine_state::voxels::texture_atlas;

pub mod ao;
pub mod face_data;

/// How strongly a fully occluded corner darkens its vertex light.
pub const AO_LIGHT_WEIGHT: f32 = 0.4;

/// An immutable snapshot of everything meshing may look at: the chunk's own
/// cells plus up to four boundary planes shared in by cardinal neighbors.
///
/// Lookups outside the snapshot (above or below the world, or past a boundary
/// no neighbor has shared) return `None`, which meshing treats as the edge of
/// the known world.
pub struct BlockView {
    blocks: Vec<Block>,
    planes: [Option<BoundaryPlane>; 6],
}

impl BlockView {
    /// Creates a view over a chunk's block snapshot and its shared planes.
    ///
    /// # Arguments
    /// * `blocks` - A copy of the chunk's block array
    /// * `planes` - Boundary planes indexed by `BlockSide`
    pub fn new(blocks: Vec<Block>, planes: [Option<BoundaryPlane>; 6]) -> Self {
        BlockView { blocks, planes }
    }

    /// Returns the cell at in-bounds chunk coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn cell(&self, x: i32, y: i32, z: i32) -> Block {
        self.blocks[Chunk::index_of(x, y, z)]
    }

    /// Looks up a cell by chunk-local coordinates, reaching one cell into
    /// shared boundary planes where available.
    ///
    /// # Returns
    /// `Some(block)` for cells inside the chunk or covered by a shared plane,
    /// `None` beyond the known world.
    pub fn block_at(&self, position: Point3<i32>) -> Option<Block> {
        let Point3 { x, y, z } = position;
        if !(0..CHUNK_HEIGHT).contains(&y) {
            return None;
        }
        if Chunk::contains_local(x, y, z) {
            return Some(self.blocks[Chunk::index_of(x, y, z)]);
        }
        if x == -1 && (0..CHUNK_DEPTH).contains(&z) {
            return self.plane(BlockSide::LEFT).map(|plane| plane.cell(z, y));
        }
        if x == CHUNK_WIDTH && (0..CHUNK_DEPTH).contains(&z) {
            return self.plane(BlockSide::RIGHT).map(|plane| plane.cell(z, y));
        }
        if z == -1 && (0..CHUNK_WIDTH).contains(&x) {
            return self.plane(BlockSide::BACK).map(|plane| plane.cell(x, y));
        }
        if z == CHUNK_DEPTH && (0..CHUNK_WIDTH).contains(&x) {
            return self.plane(BlockSide::FRONT).map(|plane| plane.cell(x, y));
        }
        None
    }

    fn plane(&self, side: BlockSide) -> Option<&BoundaryPlane> {
        self.planes[side as usize].as_ref()
    }
}

/// Decides whether the face between a block and the neighbor cell it opens
/// onto is drawn.
///
/// The decision is a pure function of the two meta types, so both sides of a
/// chunk boundary reach the same verdict independently.
///
/// # Arguments
/// * `block` - The block whose face is being considered
/// * `neighbor` - The cell the face opens onto
pub fn should_generate_quad(block: Block, neighbor: Block) -> bool {
    let meta = block.meta_type();
    let neighbor_meta = neighbor.meta_type();

    if meta.is_opaque() && neighbor_meta.is_transparent_or_partially_transparent() {
        return true;
    }
    if meta.is_transparent() && neighbor_meta.is_partially_transparent() {
        return true;
    }
    if meta.is_partially_transparent() && neighbor_meta.is_transparent_or_partially_transparent() {
        return true;
    }
    neighbor_meta.is_empty()
}

/// Meshes every block matched by the batch's filter and returns the filled
/// batch.
///
/// # Arguments
/// * `view` - The snapshot to mesh against
/// * `batch` - An empty batch whose filter selects the blocks to collect
fn build_batch(view: &BlockView, mut batch: Batch) -> Batch {
    for y in 0..CHUNK_HEIGHT {
        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                let block = view.cell(x, y, z);
                if !(batch.filter)(block) {
                    continue;
                }
                process_block(view, &mut batch, Point3::new(x, y, z), block);
            }
        }
    }
    batch
}

fn process_block(view: &BlockView, batch: &mut Batch, position: Point3<i32>, block: Block) {
    let meta = block.meta_type();
    if meta.is_empty() {
        return;
    }
    let block_type = block.block_type();

    if meta.is_diagonal() {
        // Crossed quads are unconditional and lit by their own cell. The two
        // templates hang off the left/right face slots.
        generate_quad(batch, position, block_type, BlockSide::RIGHT, block.light_level, [0.0; 4]);
        generate_quad(batch, position, block_type, BlockSide::LEFT, block.light_level, [0.0; 4]);
        return;
    }

    for side in BlockSide::all() {
        match view.block_at(position + side.offset()) {
            Some(neighbor) => {
                if should_generate_quad(block, neighbor) {
                    let occlusion = ao::calculate(view, position, side);
                    generate_quad(batch, position, block_type, side, neighbor.light_level, occlusion);
                }
            }
            None => {
                // The edge of the known world is always drawn, fully lit.
                let occlusion = ao::calculate(view, position, side);
                generate_quad(batch, position, block_type, side, DEFAULT_LIGHT_LEVEL, occlusion);
            }
        }
    }
}

fn generate_quad(
    batch: &mut Batch,
    position: Point3<i32>,
    block_type: BlockType,
    side: BlockSide,
    light_level: u8,
    occlusion: [f32; 4],
) {
    generate_indices(batch);
    generate_vertices(batch, position, block_type, side);
    generate_texture_coordinates(batch, block_type, side);
    generate_light_levels(batch, light_level, occlusion);
}

fn generate_indices(batch: &mut Batch) {
    let offset = (batch.indices.len() / 6 * 4) as u32;
    batch
        .indices
        .extend(face_data::QUAD_INDEX_TEMPLATE.iter().map(|index| index + offset));
}

fn generate_vertices(batch: &mut Batch, position: Point3<i32>, block_type: BlockType, side: BlockSide) {
    let template = if block_type.meta_type().is_diagonal() {
        match side {
            BlockSide::RIGHT => &face_data::FIRST_DIAGONAL_VERTICES,
            _ => &face_data::SECOND_DIAGONAL_VERTICES,
        }
    } else {
        face_data::vertex_template(side)
    };

    let offsets = [position.x as f32, position.y as f32, position.z as f32];
    for (index, component) in template.iter().enumerate() {
        batch.vertices.push(component + offsets[index % 3]);
    }
}

fn generate_texture_coordinates(batch: &mut Batch, block_type: BlockType, side: BlockSide) {
    let tile = texture_atlas::tile_coordinates(block_type, side);
    for corner in face_data::QUAD_UV_TEMPLATE {
        let uv = texture_atlas::to_atlas_uv(tile, cgmath::Vector2::new(corner[0], corner[1]));
        batch.texture_coordinates.extend_from_slice(&uv);
    }
}

fn generate_light_levels(batch: &mut Batch, light_level: u8, occlusion: [f32; 4]) {
    let light = (light_level as f32).clamp(MIN_VERTEX_LIGHT, MAX_VERTEX_LIGHT);
    for level in occlusion {
        batch.light_levels.push(light - level * light * AO_LIGHT_WEIGHT);
    }
}

/// The geometry generation task: meshes the chunk into its three batches.
///
/// Launching snapshots the chunk under a short read lock, moves the three
/// empty batches out of the workspace and submits one meshing job per batch.
/// The filled batches are folded back into the workspace when the worker
/// observes completion.
pub struct GeometryTask {
    state: TaskState,
    pending: [Option<JobHandle<Batch>>; 3],
    finished: [Option<Batch>; 3],
}

impl GeometryTask {
    /// Creates the task in its deferred state.
    pub fn new() -> Self {
        GeometryTask {
            state: TaskState::Deferred,
            pending: Default::default(),
            finished: Default::default(),
        }
    }

    /// Returns the task's lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Snapshots the chunk and submits the three batch jobs.
    ///
    /// # Panics
    /// Panics if the workspace hasn't finished its light stage.
    pub fn launch(&mut self, workspace: &mut ChunkWorkspace, jobs: &JobPool) {
        workspace.advance_state(WorkspaceState::LightDone, WorkspaceState::GeometryInProcess);

        let view = Arc::new(BlockView::new(
            workspace.chunk.get().blocks().to_vec(),
            workspace.shared_planes.clone(),
        ));
        let batches = [
            std::mem::take(&mut workspace.batch_for_opaque),
            std::mem::take(&mut workspace.batch_for_transparent),
            std::mem::take(&mut workspace.batch_for_partially_transparent),
        ];
        for (slot, batch) in self.pending.iter_mut().zip(batches) {
            let view = Arc::clone(&view);
            *slot = Some(jobs.submit(move || build_batch(&view, batch)));
        }
        self.state = TaskState::Launched;
    }

    /// Collects any finished batch jobs without blocking.
    ///
    /// # Returns
    /// The task state after polling; `Done` once all three batches are back
    /// in the workspace.
    pub fn poll(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        for (pending, finished) in self.pending.iter_mut().zip(self.finished.iter_mut()) {
            if let Some(handle) = pending.as_mut() {
                if let Some(batch) = handle.try_take() {
                    *finished = Some(batch);
                    *pending = None;
                }
            }
        }
        if self.pending.iter().all(Option::is_none) {
            self.finish(workspace);
        }
        self.state
    }

    /// Blocks until all three batch jobs have finished.
    pub fn wait(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        for (pending, finished) in self.pending.iter_mut().zip(self.finished.iter_mut()) {
            if let Some(handle) = pending.take() {
                *finished = Some(handle.wait_take());
            }
        }
        self.finish(workspace);
        self.state
    }

    fn finish(&mut self, workspace: &mut ChunkWorkspace) {
        let [opaque, transparent, partially_transparent] =
            std::array::from_fn(|index| self.finished[index].take().unwrap());
        workspace.batch_for_opaque = opaque;
        workspace.batch_for_transparent = transparent;
        workspace.batch_for_partially_transparent = partially_transparent;
        workspace.advance_state(WorkspaceState::GeometryInProcess, WorkspaceState::GeometryDone);
        self.state = TaskState::Done;
    }
}

impl Default for GeometryTask {
    fn default() -> Self {
        Self::new()
    }
}
