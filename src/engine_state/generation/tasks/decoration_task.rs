//! # Decoration Task
//!
//! This module plants trees and flowers on top of generated terrain. Every
//! decoration is rooted in a single surface column and decided by a random
//! generator seeded from the world seed and that column's world coordinates,
//! so any chunk that can see the column reaches the same verdict.
//!
//! ## Cross-Chunk Agreement
//!
//! A tree canopy can overhang a chunk boundary. Instead of coordinating
//! writes between chunks, each chunk scans the decoration margin ring around
//! itself (using surface columns its neighbors shared in), regenerates every
//! decoration rooted there and keeps only the cells that fall inside its own
//! bounds. Two chunks scanning the same column agree on the outcome because
//! the roll depends on nothing but the seed and the column.
//!
//! Decoration cells are only ever written into air, in scan order, so
//! overlapping canopies resolve identically on both sides of a boundary.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};

use crate::core::{JobHandle, JobPool};
use crate::engine_state::generation::tasks::TaskState;
use crate::engine_state::generation::workspace::{
    ChunkWorkspace, SurfaceColumn, WorkspaceState, DECORATION_MARGIN,
};
use crate::engine_state::settings::GenerationSettings;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::Block;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DEPTH, CHUNK_WIDTH};

/// One in this many grass columns roots a tree.
pub const TREE_CHANCE_IN: u32 = 100;
/// One in this many grass columns grows a flower, checked only where the
/// tree roll failed.
pub const FLOWER_CHANCE_IN: u32 = 60;

/// A decoration rooted in one surface column, expressed in world coordinates.
#[derive(Debug, PartialEq, Eq)]
enum Decoration {
    Tree {
        /// The first cell above the terrain surface.
        root: Point3<i32>,
        trunk_height: i32,
    },
    Flower {
        root: Point3<i32>,
    },
}

impl Decoration {
    /// Lists every cell the decoration wants to occupy, trunk before canopy.
    fn cells(&self) -> Vec<(Point3<i32>, BlockType)> {
        match *self {
            Decoration::Flower { root } => vec![(root, BlockType::BLUE_FLOWER)],
            Decoration::Tree { root, trunk_height } => {
                let mut cells = Vec::new();
                for dy in 0..trunk_height {
                    cells.push((root + Vector3::new(0, dy, 0), BlockType::WOOD));
                }

                // The crown sits just above the trunk top.
                let crown = root.y + trunk_height;

                // Two broad layers wrap the trunk's top cells, corners
                // trimmed.
                for y in [crown - 2, crown - 1] {
                    for dx in -2..=2 {
                        for dz in -2..=2 {
                            if dx == 0 && dz == 0 {
                                continue;
                            }
                            if i32::abs(dx) == 2 && i32::abs(dz) == 2 {
                                continue;
                            }
                            cells.push((Point3::new(root.x + dx, y, root.z + dz), BlockType::LEAVES));
                        }
                    }
                }

                // A full three by three cap, then a plus shape on top.
                for dx in -1..=1 {
                    for dz in -1..=1 {
                        cells.push((Point3::new(root.x + dx, crown, root.z + dz), BlockType::LEAVES));
                    }
                }
                for (dx, dz) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
                    cells.push((
                        Point3::new(root.x + dx, crown + 1, root.z + dz),
                        BlockType::LEAVES,
                    ));
                }
                cells
            }
        }
    }
}

/// Builds the random generator owned by one surface column.
///
/// The mix folds the column's world coordinates into the world seed with the
/// usual 64-bit hashing primes, sign-extending so negative coordinates get
/// distinct streams.
fn column_rng(seed: u32, world_x: i32, world_z: i32) -> fastrand::Rng {
    let mixed = (seed as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((world_x as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
        .wrapping_add((world_z as i64 as u64).wrapping_mul(0x1656_67B1_9E37_79F9));
    fastrand::Rng::with_seed(mixed)
}

/// Decides what, if anything, grows on a surface column.
///
/// Decorations only root on grass. The tree roll always comes first so the
/// generator's draw sequence is identical wherever the column is evaluated.
fn decoration_for_column(
    seed: u32,
    world_x: i32,
    world_z: i32,
    column: SurfaceColumn,
) -> Option<Decoration> {
    if column.block_type != BlockType::DIRT_WITH_GRASS {
        return None;
    }
    let mut rng = column_rng(seed, world_x, world_z);
    let root = Point3::new(world_x, column.height, world_z);
    if rng.u32(0..TREE_CHANCE_IN) == 0 {
        return Some(Decoration::Tree {
            root,
            trunk_height: rng.i32(4..=6),
        });
    }
    if rng.u32(0..FLOWER_CHANCE_IN) == 0 {
        return Some(Decoration::Flower { root });
    }
    None
}

/// Applies every decoration rooted in or near the chunk to its block array.
///
/// # Arguments
/// * `position` - The chunk's world position
/// * `blocks` - The chunk's block array, moved in and returned decorated
/// * `surface` - The chunk's own surface summary
/// * `shared_surface` - Margin ring columns shared in by neighbors
/// * `settings` - World generation parameters
fn decorate(
    position: Point3<i32>,
    mut blocks: Vec<Block>,
    surface: Vec<SurfaceColumn>,
    shared_surface: HashMap<(i32, i32), SurfaceColumn>,
    settings: GenerationSettings,
) -> Vec<Block> {
    let column_at = |world_x: i32, world_z: i32| -> Option<SurfaceColumn> {
        let local_x = world_x - position.x;
        let local_z = world_z - position.z;
        if (0..CHUNK_WIDTH).contains(&local_x) && (0..CHUNK_DEPTH).contains(&local_z) {
            Some(surface[(local_x + local_z * CHUNK_WIDTH) as usize])
        } else {
            shared_surface.get(&(world_x, world_z)).copied()
        }
    };

    for world_z in (position.z - DECORATION_MARGIN)..(position.z + CHUNK_DEPTH + DECORATION_MARGIN) {
        for world_x in
            (position.x - DECORATION_MARGIN)..(position.x + CHUNK_WIDTH + DECORATION_MARGIN)
        {
            let Some(column) = column_at(world_x, world_z) else {
                continue;
            };
            let Some(decoration) = decoration_for_column(settings.seed, world_x, world_z, column)
            else {
                continue;
            };
            for (cell, block_type) in decoration.cells() {
                let local_x = cell.x - position.x;
                let local_z = cell.z - position.z;
                if !Chunk::contains_local(local_x, cell.y, local_z) {
                    continue;
                }
                let index = Chunk::index_of(local_x, cell.y, local_z);
                if blocks[index].block_type() == BlockType::AIR {
                    blocks[index] = Block::new(block_type);
                }
            }
        }
    }
    blocks
}

/// The decoration task: grows trees and flowers over finished terrain.
///
/// Runs as a single job over a snapshot of the chunk's blocks; nothing else
/// writes the chunk while its worker is in this stage, so the snapshot is
/// authoritative and folding it back is a plain copy.
pub struct DecorationTask {
    state: TaskState,
    pending: Option<JobHandle<Vec<Block>>>,
}

impl DecorationTask {
    /// Creates the task in its deferred state.
    pub fn new() -> Self {
        DecorationTask {
            state: TaskState::Deferred,
            pending: None,
        }
    }

    /// Returns the task's lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Submits the decoration job.
    ///
    /// # Panics
    /// Panics if the workspace hasn't finished its landscape stage.
    pub fn launch(
        &mut self,
        workspace: &mut ChunkWorkspace,
        jobs: &JobPool,
        settings: GenerationSettings,
    ) {
        workspace.assert_state(WorkspaceState::LandscapeDone);
        let position = workspace.position;
        let blocks = workspace.chunk.get().blocks().to_vec();
        let surface = workspace.surface.clone();
        let shared_surface = workspace.shared_surface.clone();
        self.pending = Some(jobs.submit(move || {
            decorate(position, blocks, surface, shared_surface, settings)
        }));
        self.state = TaskState::Launched;
    }

    /// Collects the decoration job if it has finished, without blocking.
    pub fn poll(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.as_mut() {
            if let Some(blocks) = handle.try_take() {
                self.pending = None;
                self.finish(workspace, blocks);
            }
        }
        self.state
    }

    /// Blocks until the decoration job has finished and is folded back.
    pub fn wait(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.take() {
            let blocks = handle.wait_take();
            self.finish(workspace, blocks);
        }
        self.state
    }

    fn finish(&mut self, workspace: &mut ChunkWorkspace, blocks: Vec<Block>) {
        workspace.chunk.get_mut().blocks_mut().copy_from_slice(&blocks);
        workspace.advance_state(WorkspaceState::LandscapeDone, WorkspaceState::DecorationsDone);
        self.state = TaskState::Done;
    }
}

impl Default for DecorationTask {
    fn default() -> Self {
        Self::new()
    }
}
