//! # Generation Workspace Module
//!
//! This module defines the scratch state a generation worker accumulates while
//! its chunk moves through the pipeline: the surface summary produced by the
//! landscape stage, boundary data shared in by neighbors, the light buffer, and
//! the geometry batches that eventually become models.
//!
//! The workspace also enforces the staged build protocol. Every transition goes
//! through [`ChunkWorkspace::advance_state`], and a task finding the workspace
//! in the wrong state is a driver bug, so it panics instead of recovering.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;

use crate::core::MtResource;
use crate::engine_state::generation::build::{ChunkModel, ModelVertex};
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::Block;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_WIDTH};

/// How far decoration may reach across a chunk boundary, in cells.
///
/// Tree canopies extend at most this far from their root column, so the
/// decoration stage only ever needs a ring of this width from its neighbors.
pub const DECORATION_MARGIN: i32 = 2;

// Boundary planes index their cells as `a + y * CHUNK_WIDTH` regardless of
// which axis `a` runs along.
const _: () = assert!(CHUNK_WIDTH == CHUNK_DEPTH);

/// The build stages a workspace moves through, in order.
///
/// `GeometryInProcess` is the only stage entered at task launch rather than
/// task completion: the geometry task marks the workspace busy while its
/// batch jobs are in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceState {
    /// Nothing has been generated yet.
    Created,

    /// Terrain is written and the surface summary is available.
    LandscapeDone,

    /// Decorations are placed.
    DecorationsDone,

    /// The light buffer is computed and published to the chunk.
    LightDone,

    /// Geometry batch jobs are currently running.
    GeometryInProcess,

    /// Geometry batches are filled.
    GeometryDone,

    /// Models are packaged; the workspace is exhausted.
    ModelDone,
}

/// One column's terrain summary: how tall the terrain is and what block tops it.
///
/// Surface columns drive decoration. They describe terrain only; trees and
/// flowers placed later never show up in them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceColumn {
    /// The number of terrain cells from the bottom of the world; the topmost
    /// terrain block sits at `height - 1`.
    pub height: i32,

    /// The block type at the top of the terrain, `AIR` for columns with no
    /// terrain at all.
    pub block_type: BlockType,
}

/// A one-cell-thick slice of a neighboring chunk's boundary cells.
///
/// Geometry meshes faces against the cells just outside the chunk; the four
/// cardinal neighbors each contribute one of these planes (block type plus
/// light level) before the geometry task launches.
#[derive(Clone, Debug)]
pub struct BoundaryPlane {
    /// Cells indexed `a + y * CHUNK_WIDTH`, where `a` runs along the boundary
    /// edge (Z for left/right planes, X for front/back planes).
    cells: Vec<Block>,
}

impl BoundaryPlane {
    /// Extracts the outgoing boundary slice of a chunk, taking light levels
    /// straight from the chunk's block data.
    ///
    /// # Arguments
    /// * `chunk` - The source chunk; its light must already be published
    /// * `side` - Which face of the source chunk to slice
    ///
    /// # Panics
    /// Panics if `side` is `TOP` or `BOTTOM`; chunks span the full world
    /// height and never share vertical planes.
    pub fn from_chunk(chunk: &Chunk, side: BlockSide) -> Self {
        Self::extract(side, |x, y, z| chunk.block_at(x, y, z))
    }

    /// Extracts the outgoing boundary slice of a chunk, overriding light
    /// levels from a separate buffer laid out like the chunk's block array.
    ///
    /// # Arguments
    /// * `chunk` - The source chunk
    /// * `light_levels` - A `CHUNK_SIZE` buffer of block light values
    /// * `side` - Which face of the source chunk to slice
    pub fn from_chunk_with_light(chunk: &Chunk, light_levels: &[u8], side: BlockSide) -> Self {
        Self::extract(side, |x, y, z| {
            let mut block = chunk.block_at(x, y, z);
            block.light_level = light_levels[Chunk::index_of(x, y, z)];
            block
        })
    }

    fn extract(side: BlockSide, cell_at: impl Fn(i32, i32, i32) -> Block) -> Self {
        let edge = match side {
            BlockSide::LEFT | BlockSide::RIGHT => CHUNK_DEPTH,
            BlockSide::FRONT | BlockSide::BACK => CHUNK_WIDTH,
            BlockSide::TOP | BlockSide::BOTTOM => {
                panic!("chunks never share {:?} boundary planes", side)
            }
        };
        let mut cells = Vec::with_capacity((edge * CHUNK_HEIGHT) as usize);
        for y in 0..CHUNK_HEIGHT {
            for a in 0..edge {
                let (x, z) = match side {
                    BlockSide::LEFT => (0, a),
                    BlockSide::RIGHT => (CHUNK_WIDTH - 1, a),
                    BlockSide::BACK => (a, 0),
                    BlockSide::FRONT => (a, CHUNK_DEPTH - 1),
                    _ => unreachable!(),
                };
                cells.push(cell_at(x, y, z));
            }
        }
        BoundaryPlane { cells }
    }

    /// Returns the cell at edge coordinate `a` and height `y`.
    ///
    /// # Panics
    /// Panics if the coordinates fall outside the plane.
    pub fn cell(&self, a: i32, y: i32) -> Block {
        assert!(
            (0..CHUNK_WIDTH).contains(&a) && (0..CHUNK_HEIGHT).contains(&y),
            "boundary plane coordinates out of bounds: ({}, {})",
            a,
            y
        );
        self.cells[(a + y * CHUNK_WIDTH) as usize]
    }
}

/// Batch filter collecting fully opaque blocks.
pub fn collect_opaque(block: Block) -> bool {
    block.meta_type().is_opaque()
}

/// Batch filter collecting transparent blocks such as water.
pub fn collect_transparent(block: Block) -> bool {
    block.meta_type().is_transparent()
}

/// Batch filter collecting partially transparent blocks, diagonals included.
pub fn collect_partially_transparent(block: Block) -> bool {
    block.meta_type().is_partially_transparent()
}

fn collect_nothing(_: Block) -> bool {
    false
}

/// One geometry batch: the flat vertex attributes of every quad a render pass
/// will draw, plus the finished model once packaging has run.
///
/// Attributes are kept as flat float arrays while meshing appends to them;
/// the model task interleaves them at the end.
pub struct Batch {
    /// Vertex positions, three floats per vertex.
    pub vertices: Vec<f32>,

    /// Atlas UVs, two floats per vertex.
    pub texture_coordinates: Vec<f32>,

    /// Final vertex light values, one float per vertex.
    pub light_levels: Vec<f32>,

    /// Triangle indices, six per quad.
    pub indices: Vec<u32>,

    /// Decides which blocks this batch collects during meshing.
    pub filter: fn(Block) -> bool,

    /// The packaged model, set by the model task.
    pub model: Option<Arc<ChunkModel>>,
}

impl Batch {
    /// Creates an empty batch collecting blocks matched by `filter`.
    pub fn new(filter: fn(Block) -> bool) -> Self {
        Batch {
            vertices: Vec::new(),
            texture_coordinates: Vec::new(),
            light_levels: Vec::new(),
            indices: Vec::new(),
            filter,
            model: None,
        }
    }

    /// Returns how many quads have been appended so far.
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Interleaves the flat attribute arrays into a renderable model.
    ///
    /// # Panics
    /// Panics if the attribute arrays have drifted out of step, which would
    /// mean a meshing bug.
    pub fn to_model(&self) -> ChunkModel {
        assert_eq!(self.vertices.len() % 3, 0, "vertex array not a whole number of vertices");
        let vertex_count = self.vertices.len() / 3;
        assert_eq!(self.texture_coordinates.len(), vertex_count * 2);
        assert_eq!(self.light_levels.len(), vertex_count);

        let mut vertices = Vec::with_capacity(vertex_count);
        for i in 0..vertex_count {
            vertices.push(ModelVertex {
                position: [
                    self.vertices[3 * i],
                    self.vertices[3 * i + 1],
                    self.vertices[3 * i + 2],
                ],
                tex_coords: [
                    self.texture_coordinates[2 * i],
                    self.texture_coordinates[2 * i + 1],
                ],
                light: self.light_levels[i],
            });
        }
        ChunkModel {
            vertices,
            indices: self.indices.clone(),
        }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Batch::new(collect_nothing)
    }
}

/// The intermediate state one generation worker accumulates for its chunk.
///
/// The workspace lives on the driver thread. Tasks never borrow it across
/// threads: jobs receive value snapshots or moved buffers and their results
/// are folded back in when the worker observes completion.
pub struct ChunkWorkspace {
    /// Shared handle to the chunk being generated.
    pub chunk: MtResource<Chunk>,

    /// The chunk's world position, cached to avoid locking for lookups.
    pub position: Point3<i32>,

    /// The current build stage.
    pub state: WorkspaceState,

    /// Per-column terrain summary, filled by the landscape stage. Stays empty
    /// for chunks restored from the store, whose terrain already exists.
    pub surface: Vec<SurfaceColumn>,

    /// Surface columns shared in by neighbors, keyed by world `(x, z)`.
    /// Covers the decoration margin ring around this chunk.
    pub shared_surface: HashMap<(i32, i32), SurfaceColumn>,

    /// Boundary planes shared in by cardinal neighbors, indexed by
    /// `BlockSide`. The `TOP` and `BOTTOM` slots stay empty.
    pub shared_planes: [Option<BoundaryPlane>; 6],

    /// Block light levels laid out like the chunk's block array, retained
    /// after the light stage for boundary sharing.
    pub light_levels: Vec<u8>,

    /// Geometry batch for the opaque render pass.
    pub batch_for_opaque: Batch,

    /// Geometry batch for the transparent render pass.
    pub batch_for_transparent: Batch,

    /// Geometry batch for the partially transparent render pass.
    pub batch_for_partially_transparent: Batch,
}

impl ChunkWorkspace {
    /// Creates a workspace for a chunk entering the pipeline.
    ///
    /// # Arguments
    /// * `chunk` - Shared handle to the chunk being generated
    /// * `state` - `Created` for fresh chunks, `DecorationsDone` for chunks
    ///   restored from the store that only need light and geometry
    pub fn new(chunk: MtResource<Chunk>, state: WorkspaceState) -> Self {
        let position = chunk.get().position;
        ChunkWorkspace {
            chunk,
            position,
            state,
            surface: Vec::new(),
            shared_surface: HashMap::new(),
            shared_planes: Default::default(),
            light_levels: Vec::new(),
            batch_for_opaque: Batch::new(collect_opaque),
            batch_for_transparent: Batch::new(collect_transparent),
            batch_for_partially_transparent: Batch::new(collect_partially_transparent),
        }
    }

    /// Asserts the workspace is in the stage a task expects to find it in.
    ///
    /// # Panics
    /// Panics on a mismatch; tasks running out of order are a driver bug.
    pub fn assert_state(&self, expected: WorkspaceState) {
        assert_eq!(
            self.state, expected,
            "workspace for chunk at {:?} is in stage {:?}, expected {:?}",
            self.position, self.state, expected
        );
    }

    /// Moves the workspace from one stage to the next.
    ///
    /// # Arguments
    /// * `expected` - The stage the workspace must currently be in
    /// * `next` - The stage to enter
    ///
    /// # Panics
    /// Panics if the workspace isn't in `expected`.
    pub fn advance_state(&mut self, expected: WorkspaceState, next: WorkspaceState) {
        self.assert_state(expected);
        self.state = next;
    }

    /// Copies this workspace's published data into a neighboring workspace,
    /// keyed on what the recipient is about to do.
    ///
    /// A recipient that has just finished its landscape receives the surface
    /// columns overlapping its decoration margin ring; a recipient that has
    /// just finished its light receives the boundary plane facing it. Any
    /// other recipient stage receives nothing.
    ///
    /// # Arguments
    /// * `target` - The workspace of the neighbor collecting shares
    pub fn share(&self, target: &mut ChunkWorkspace) {
        match target.state {
            WorkspaceState::LandscapeDone => self.share_surface_ring(target),
            WorkspaceState::LightDone => self.share_boundary_plane(target),
            _ => {}
        }
    }

    fn share_surface_ring(&self, target: &mut ChunkWorkspace) {
        if self.surface.is_empty() {
            let columns = derive_surface_columns(&self.chunk.get());
            target.accept_surface_ring(&columns, self.position);
        } else {
            target.accept_surface_ring(&self.surface, self.position);
        }
    }

    fn share_boundary_plane(&self, target: &mut ChunkWorkspace) {
        let Some(side) = side_of_neighbor(target.position, self.position) else {
            // Diagonal neighbors have no boundary plane to offer.
            return;
        };
        debug_assert_eq!(
            self.light_levels.len(),
            CHUNK_SIZE as usize,
            "sharing a boundary plane before light completed"
        );
        let plane =
            BoundaryPlane::from_chunk_with_light(&self.chunk.get(), &self.light_levels, side.opposite());
        target.accept_boundary_plane(side, plane);
    }

    /// Merges a neighbor's surface columns into the shared margin ring.
    ///
    /// Only columns falling inside this chunk's decoration margin ring are
    /// kept; the rest of the neighbor's columns are ignored.
    ///
    /// # Arguments
    /// * `columns` - The neighbor's per-column surface summary
    /// * `source_position` - The neighbor chunk's world position
    pub fn accept_surface_ring(&mut self, columns: &[SurfaceColumn], source_position: Point3<i32>) {
        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                let world_x = source_position.x + x;
                let world_z = source_position.z + z;
                if self.is_in_margin_ring(world_x, world_z) {
                    let column = columns[(x + z * CHUNK_WIDTH) as usize];
                    self.shared_surface.insert((world_x, world_z), column);
                }
            }
        }
    }

    /// Stores the boundary plane facing this chunk's given side.
    pub fn accept_boundary_plane(&mut self, side: BlockSide, plane: BoundaryPlane) {
        self.shared_planes[side as usize] = Some(plane);
    }

    fn is_in_margin_ring(&self, world_x: i32, world_z: i32) -> bool {
        let x0 = self.position.x;
        let z0 = self.position.z;
        let inside_extended = (x0 - DECORATION_MARGIN..x0 + CHUNK_WIDTH + DECORATION_MARGIN)
            .contains(&world_x)
            && (z0 - DECORATION_MARGIN..z0 + CHUNK_DEPTH + DECORATION_MARGIN).contains(&world_z);
        let inside_own = (x0..x0 + CHUNK_WIDTH).contains(&world_x)
            && (z0..z0 + CHUNK_DEPTH).contains(&world_z);
        inside_extended && !inside_own
    }
}

/// Reconstructs the terrain surface summary of an already generated chunk.
///
/// Decoration blocks (wood, leaves, flowers) and water are skipped so the
/// summary matches what the landscape stage originally reported. Columns
/// without any terrain report a height of zero.
///
/// # Arguments
/// * `chunk` - A chunk whose terrain has been fully generated
pub fn derive_surface_columns(chunk: &Chunk) -> Vec<SurfaceColumn> {
    let mut columns = Vec::with_capacity((CHUNK_WIDTH * CHUNK_DEPTH) as usize);
    for z in 0..CHUNK_DEPTH {
        for x in 0..CHUNK_WIDTH {
            let mut column = SurfaceColumn {
                height: 0,
                block_type: BlockType::AIR,
            };
            for y in (0..CHUNK_HEIGHT).rev() {
                let block_type = chunk.block_at(x, y, z).block_type();
                if matches!(
                    block_type,
                    BlockType::STONE | BlockType::DIRT | BlockType::DIRT_WITH_GRASS
                ) {
                    column = SurfaceColumn {
                        height: y + 1,
                        block_type,
                    };
                    break;
                }
            }
            columns.push(column);
        }
    }
    columns
}

/// Returns which side of `position` the neighbor at `neighbor_position` sits
/// on, or `None` when the two chunks aren't edge-adjacent.
pub fn side_of_neighbor(position: Point3<i32>, neighbor_position: Point3<i32>) -> Option<BlockSide> {
    let delta = neighbor_position - position;
    match (delta.x, delta.z) {
        (0, CHUNK_DEPTH) => Some(BlockSide::FRONT),
        (0, d) if d == -CHUNK_DEPTH => Some(BlockSide::BACK),
        (w, 0) if w == -CHUNK_WIDTH => Some(BlockSide::LEFT),
        (CHUNK_WIDTH, 0) => Some(BlockSide::RIGHT),
        _ => None,
    }
}
