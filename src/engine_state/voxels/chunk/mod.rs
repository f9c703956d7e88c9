//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing
//! 16x128x16 columns of voxel data. A chunk spans the full world height, so chunks
//! only adjoin each other horizontally and all cross-chunk bookkeeping works on the
//! XZ plane.
//!
//! ## Storage Layout
//!
//! Chunks store their cells as one dense array in row-major order: X varies
//! fastest, then Z, then Y. The generation pipeline writes terrain, decorations
//! and light levels in place and snapshots whole planes when sharing boundaries
//! with neighbors, so a dense array with O(1) reads and writes is the right
//! trade against sparse encodings.
//!
//! ## Positions
//!
//! A chunk's `position` is the world coordinate of its lowest corner: X and Z
//! are multiples of the chunk width and depth, Y is always zero. World streaming
//! keys its chunk map and worker table by these positions.

use cgmath::{Point2, Point3, Vector3};

use super::block::block_type::BlockType;
use super::block::Block;
use crate::engine_state::generation::build::ChunkBuild;

/// The width of a chunk in blocks, along the X axis.
pub const CHUNK_WIDTH: i32 = 16;
/// The height of a chunk in blocks, along the Y axis. Chunks span the full world height.
pub const CHUNK_HEIGHT: i32 = 128;
/// The depth of a chunk in blocks, along the Z axis.
pub const CHUNK_DEPTH: i32 = 16;
/// The number of blocks in a single horizontal plane of a chunk.
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_WIDTH * CHUNK_DEPTH;
/// The total number of blocks in a chunk.
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_HEIGHT;

/// Represents a 16x128x16 column of voxel blocks in the world.
///
/// Chunks are the fundamental unit of world data: generation workers fill them
/// stage by stage and the world streams them in and out around the pivot. Each
/// chunk maintains its position in the world, its block data, and the most
/// recent geometry build attached by the world.
pub struct Chunk {
    /// The world coordinate of this chunk's lowest corner. X and Z are
    /// multiples of `CHUNK_WIDTH`/`CHUNK_DEPTH`, Y is always zero.
    pub position: Point3<i32>,

    /// The renderable geometry most recently packaged for this chunk, if any.
    pub build: Option<ChunkBuild>,

    /// The block data in row-major order: X fastest, then Z, then Y.
    blocks: Vec<Block>,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    ///
    /// # Arguments
    /// * `position` - The world coordinates of the new chunk's lowest corner
    ///
    /// # Returns
    /// A new `Chunk` instance filled with air blocks.
    pub fn empty(position: Point3<i32>) -> Self {
        Chunk {
            position,
            build: None,
            blocks: vec![Block::new(BlockType::AIR); CHUNK_SIZE as usize],
        }
    }

    /// Creates a new chunk completely filled with one block type (for testing
    /// and for pre-populated worlds).
    ///
    /// # Arguments
    /// * `position` - The world coordinates of the new chunk's lowest corner
    /// * `block_type` - The block type every cell is filled with
    ///
    /// # Returns
    /// A new `Chunk` filled with the given block type.
    pub fn solid(position: Point3<i32>, block_type: BlockType) -> Self {
        Chunk {
            position,
            build: None,
            blocks: vec![Block::new(block_type); CHUNK_SIZE as usize],
        }
    }

    /// Rebuilds a chunk from a block array, typically decoded from a persisted
    /// chunk record.
    ///
    /// # Arguments
    /// * `position` - The world coordinates of the chunk's lowest corner
    /// * `blocks` - Exactly `CHUNK_SIZE` blocks in row-major order
    ///
    /// # Returns
    /// A new `Chunk` owning the given blocks.
    ///
    /// # Panics
    /// Panics if the block array doesn't hold exactly `CHUNK_SIZE` entries.
    pub fn from_blocks(position: Point3<i32>, blocks: Vec<Block>) -> Self {
        assert_eq!(
            blocks.len(),
            CHUNK_SIZE as usize,
            "chunk at {:?} rebuilt from {} blocks",
            position,
            blocks.len()
        );
        Chunk {
            position,
            build: None,
            blocks,
        }
    }

    /// Checks whether chunk-relative coordinates address a cell inside the chunk.
    ///
    /// # Arguments
    /// * `x` - X coordinate within the chunk
    /// * `y` - Y coordinate within the chunk
    /// * `z` - Z coordinate within the chunk
    ///
    /// # Returns
    /// `true` when the coordinates fall inside the chunk's bounds.
    pub fn contains_local(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_WIDTH).contains(&x) && (0..CHUNK_HEIGHT).contains(&y) && (0..CHUNK_DEPTH).contains(&z)
    }

    /// Computes the row-major array index of a cell.
    ///
    /// # Arguments
    /// * `x` - X coordinate within the chunk
    /// * `y` - Y coordinate within the chunk
    /// * `z` - Z coordinate within the chunk
    ///
    /// # Returns
    /// The index into the block array.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn index_of(x: i32, y: i32, z: i32) -> usize {
        assert!(
            Self::contains_local(x, y, z),
            "block coordinates out of bounds: ({}, {}, {})",
            x,
            y,
            z
        );
        (x + z * CHUNK_WIDTH + y * CHUNK_PLANE_SIZE) as usize
    }

    /// Gets the block at the specified chunk-relative coordinates.
    ///
    /// # Arguments
    /// * `x` - X coordinate within the chunk
    /// * `y` - Y coordinate within the chunk
    /// * `z` - Z coordinate within the chunk
    ///
    /// # Returns
    /// A copy of the block at the specified coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Block {
        self.blocks[Self::index_of(x, y, z)]
    }

    /// Replaces the block at the specified chunk-relative coordinates.
    ///
    /// # Arguments
    /// * `x` - X coordinate within the chunk
    /// * `y` - Y coordinate within the chunk
    /// * `z` - Z coordinate within the chunk
    /// * `block` - The new block value
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn set_block_at(&mut self, x: i32, y: i32, z: i32, block: Block) {
        self.blocks[Self::index_of(x, y, z)] = block;
    }

    /// Returns the whole block array in row-major order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns mutable access to the whole block array in row-major order.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Returns the center of this chunk on the horizontal plane.
    ///
    /// World streaming measures the distance between the pivot and chunk
    /// centers when deciding what to load and evict.
    pub fn center_on_plane(&self) -> Point2<f32> {
        Self::center_of_position(self.position)
    }

    /// Returns the horizontal center of a chunk that has (or would have) the
    /// given position.
    pub fn center_of_position(position: Point3<i32>) -> Point2<f32> {
        Point2::new(
            position.x as f32 + CHUNK_WIDTH as f32 / 2.0,
            position.z as f32 + CHUNK_DEPTH as f32 / 2.0,
        )
    }

    /// Returns the position of the chunk containing a world-space point.
    ///
    /// # Arguments
    /// * `point` - Any point in world space
    ///
    /// # Returns
    /// The chunk position, i.e. the point's X and Z floored to chunk multiples
    /// with Y forced to zero.
    pub fn position_containing(point: Point3<f32>) -> Point3<i32> {
        Point3::new(
            (point.x / CHUNK_WIDTH as f32).floor() as i32 * CHUNK_WIDTH,
            0,
            (point.z / CHUNK_DEPTH as f32).floor() as i32 * CHUNK_DEPTH,
        )
    }

    /// Returns the offsets from a chunk position to its four edge-adjacent
    /// neighbors, in world units.
    ///
    /// These are the neighbors the geometry stage shares boundary planes with.
    pub fn cardinal_neighbor_offsets() -> [Vector3<i32>; 4] {
        [
            Vector3::new(CHUNK_WIDTH, 0, 0),
            Vector3::new(-CHUNK_WIDTH, 0, 0),
            Vector3::new(0, 0, CHUNK_DEPTH),
            Vector3::new(0, 0, -CHUNK_DEPTH),
        ]
    }

    /// Returns the offsets from a chunk position to all eight horizontal
    /// neighbors (edges and corners), in world units.
    ///
    /// These are the neighbors the decoration stage needs landscape data from.
    pub fn horizontal_neighbor_offsets() -> [Vector3<i32>; 8] {
        [
            Vector3::new(-CHUNK_WIDTH, 0, -CHUNK_DEPTH),
            Vector3::new(0, 0, -CHUNK_DEPTH),
            Vector3::new(CHUNK_WIDTH, 0, -CHUNK_DEPTH),
            Vector3::new(-CHUNK_WIDTH, 0, 0),
            Vector3::new(CHUNK_WIDTH, 0, 0),
            Vector3::new(-CHUNK_WIDTH, 0, CHUNK_DEPTH),
            Vector3::new(0, 0, CHUNK_DEPTH),
            Vector3::new(CHUNK_WIDTH, 0, CHUNK_DEPTH),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_round_trips_through_every_cell() {
        let mut seen = vec![false; CHUNK_SIZE as usize];
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_DEPTH {
                for x in 0..CHUNK_WIDTH {
                    let index = Chunk::index_of(x, y, z);
                    assert!(!seen[index], "index {} hit twice", index);
                    seen[index] = true;
                }
            }
        }
        assert!(seen.into_iter().all(|hit| hit));
    }

    #[test]
    fn blocks_read_back_what_was_written() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.set_block_at(3, 100, 12, Block::new(BlockType::WOOD));
        assert_eq!(chunk.block_at(3, 100, 12).block_type(), BlockType::WOOD);
        assert_eq!(chunk.block_at(3, 99, 12).block_type(), BlockType::AIR);
    }

    #[test]
    #[should_panic(expected = "block coordinates out of bounds")]
    fn out_of_bounds_reads_panic() {
        let chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.block_at(-1, 0, 0);
    }

    #[test]
    fn position_containing_floors_negative_coordinates() {
        let position = Chunk::position_containing(Point3::new(-0.5, 64.0, 31.9));
        assert_eq!(position, Point3::new(-16, 0, 16));

        let origin = Chunk::position_containing(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(origin, Point3::new(0, 0, 0));
    }

    #[test]
    fn neighbor_offsets_stay_on_the_horizontal_plane() {
        assert_eq!(Chunk::horizontal_neighbor_offsets().len(), 8);
        for offset in Chunk::horizontal_neighbor_offsets() {
            assert_eq!(offset.y, 0);
            assert_ne!(offset, Vector3::new(0, 0, 0));
        }
        for offset in Chunk::cardinal_neighbor_offsets() {
            assert!(offset.x == 0 || offset.z == 0);
        }
    }

    #[test]
    #[should_panic(expected = "rebuilt from")]
    fn from_blocks_rejects_truncated_arrays() {
        Chunk::from_blocks(Point3::new(0, 0, 0), vec![Block::new(BlockType::AIR); 7]);
    }
}
