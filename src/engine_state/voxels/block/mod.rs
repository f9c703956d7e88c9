//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, block face handling, and the per-cell block
//! structure chunks are filled with.

use block_type::{BlockMetaType, BlockType};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage and serialization of block data.
pub type BlockTypeSize = u8;

/// The highest block light level. Sky-lit cells carry this value.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// The light level assumed for neighbors beyond the loaded world, so faces
/// meshed at the world boundary come out fully lit.
pub const DEFAULT_LIGHT_LEVEL: u8 = MAX_LIGHT_LEVEL;

/// The lowest value a vertex light may take after clamping, keeping fully
/// dark cells from rendering pitch black.
pub const MIN_VERTEX_LIGHT: f32 = 2.0;

/// The highest value a vertex light may take after clamping.
pub const MAX_VERTEX_LIGHT: f32 = MAX_LIGHT_LEVEL as f32;

/// Represents a single voxel block in the world.
///
/// This is a lightweight structure that stores only the essential block data:
/// the type and the block light level computed by the light stage. The actual
/// block properties are looked up from the block type.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute ensures a consistent memory layout so chunk
/// contents can be treated as plain bytes when snapshotting and persisting.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq, Eq)]
pub struct Block {
    /// The type of this block, encoded as a `BlockTypeSize` for compact storage.
    pub block_type: BlockTypeSize,

    /// The block light level in `0..=MAX_LIGHT_LEVEL`, filled in by the
    /// light generation stage. Freshly placed blocks carry zero.
    pub light_level: u8,
}

impl Block {
    /// Creates a new, unlit block of the specified type.
    ///
    /// # Arguments
    /// * `block_type` - The type of block to create
    ///
    /// # Returns
    /// A new `Block` instance with the specified type and zero light.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type as BlockTypeSize,
            light_level: 0,
        }
    }

    /// Returns the rich enum type of this block.
    ///
    /// # Panics
    /// Panics if the stored type byte doesn't correspond to a valid
    /// `BlockType`, which only happens when memory is corrupted: persisted
    /// records are validated before blocks are built from them.
    pub fn block_type(self) -> BlockType {
        BlockType::get_block_type_from_int(self.block_type)
    }

    /// Returns the meta type of this block, shorthand for
    /// `block.block_type().meta_type()`.
    pub fn meta_type(self) -> BlockMetaType {
        self.block_type().meta_type()
    }
}
