//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the
//! meta-type classification the generation pipeline is built around. The meta type
//! (empty, opaque, transparent, partially transparent, diagonal) decides which
//! geometry batch a block lands in and whether faces against it are culled.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// Each variant represents a distinct type of block with its own properties
/// and behavior. The `FromPrimitive` derive allows conversion from integers,
/// which is used when decoding persisted chunk records.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// An air block, which is non-solid and invisible.
    AIR,

    /// A stone block forming the base of every landscape column.
    STONE,

    /// A basic dirt block, used for the surface layers of dirt biomes.
    DIRT,

    /// A grass-topped dirt block with different textures on top and sides.
    /// Only appears above the water line.
    DIRT_WITH_GRASS,

    /// A water block filling columns up to the water line.
    WATER,

    /// A wooden trunk block placed by tree decoration.
    WOOD,

    /// A leaf block forming tree canopies.
    LEAVES,

    /// A blue flower rendered as two crossed quads inside its cell.
    BLUE_FLOWER,
}

/// Classifies block types by how they interact with light and geometry.
///
/// The meta type drives both face culling and batch selection during the
/// geometry stage, and decides whether a cell occludes its neighbors for
/// ambient occlusion and light propagation.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockMetaType {
    /// Nothing is rendered and nothing is occluded.
    EMPTY,

    /// A full solid cube that hides everything behind it.
    OPAQUE,

    /// A see-through full cube, such as water.
    TRANSPARENT,

    /// A full cube with holes in its texture, such as leaves.
    PARTIALLY_TRANSPARENT,

    /// Crossed quads drawn inside the cell rather than on its faces.
    DIAGONAL,
}

/// Static map resolving block names from settings files to block types.
///
/// Keys match the lower-case names used in `settings.json`.
pub static BLOCK_TYPES_BY_NAME: phf::Map<&'static str, BlockType> = phf::phf_map! {
    "air" => BlockType::AIR,
    "stone" => BlockType::STONE,
    "dirt" => BlockType::DIRT,
    "dirt_with_grass" => BlockType::DIRT_WITH_GRASS,
    "water" => BlockType::WATER,
    "wood" => BlockType::WOOD,
    "leaves" => BlockType::LEAVES,
    "blue_flower" => BlockType::BLUE_FLOWER,
};

impl BlockType {
    /// Converts a `BlockTypeSize` to a `BlockType`.
    ///
    /// This is typically used when deserializing block data or converting
    /// from the compact storage format to the rich enum type.
    ///
    /// # Arguments
    /// * `btype` - The block type as a `BlockTypeSize`
    ///
    /// # Returns
    /// The corresponding `BlockType`
    ///
    /// # Panics
    /// Panics if the input value doesn't correspond to a valid `BlockType`.
    pub fn get_block_type_from_int(btype: BlockTypeSize) -> Self {
        let btype_option = num::FromPrimitive::from_u8(btype);
        btype_option.unwrap()
    }

    /// Converts a `BlockTypeSize` to a `BlockType`, rejecting unknown values.
    ///
    /// Used when decoding chunk records from the store, where a corrupt file
    /// must be reported as a miss rather than abort the engine.
    ///
    /// # Arguments
    /// * `btype` - The block type as a `BlockTypeSize`
    ///
    /// # Returns
    /// `Some(BlockType)` for valid values, `None` otherwise.
    pub fn try_from_int(btype: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(btype)
    }

    /// Resolves a block type from its settings-file name.
    ///
    /// # Arguments
    /// * `name` - The lower-case block name, e.g. `"dirt_with_grass"`
    ///
    /// # Returns
    /// `Some(BlockType)` for known names, `None` otherwise.
    pub fn from_name(name: &str) -> Option<Self> {
        BLOCK_TYPES_BY_NAME.get(name).copied()
    }

    /// Returns the meta type this block type is classified as.
    pub fn meta_type(self) -> BlockMetaType {
        match self {
            BlockType::AIR => BlockMetaType::EMPTY,
            BlockType::STONE | BlockType::DIRT | BlockType::DIRT_WITH_GRASS | BlockType::WOOD => {
                BlockMetaType::OPAQUE
            }
            BlockType::WATER => BlockMetaType::TRANSPARENT,
            BlockType::LEAVES => BlockMetaType::PARTIALLY_TRANSPARENT,
            BlockType::BLUE_FLOWER => BlockMetaType::DIAGONAL,
        }
    }
}

impl BlockMetaType {
    /// Returns `true` for blocks that render nothing.
    pub fn is_empty(self) -> bool {
        self == BlockMetaType::EMPTY
    }

    /// Returns `true` for full solid cubes.
    ///
    /// Opaque cells are the only ones that occlude their neighbors for
    /// ambient occlusion and stop sky light.
    pub fn is_opaque(self) -> bool {
        self == BlockMetaType::OPAQUE
    }

    /// Returns `true` for see-through full cubes such as water.
    pub fn is_transparent(self) -> bool {
        self == BlockMetaType::TRANSPARENT
    }

    /// Returns `true` for blocks collected by the partially transparent batch.
    ///
    /// Diagonal blocks count as partially transparent here: they are drawn in
    /// the same batch and faces against them are never culled.
    pub fn is_partially_transparent(self) -> bool {
        matches!(
            self,
            BlockMetaType::PARTIALLY_TRANSPARENT | BlockMetaType::DIAGONAL
        )
    }

    /// Returns `true` for blocks rendered as crossed quads.
    pub fn is_diagonal(self) -> bool {
        self == BlockMetaType::DIAGONAL
    }

    /// Returns `true` when a neighbor of this meta type lets any light or
    /// scenery show through, i.e. it is transparent or partially transparent.
    pub fn is_transparent_or_partially_transparent(self) -> bool {
        self.is_transparent() || self.is_partially_transparent()
    }
}

// Implementation of PHF (Perfect Hash Function) traits for BlockType.
// These are used internally by the `phf` crate for static hash maps.

/// Implements `FmtConst` to allow formatting `BlockType` in const contexts.
/// This is used by the `phf` crate for compile-time map generation.
impl phf_shared::FmtConst for BlockType {
    fn fmt_const(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockType::{:?}", self)
    }
}

/// Implements `PhfHash` to provide a custom hashing strategy for `BlockType`.
/// This ensures that the hash matches the underlying integer representation.
impl phf_shared::PhfHash for BlockType {
    #[inline]
    fn phf_hash<H: Hasher>(&self, state: &mut H) {
        (*self as BlockTypeSize).hash(state);
    }
}

/// Implements `PhfBorrow` to allow using `BlockType` as a key in PHF maps.
/// This enables efficient lookups in compile-time generated maps.
impl phf_shared::PhfBorrow<BlockType> for BlockType {
    fn borrow(&self) -> &BlockType {
        self
    }
}
