//! # Texture Atlas Module
//!
//! This module maps block types and faces to tiles on the shared texture atlas.
//! The atlas is a square texture split into a 16x16 grid of tiles; the geometry
//! stage turns tile coordinates into final UVs by scaling with the tile size and
//! adding the per-corner offsets of each quad.

use cgmath::Vector2;

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;

/// The number of tiles along each side of the texture atlas.
pub const ATLAS_TILES_PER_SIDE: i32 = 16;

/// Maps each block type to its tile coordinates for each face.
///
/// The outer array is indexed by `BlockType` as a `usize`.
/// The inner array contains one `(column, row)` tile per face in the order:
/// [Front, Back, Bottom, Top, Left, Right].
///
/// Rows count from the bottom of the atlas, matching UV space.
static BLOCK_TYPE_TO_TILE_COORDINATES: [[(i32, i32); 6]; 8] = [
    // AIR is never meshed; the row only keeps indices aligned.
    [(0, 0), (0, 0), (0, 0), (0, 0), (0, 0), (0, 0)],
    // STONE (all sides share one tile)
    [(1, 15), (1, 15), (1, 15), (1, 15), (1, 15), (1, 15)],
    // DIRT (all sides share one tile)
    [(2, 15), (2, 15), (2, 15), (2, 15), (2, 15), (2, 15)],
    // DIRT_WITH_GRASS (grassy sides, grass top, plain dirt bottom)
    [(3, 15), (3, 15), (2, 15), (12, 3), (3, 15), (3, 15)],
    // WATER
    [(13, 3), (13, 3), (13, 3), (13, 3), (13, 3), (13, 3)],
    // WOOD (bark on the sides, rings on both ends)
    [(4, 14), (4, 14), (5, 14), (5, 14), (4, 14), (4, 14)],
    // LEAVES
    [(5, 12), (5, 12), (5, 12), (5, 12), (5, 12), (5, 12)],
    // BLUE_FLOWER (both crossed quads share one tile)
    [(12, 15), (12, 15), (12, 15), (12, 15), (12, 15), (12, 15)],
];

/// Returns the atlas tile a block face is textured with.
///
/// # Arguments
/// * `block_type` - The type of the block being meshed
/// * `side` - The face being meshed
///
/// # Returns
/// The tile coordinates as `(column, row)` counted from the bottom-left
/// corner of the atlas.
pub fn tile_coordinates(block_type: BlockType, side: BlockSide) -> Vector2<i32> {
    let (column, row) = BLOCK_TYPE_TO_TILE_COORDINATES[block_type as usize][side as usize];
    Vector2::new(column, row)
}

/// Returns the size of one atlas tile in UV space.
pub fn tile_size() -> Vector2<f32> {
    Vector2::new(
        1.0 / ATLAS_TILES_PER_SIDE as f32,
        1.0 / ATLAS_TILES_PER_SIDE as f32,
    )
}

/// Transforms a quad corner into final atlas UV coordinates.
///
/// # Arguments
/// * `tile` - The tile returned by [`tile_coordinates`]
/// * `corner` - The corner offset within the tile, each component in `0..=1`
///
/// # Returns
/// The `[u, v]` coordinates into the atlas texture.
pub fn to_atlas_uv(tile: Vector2<i32>, corner: Vector2<f32>) -> [f32; 2] {
    let size = tile_size();
    [
        size.x * (tile.x as f32 + corner.x),
        size.y * (tile.y as f32 + corner.y),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grass_blocks_use_different_tiles_per_face() {
        let top = tile_coordinates(BlockType::DIRT_WITH_GRASS, BlockSide::TOP);
        let bottom = tile_coordinates(BlockType::DIRT_WITH_GRASS, BlockSide::BOTTOM);
        let side = tile_coordinates(BlockType::DIRT_WITH_GRASS, BlockSide::LEFT);
        assert_eq!(top, Vector2::new(12, 3));
        assert_eq!(bottom, tile_coordinates(BlockType::DIRT, BlockSide::TOP));
        assert_eq!(side, Vector2::new(3, 15));
    }

    #[test]
    fn wood_ends_differ_from_bark() {
        let bark = tile_coordinates(BlockType::WOOD, BlockSide::FRONT);
        let rings = tile_coordinates(BlockType::WOOD, BlockSide::TOP);
        assert_ne!(bark, rings);
        assert_eq!(rings, tile_coordinates(BlockType::WOOD, BlockSide::BOTTOM));
    }

    #[test]
    fn uvs_stay_inside_the_atlas() {
        for block_type in [
            BlockType::STONE,
            BlockType::DIRT_WITH_GRASS,
            BlockType::WATER,
            BlockType::LEAVES,
            BlockType::BLUE_FLOWER,
        ] {
            for side in BlockSide::all() {
                let tile = tile_coordinates(block_type, side);
                for corner in [
                    Vector2::new(0.0, 0.0),
                    Vector2::new(1.0, 0.0),
                    Vector2::new(0.0, 1.0),
                    Vector2::new(1.0, 1.0),
                ] {
                    let [u, v] = to_atlas_uv(tile, corner);
                    assert!((0.0..=1.0).contains(&u), "u out of range: {}", u);
                    assert!((0.0..=1.0).contains(&v), "v out of range: {}", v);
                }
            }
        }
    }
}
