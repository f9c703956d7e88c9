//! # Block Side Module
//!
//! This module defines the different faces/sides of a voxel block.
//! The generation pipeline uses sides to address neighbor cells during face
//! culling, to pick vertex templates during meshing, and to name the boundary
//! planes neighbors share with each other.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Each variant corresponds to a specific face and is assigned a unique integer value
/// for efficient storage and array indexing. The values match the order of the
/// vertex template tables used by the geometry stage.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// This is useful for iterating over all possible faces of a block.
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    ///
    /// # Returns
    /// An array containing all `BlockSide` variants.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Returns the four sides on the horizontal plane.
    ///
    /// These are the sides chunks can share boundary planes across, since
    /// chunks span the full world height and only adjoin horizontally.
    pub fn cardinals() -> [BlockSide; 4] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Returns the unit offset from a cell to the neighbor this side faces.
    ///
    /// # Returns
    /// A unit vector in cell coordinates pointing out of the face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Returns the side facing the opposite direction.
    ///
    /// Used when mapping a neighbor's outgoing face onto the receiving
    /// chunk's boundary plane slot.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
        }
    }

    /// Returns the indices of the two coordinate axes spanning this face.
    ///
    /// The axes are numbered 0 = X, 1 = Y, 2 = Z and returned in ascending
    /// order. Ambient occlusion walks the occluder cells along these axes.
    pub fn tangent_axes(self) -> (usize, usize) {
        match self {
            BlockSide::FRONT | BlockSide::BACK => (0, 1),
            BlockSide::BOTTOM | BlockSide::TOP => (0, 2),
            BlockSide::LEFT | BlockSide::RIGHT => (1, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_each_side_exactly_once() {
        let all = BlockSide::all();
        assert_eq!(all.len(), 6);
        for (index, side) in all.into_iter().enumerate() {
            assert_eq!(side as usize, index);
        }
    }

    #[test]
    fn opposite_sides_cancel_out() {
        for side in BlockSide::all() {
            assert_eq!(side.opposite().opposite(), side);
            assert_eq!(side.offset() + side.opposite().offset(), Vector3::new(0, 0, 0));
        }
    }

    #[test]
    fn tangent_axes_exclude_the_normal_axis() {
        for side in BlockSide::all() {
            let offset = side.offset();
            let (u, v) = side.tangent_axes();
            assert_eq!(offset[u], 0);
            assert_eq!(offset[v], 0);
            assert_ne!(u, v);
        }
    }

    #[test]
    fn cardinals_stay_on_the_horizontal_plane() {
        for side in BlockSide::cardinals() {
            assert_eq!(side.offset().y, 0);
        }
    }
}
