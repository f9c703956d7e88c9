//! # Face Data Module
//!
//! Static vertex, UV and index templates for the quads the geometry stage
//! emits. Every quad lists its corners in the order lower-left, lower-right,
//! upper-left, upper-right as seen from outside the face, and the shared index
//! template turns those four corners into two counter-clockwise triangles.

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Index template for one quad, relative to its first vertex.
///
/// Appending a quad adds four vertices; the triangles `(0, 1, 3)` and
/// `(0, 3, 2)` cover it with counter-clockwise winding.
pub const QUAD_INDEX_TEMPLATE: [u32; 6] = [0, 1, 3, 0, 3, 2];

/// Per-corner UV offsets inside one atlas tile, in template corner order.
pub const QUAD_UV_TEMPLATE: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

/// Vertices of the first crossed quad of a diagonal block, running between
/// the cell's `(0, z0)` and `(1, z1)` corners.
pub const FIRST_DIAGONAL_VERTICES: [f32; 12] = [
    0.0, 0.0, 0.0, //
    1.0, 0.0, 1.0, //
    0.0, 1.0, 0.0, //
    1.0, 1.0, 1.0, //
];

/// Vertices of the second crossed quad of a diagonal block, running between
/// the cell's `(1, z0)` and `(0, z1)` corners.
pub const SECOND_DIAGONAL_VERTICES: [f32; 12] = [
    1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, //
    1.0, 1.0, 0.0, //
    0.0, 1.0, 1.0, //
];

const FRONT_VERTICES: [f32; 12] = [
    0.0, 0.0, 1.0, //
    1.0, 0.0, 1.0, //
    0.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, //
];

const BACK_VERTICES: [f32; 12] = [
    1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, //
    1.0, 1.0, 0.0, //
    0.0, 1.0, 0.0, //
];

const BOTTOM_VERTICES: [f32; 12] = [
    0.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, //
    1.0, 0.0, 1.0, //
];

const TOP_VERTICES: [f32; 12] = [
    0.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, //
    0.0, 1.0, 0.0, //
    1.0, 1.0, 0.0, //
];

const LEFT_VERTICES: [f32; 12] = [
    0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, //
    0.0, 1.0, 0.0, //
    0.0, 1.0, 1.0, //
];

const RIGHT_VERTICES: [f32; 12] = [
    1.0, 0.0, 1.0, //
    1.0, 0.0, 0.0, //
    1.0, 1.0, 1.0, //
    1.0, 1.0, 0.0, //
];

/// Returns the unit-cube vertex template for a block face.
///
/// # Arguments
/// * `side` - The face being meshed
///
/// # Returns
/// Twelve floats, four corners of three components each, in template
/// corner order.
pub fn vertex_template(side: BlockSide) -> &'static [f32; 12] {
    match side {
        BlockSide::FRONT => &FRONT_VERTICES,
        BlockSide::BACK => &BACK_VERTICES,
        BlockSide::BOTTOM => &BOTTOM_VERTICES,
        BlockSide::TOP => &TOP_VERTICES,
        BlockSide::LEFT => &LEFT_VERTICES,
        BlockSide::RIGHT => &RIGHT_VERTICES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn corner(template: &[f32; 12], index: usize) -> Vector3<f32> {
        Vector3::new(
            template[3 * index],
            template[3 * index + 1],
            template[3 * index + 2],
        )
    }

    #[test]
    fn face_templates_lie_on_their_own_plane() {
        for side in BlockSide::all() {
            let offset = side.offset();
            let template = vertex_template(side);
            for index in 0..4 {
                let vertex = corner(template, index);
                // The coordinate along the face normal is 1 for positive
                // sides and 0 for negative sides.
                let along_normal = vertex.x * offset.x.abs() as f32
                    + vertex.y * offset.y.abs() as f32
                    + vertex.z * offset.z.abs() as f32;
                let expected = if offset.x + offset.y + offset.z > 0 { 1.0 } else { 0.0 };
                assert_eq!(along_normal, expected, "side {:?} corner {}", side, index);
            }
        }
    }

    #[test]
    fn both_triangles_wind_counter_clockwise() {
        for side in BlockSide::all() {
            let template = vertex_template(side);
            let normal = side.offset().map(|c| c as f32);
            for triangle in QUAD_INDEX_TEMPLATE.chunks(3) {
                let a = corner(template, triangle[0] as usize);
                let b = corner(template, triangle[1] as usize);
                let c = corner(template, triangle[2] as usize);
                let winding = (b - a).cross(c - b);
                assert!(
                    winding.dot(normal) > 0.0,
                    "triangle {:?} of side {:?} winds the wrong way",
                    triangle,
                    side
                );
            }
        }
    }

    #[test]
    fn diagonal_quads_span_opposite_cell_corners() {
        let first_low = corner(&FIRST_DIAGONAL_VERTICES, 0);
        let first_high = corner(&FIRST_DIAGONAL_VERTICES, 3);
        assert_eq!(first_low, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(first_high, Vector3::new(1.0, 1.0, 1.0));

        let second_low = corner(&SECOND_DIAGONAL_VERTICES, 0);
        let second_high = corner(&SECOND_DIAGONAL_VERTICES, 3);
        assert_eq!(second_low, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(second_high, Vector3::new(0.0, 1.0, 1.0));
    }
}
