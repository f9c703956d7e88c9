//! # Ambient Occlusion Module
//!
//! Computes per-vertex ambient occlusion for block faces. Each corner of a
//! face looks at three cells in the plane the face opens onto: the two cells
//! sharing an edge with the corner and the cell diagonally across it. Only
//! opaque cells occlude; cells outside the reachable view (past an unshared
//! boundary) count as open.

use cgmath::{Point3, Vector3};

use super::face_data;
use super::BlockView;
use crate::engine_state::voxels::block::block_side::BlockSide;

/// Computes the occlusion level for each corner of one block face.
///
/// # Arguments
/// * `view` - The block view the face is being meshed against
/// * `position` - The cell owning the face, in view-local coordinates
/// * `side` - The face being meshed
///
/// # Returns
/// Four occlusion levels in `0.0..=1.0`, in template corner order. A corner
/// whose two edge cells are both occupied is fully occluded regardless of the
/// diagonal; otherwise the level is the occupied fraction of the three cells.
pub fn calculate(view: &BlockView, position: Point3<i32>, side: BlockSide) -> [f32; 4] {
    let base = position + side.offset();
    let (u_axis, v_axis) = side.tangent_axes();
    let template = face_data::vertex_template(side);

    let mut levels = [0.0f32; 4];
    for (index, level) in levels.iter_mut().enumerate() {
        let du = corner_direction(template[3 * index + u_axis]);
        let dv = corner_direction(template[3 * index + v_axis]);
        let edge_u = occludes(view, base + unit(u_axis) * du);
        let edge_v = occludes(view, base + unit(v_axis) * dv);
        let corner = occludes(view, base + unit(u_axis) * du + unit(v_axis) * dv);
        *level = occlusion_level(edge_u, edge_v, corner);
    }
    levels
}

fn occlusion_level(edge_u: bool, edge_v: bool, corner: bool) -> f32 {
    if edge_u && edge_v {
        1.0
    } else {
        (edge_u as u32 + edge_v as u32 + corner as u32) as f32 / 3.0
    }
}

fn occludes(view: &BlockView, position: Point3<i32>) -> bool {
    view.block_at(position)
        .map(|block| block.meta_type().is_opaque())
        .unwrap_or(false)
}

fn corner_direction(coordinate: f32) -> i32 {
    if coordinate > 0.5 {
        1
    } else {
        -1
    }
}

fn unit(axis: usize) -> Vector3<i32> {
    match axis {
        0 => Vector3::new(1, 0, 0),
        1 => Vector3::new(0, 1, 0),
        2 => Vector3::new(0, 0, 1),
        _ => panic!("axis index out of range: {}", axis),
    }
}
