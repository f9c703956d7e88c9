//! # Chunk Build Module
//!
//! This module defines the immutable output of the generation pipeline: the
//! interleaved vertex/index models a renderer can upload directly. A build
//! bundles one model per render pass (opaque, transparent, partially
//! transparent) behind shared handles, so the chunk, the renderer and the
//! packaging worker can all hold the same finished geometry cheaply.

use std::sync::Arc;

/// A single interleaved vertex of a chunk model.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute and the `bytemuck` derives guarantee the vertex
/// can be reinterpreted as plain bytes for GPU upload without copying.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    /// Chunk-local position of the vertex.
    pub position: [f32; 3],

    /// Texture atlas coordinates of the vertex.
    pub tex_coords: [f32; 2],

    /// Vertex light in block-light units, already clamped and discounted by
    /// ambient occlusion.
    pub light: f32,
}

/// One finished, renderable mesh: interleaved vertices plus `u32` indices.
#[derive(Debug, Default)]
pub struct ChunkModel {
    /// The interleaved vertex data.
    pub vertices: Vec<ModelVertex>,

    /// Triangle indices into `vertices`, two triangles per quad.
    pub indices: Vec<u32>,
}

impl ChunkModel {
    /// Returns `true` when the model has nothing to draw.
    ///
    /// Empty models are valid outputs: a chunk with no water produces an
    /// empty transparent model, for example.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the vertex data as plain bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the index data as plain bytes for buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// The complete renderable output for one chunk.
///
/// A build is produced exactly once per generation worker, when its chunk
/// reaches the final pipeline status. It holds shared handles to the three
/// per-pass models built by the model task.
#[derive(Clone, Debug)]
pub struct ChunkBuild {
    /// Geometry of fully opaque blocks.
    pub model_for_opaque: Arc<ChunkModel>,

    /// Geometry of transparent blocks such as water.
    pub model_for_transparent: Arc<ChunkModel>,

    /// Geometry of partially transparent and diagonal blocks.
    pub model_for_partially_transparent: Arc<ChunkModel>,
}
