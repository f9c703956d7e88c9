//! # Voxel Data Module
//!
//! This module contains the voxel data model the generation pipeline operates
//! on: block types and their face metadata, fixed-size chunks of blocks, the
//! streamed world of chunks, and the texture atlas lookup the geometry stage
//! samples from.
//!
//! ## Architecture
//!
//! * **Block**: one voxel cell, its type and its published light level
//! * **Chunk**: a 16x128x16 column of blocks keyed by its world position
//! * **World**: the set of live chunks streamed in around the pivot
//! * **Texture atlas**: pure block-face to atlas-tile lookup
//!
//! Generation itself lives in [`crate::engine_state::generation`]; this module
//! only defines the data being generated.

pub mod block;
pub mod chunk;
pub mod texture_atlas;
pub mod world;
