//! # World Module
//!
//! This module provides the `World` struct which manages the set of live
//! chunks around a streaming pivot. It decides which chunks exist, hands
//! newly needed ones to the generation director, and serializes evicted ones
//! to the chunk store.
//!
//! ## Streaming
//!
//! Every update runs three passes against the pivot position:
//!
//! 1. The chunk containing the pivot is created if it is missing.
//! 2. Every live chunk tries to create its four edge-adjacent neighbors;
//!    a candidate is created only when its center lies within the caching
//!    radius. The loaded area therefore grows one ring per tick.
//! 3. Every live chunk whose center has drifted beyond the caching radius is
//!    evicted: its worker is retired and its blocks are saved to the store.
//!
//! ## Persistence
//!
//! Evicted chunks are saved only when their terrain is complete, meaning
//! their worker got at least through the decoration stage or had already been
//! dropped. A chunk retired earlier is discarded instead; saving it would
//! restore it later as finished terrain and its decorations would never run.
//! Dropped chunks cost nothing, generation is deterministic per seed.

use std::collections::HashMap;

use cgmath::{MetricSpace, Point2, Point3};
use log::{debug, warn};

use crate::core::MtResource;
use crate::engine_state::generation::build::ChunkBuild;
use crate::engine_state::generation::director::GenerationDirector;
use crate::engine_state::generation::GenerationStatus;
use crate::engine_state::settings::WorldSettings;
use crate::engine_state::storage::ChunkStore;
use crate::engine_state::voxels::chunk::Chunk;

/// The set of live chunks streamed in around the pivot.
///
/// Chunks are stored behind shared thread-safe handles so generation jobs can
/// read them while the driver thread keeps updating the map itself.
pub struct World {
    /// A mapping from chunk positions to chunk data.
    pub chunks: HashMap<Point3<i32>, MtResource<Chunk>>,

    store: ChunkStore,
    caching_radius: f32,
}

impl World {
    /// Creates an empty world whose store and streaming range follow the
    /// given settings.
    pub fn new(settings: &WorldSettings) -> Self {
        World {
            chunks: HashMap::new(),
            store: ChunkStore::new(settings.store_capacity, settings.store_directory.clone()),
            caching_radius: settings.caching_radius,
        }
    }

    /// Streams chunks in and out around the pivot.
    ///
    /// # Arguments
    /// * `pivot` - The world position distances are measured from
    /// * `director` - Receives a worker for every created chunk and retires
    ///   the workers of evicted ones
    pub fn update(&mut self, pivot: Point3<f32>, director: &mut GenerationDirector) {
        let pivot_chunk = Chunk::position_containing(pivot);
        if !self.has_chunk(pivot_chunk) {
            self.create_chunk(pivot_chunk, director);
        }

        let live: Vec<Point3<i32>> = self.chunks.keys().copied().collect();
        for position in live {
            for offset in Chunk::cardinal_neighbor_offsets() {
                self.create_chunk_if_needed(position + offset, pivot, director);
            }
        }

        let live: Vec<Point3<i32>> = self.chunks.keys().copied().collect();
        for position in live {
            self.destroy_chunk_if_needed(position, pivot, director);
        }
    }

    /// Returns `true` when a chunk is live at `position`.
    pub fn has_chunk(&self, position: Point3<i32>) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Retrieves a shared handle to the chunk at `position`, if it is live.
    pub fn get_chunk_at(&self, position: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&position).cloned()
    }

    /// Attaches a finished build to its chunk.
    ///
    /// A build whose chunk was evicted while the pipeline still ran is
    /// dropped with a warning; the chunk will be rebuilt if it ever streams
    /// back in.
    pub fn attach_build(&mut self, position: Point3<i32>, build: ChunkBuild) {
        match self.chunks.get(&position) {
            Some(chunk) => chunk.get_mut().build = Some(build),
            None => warn!("Dropping a build for the evicted chunk at {:?}", position),
        }
    }

    /// Evicts every chunk and flushes the store to disk.
    ///
    /// # Arguments
    /// * `director` - Retires the remaining workers; the usual save rule
    ///   applies to each chunk
    pub fn finish(&mut self, director: &mut GenerationDirector) {
        let live: Vec<Point3<i32>> = self.chunks.keys().copied().collect();
        for position in live {
            self.destroy_chunk(position, director);
        }
        self.store.flush();
    }

    fn is_within_caching_radius(&self, pivot: Point3<f32>, position: Point3<i32>) -> bool {
        let pivot_on_plane = Point2::new(pivot.x, pivot.z);
        let center = Chunk::center_of_position(position);
        center.distance2(pivot_on_plane) <= self.caching_radius * self.caching_radius
    }

    fn create_chunk_if_needed(
        &mut self,
        position: Point3<i32>,
        pivot: Point3<f32>,
        director: &mut GenerationDirector,
    ) {
        if self.has_chunk(position) || !self.is_within_caching_radius(pivot, position) {
            return;
        }
        self.create_chunk(position, director);
    }

    fn create_chunk(&mut self, position: Point3<i32>, director: &mut GenerationDirector) {
        let (chunk, restored) = match self.store.load(position) {
            Some(chunk) => (chunk, true),
            None => (Chunk::empty(position), false),
        };
        debug!(
            "Creating chunk at {:?} ({})",
            position,
            if restored { "restored" } else { "fresh" }
        );
        let handle = MtResource::new(chunk);
        self.chunks.insert(position, handle.clone());
        director.create_worker(handle, !restored);

        // Finished neighbors got meshed against an end-of-world boundary.
        // Re-activating them re-runs their light and geometry against the new
        // chunk, and also lets its decoration preconditions see live workers.
        for offset in Chunk::horizontal_neighbor_offsets() {
            let neighbor_position = position + offset;
            if director.have_worker(neighbor_position) {
                continue;
            }
            if let Some(neighbor) = self.chunks.get(&neighbor_position) {
                director.create_worker(neighbor.clone(), false);
            }
        }
    }

    fn destroy_chunk_if_needed(
        &mut self,
        position: Point3<i32>,
        pivot: Point3<f32>,
        director: &mut GenerationDirector,
    ) {
        if self.is_within_caching_radius(pivot, position) {
            return;
        }
        self.destroy_chunk(position, director);
    }

    fn destroy_chunk(&mut self, position: Point3<i32>, director: &mut GenerationDirector) {
        let Some(chunk) = self.chunks.remove(&position) else {
            return;
        };
        let terrain_complete = match director.retire_worker(position) {
            None => true,
            Some(status) => status >= GenerationStatus::GeneratedDecorations,
        };
        if terrain_complete {
            self.store.save(&chunk.get());
        } else {
            debug!(
                "Discarding chunk at {:?}; its terrain was still incomplete",
                position
            );
        }
    }
}
