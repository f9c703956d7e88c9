//! # Chunk Storage Module
//!
//! This module keeps evicted chunks around so revisited terrain comes back
//! exactly as the player left it. Recently evicted chunks sit in a bounded
//! in-memory cache; when the cache overflows, the least recently used record
//! spills to a JSON file if a store directory is configured, and is simply
//! dropped otherwise (regeneration is deterministic, so dropping only costs
//! time, never content).
//!
//! Light levels are not persisted. Restored chunks re-run the light stage,
//! which is cheap and avoids stale light when neighbors changed.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use cgmath::Point3;
use log::warn;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::Block;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_SIZE};

/// A chunk serialized for storage: its position and one block type byte per
/// cell.
#[derive(Serialize, Deserialize)]
pub struct ChunkRecord {
    /// The chunk's world position.
    pub position: [i32; 3],

    /// Block type bytes in block array order.
    pub blocks: Vec<u8>,
}

impl ChunkRecord {
    /// Captures a chunk's contents.
    pub fn from_chunk(chunk: &Chunk) -> Self {
        ChunkRecord {
            position: [chunk.position.x, chunk.position.y, chunk.position.z],
            blocks: chunk.blocks().iter().map(|block| block.block_type).collect(),
        }
    }

    /// Rebuilds the chunk this record captured, unlit.
    ///
    /// # Returns
    /// `None` if the record is the wrong size or names unknown block types;
    /// damaged records are reported and treated as missing.
    pub fn into_chunk(self) -> Option<Chunk> {
        let position = Point3::new(self.position[0], self.position[1], self.position[2]);
        if self.blocks.len() != CHUNK_SIZE as usize {
            warn!(
                "Chunk record at {:?} holds {} blocks instead of {}; discarding it",
                position,
                self.blocks.len(),
                CHUNK_SIZE
            );
            return None;
        }
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for byte in &self.blocks {
            let Some(block_type) = BlockType::try_from_int(*byte) else {
                warn!(
                    "Chunk record at {:?} names unknown block type {}; discarding it",
                    position, byte
                );
                return None;
            };
            blocks.push(Block::new(block_type));
        }
        Some(Chunk::from_blocks(position, blocks))
    }
}

/// Bounded keeper of evicted chunks, with optional disk spill.
pub struct ChunkStore {
    cache: LruCache<Point3<i32>, ChunkRecord>,
    directory: Option<PathBuf>,
}

impl ChunkStore {
    /// Creates a store holding up to `capacity` chunks in memory.
    ///
    /// # Arguments
    /// * `capacity` - In-memory record count before spilling; clamped to at
    ///   least one
    /// * `directory` - Spill directory; evicted records are dropped when
    ///   absent or uncreatable
    pub fn new(capacity: usize, directory: Option<PathBuf>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let directory = directory.and_then(|directory| {
            match std::fs::create_dir_all(&directory) {
                Ok(()) => Some(directory),
                Err(error) => {
                    warn!(
                        "Cannot create chunk store directory {} ({}); store stays in memory",
                        directory.display(),
                        error
                    );
                    None
                }
            }
        });
        ChunkStore {
            cache: LruCache::new(capacity),
            directory,
        }
    }

    /// Saves a chunk, spilling the least recently used record if the cache
    /// overflows.
    pub fn save(&mut self, chunk: &Chunk) {
        let position = chunk.position;
        let record = ChunkRecord::from_chunk(chunk);
        if let Some((evicted_position, evicted)) = self.cache.push(position, record) {
            // Pushing an existing key returns the replaced record under the
            // same key; only genuine evictions go to disk.
            if evicted_position != position {
                self.spill(evicted_position, &evicted);
            }
        }
    }

    /// Takes a stored chunk back out, checking memory first and disk second.
    ///
    /// # Returns
    /// The restored, unlit chunk, or `None` if it was never stored or its
    /// record is damaged.
    pub fn load(&mut self, position: Point3<i32>) -> Option<Chunk> {
        if let Some(record) = self.cache.pop(&position) {
            return record.into_chunk();
        }

        let directory = self.directory.as_ref()?;
        let path = directory.join(file_name(position));
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return None,
        };
        match serde_json::from_str::<ChunkRecord>(&contents) {
            Ok(record) => {
                if record.position != [position.x, position.y, position.z] {
                    warn!(
                        "Chunk file {} claims position {:?}; discarding it",
                        path.display(),
                        record.position
                    );
                    return None;
                }
                record.into_chunk()
            }
            Err(error) => {
                warn!("Chunk file {} is not valid ({})", path.display(), error);
                None
            }
        }
    }

    /// Spills every in-memory record to disk. A no-op for in-memory stores.
    pub fn flush(&mut self) {
        if self.directory.is_none() {
            return;
        }
        while let Some((position, record)) = self.cache.pop_lru() {
            self.spill(position, &record);
        }
    }

    /// Returns how many records the in-memory cache currently holds.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns whether the in-memory cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn spill(&self, position: Point3<i32>, record: &ChunkRecord) {
        let Some(directory) = &self.directory else {
            return;
        };
        let path = directory.join(file_name(position));
        let contents = match serde_json::to_string(record) {
            Ok(contents) => contents,
            Err(error) => {
                warn!("Cannot serialize chunk at {:?} ({})", position, error);
                return;
            }
        };
        if let Err(error) = std::fs::write(&path, contents) {
            warn!("Cannot write chunk file {} ({})", path.display(), error);
        }
    }
}

fn file_name(position: Point3<i32>) -> String {
    format!("chunk_{}_{}_{}.json", position.x, position.y, position.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with_marker(position: Point3<i32>, marker: BlockType) -> Chunk {
        let mut chunk = Chunk::empty(position);
        chunk.set_block_at(1, 2, 3, Block::new(marker));
        chunk
    }

    fn temp_directory(label: &str) -> PathBuf {
        let directory = std::env::temp_dir().join(format!(
            "chunk_store_{}_{}",
            label,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&directory);
        directory
    }

    #[test]
    fn saved_chunks_load_back_from_memory() {
        let mut store = ChunkStore::new(4, None);
        let position = Point3::new(16, 0, -32);
        store.save(&chunk_with_marker(position, BlockType::WOOD));

        let loaded = store.load(position).unwrap();
        assert_eq!(loaded.position, position);
        assert_eq!(loaded.block_at(1, 2, 3).block_type(), BlockType::WOOD);
        assert!(store.is_empty(), "loading takes the record back out");
    }

    #[test]
    fn unknown_positions_load_nothing() {
        let mut store = ChunkStore::new(4, None);
        assert!(store.load(Point3::new(160, 0, 160)).is_none());
    }

    #[test]
    fn overflow_without_a_directory_drops_the_oldest_record() {
        let mut store = ChunkStore::new(1, None);
        let first = Point3::new(0, 0, 0);
        let second = Point3::new(16, 0, 0);
        store.save(&chunk_with_marker(first, BlockType::WOOD));
        store.save(&chunk_with_marker(second, BlockType::STONE));

        assert!(store.load(first).is_none());
        assert!(store.load(second).is_some());
    }

    #[test]
    fn overflow_with_a_directory_spills_and_loads_back() {
        let directory = temp_directory("spill");
        let mut store = ChunkStore::new(1, Some(directory.clone()));
        let first = Point3::new(0, 0, 0);
        let second = Point3::new(16, 0, 0);
        store.save(&chunk_with_marker(first, BlockType::WOOD));
        store.save(&chunk_with_marker(second, BlockType::STONE));

        let restored = store.load(first).unwrap();
        assert_eq!(restored.block_at(1, 2, 3).block_type(), BlockType::WOOD);

        let _ = std::fs::remove_dir_all(&directory);
    }

    #[test]
    fn resaving_a_chunk_updates_it_in_place() {
        let directory = temp_directory("update");
        let mut store = ChunkStore::new(1, Some(directory.clone()));
        let position = Point3::new(0, 0, 0);
        store.save(&chunk_with_marker(position, BlockType::WOOD));
        store.save(&chunk_with_marker(position, BlockType::LEAVES));

        assert!(
            !directory.join(file_name(position)).exists(),
            "updating the same key must not spill"
        );
        let loaded = store.load(position).unwrap();
        assert_eq!(loaded.block_at(1, 2, 3).block_type(), BlockType::LEAVES);

        let _ = std::fs::remove_dir_all(&directory);
    }

    #[test]
    fn flush_persists_the_whole_cache() {
        let directory = temp_directory("flush");
        let positions = [Point3::new(0, 0, 0), Point3::new(16, 0, 16)];
        {
            let mut store = ChunkStore::new(8, Some(directory.clone()));
            for position in positions {
                store.save(&chunk_with_marker(position, BlockType::STONE));
            }
            store.flush();
            assert!(store.is_empty());
        }

        let mut reopened = ChunkStore::new(8, Some(directory.clone()));
        for position in positions {
            assert!(reopened.load(position).is_some());
        }

        let _ = std::fs::remove_dir_all(&directory);
    }

    #[test]
    fn damaged_files_are_treated_as_missing() {
        let directory = temp_directory("damaged");
        std::fs::create_dir_all(&directory).unwrap();
        let position = Point3::new(0, 0, 0);
        std::fs::write(directory.join(file_name(position)), "not json").unwrap();

        let mut store = ChunkStore::new(4, Some(directory.clone()));
        assert!(store.load(position).is_none());

        let _ = std::fs::remove_dir_all(&directory);
    }

    #[test]
    fn truncated_records_are_rejected() {
        let record = ChunkRecord {
            position: [0, 0, 0],
            blocks: vec![0u8; 10],
        };
        assert!(record.into_chunk().is_none());

        let record = ChunkRecord {
            position: [0, 0, 0],
            blocks: vec![255u8; CHUNK_SIZE as usize],
        };
        assert!(record.into_chunk().is_none(), "unknown block types are rejected");
    }
}
