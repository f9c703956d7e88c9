//! # Settings Module
//!
//! This module defines the engine's runtime configuration. Settings load from
//! a JSON file when one exists and fall back to defaults otherwise; a broken
//! file is reported and ignored rather than aborting startup.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::block::block_type::BlockType;

/// Engine configuration as read from disk.
///
/// Every field has a default, so a settings file only needs to name the
/// values it wants to override.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Horizontal distance from the pivot inside which chunks stay live.
    pub caching_radius: f32,

    /// Number of threads in the generation job pool.
    pub worker_threads: usize,

    /// World seed feeding every noise source and decoration roll.
    pub seed: u32,

    /// Cells below this height flood with water where terrain leaves room.
    pub water_level: i32,

    /// Block names for the two biome surface materials, picked by cell noise.
    pub biome_surfaces: Vec<String>,

    /// How many evicted chunks the in-memory store keeps before spilling.
    pub store_capacity: usize,

    /// Directory evicted chunks spill to; in-memory only when absent.
    pub store_directory: Option<PathBuf>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            caching_radius: 96.0,
            worker_threads: default_worker_threads(),
            seed: 0,
            water_level: 58,
            biome_surfaces: vec!["dirt".to_string(), "stone".to_string()],
            store_capacity: 512,
            store_directory: None,
        }
    }
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

impl WorldSettings {
    /// Loads settings from a JSON file, falling back to defaults when the
    /// file is missing or unreadable.
    ///
    /// # Arguments
    /// * `path` - The settings file location
    pub fn load_or_default(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(
                    "Settings file {} is not valid ({}); using defaults",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    /// Resolves the parameters the generation tasks consume.
    ///
    /// Unknown biome surface names are reported and replaced by the default
    /// material for that slot.
    pub fn generation(&self) -> GenerationSettings {
        let mut biome_surfaces = [BlockType::DIRT, BlockType::STONE];
        for (slot, name) in biome_surfaces.iter_mut().zip(&self.biome_surfaces) {
            match BlockType::from_name(name) {
                Some(block_type) => *slot = block_type,
                None => warn!(
                    "Unknown biome surface block {:?}; keeping {:?}",
                    name, slot
                ),
            }
        }
        GenerationSettings {
            seed: self.seed,
            water_level: self.water_level,
            biome_surfaces,
        }
    }
}

/// The resolved parameters handed to generation tasks.
#[derive(Copy, Clone, Debug)]
pub struct GenerationSettings {
    /// World seed feeding every noise source and decoration roll.
    pub seed: u32,

    /// Cells below this height flood with water where terrain leaves room.
    pub water_level: i32,

    /// The two biome surface materials, picked per column by cell noise.
    pub biome_surfaces: [BlockType; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_dirt_and_stone_biomes() {
        let settings = WorldSettings::default();
        let generation = settings.generation();
        assert_eq!(
            generation.biome_surfaces,
            [BlockType::DIRT, BlockType::STONE]
        );
        assert!(settings.worker_threads >= 1);
    }

    #[test]
    fn partial_files_only_override_what_they_name() {
        let settings: WorldSettings = serde_json::from_str(r#"{ "seed": 42 }"#).unwrap();
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.water_level, WorldSettings::default().water_level);
        assert_eq!(settings.store_directory, None);
    }

    #[test]
    fn unknown_biome_names_keep_the_default_material() {
        let settings: WorldSettings =
            serde_json::from_str(r#"{ "biome_surfaces": ["dirt_with_grass", "lava"] }"#).unwrap();
        let generation = settings.generation();
        assert_eq!(generation.biome_surfaces[0], BlockType::DIRT_WITH_GRASS);
        assert_eq!(generation.biome_surfaces[1], BlockType::STONE);
    }

    #[test]
    fn a_missing_file_loads_defaults() {
        let settings =
            WorldSettings::load_or_default(Path::new("/definitely/not/a/settings.json"));
        assert_eq!(settings.seed, WorldSettings::default().seed);
    }
}
