//! # Landscape Task
//!
//! This module generates a chunk's terrain from world noise: a broad rolling
//! height field with finer detail layered on top, a cellular biome field
//! picking the surface material, and water flooding every column that stays
//! below the configured water level.
//!
//! The whole column layout is deterministic in the world seed and the chunk
//! position, so a chunk regenerated after eviction comes out identical.

use cgmath::Point3;
use noise::core::worley::ReturnType;
use noise::{NoiseFn, Perlin, Worley};

use crate::core::{JobHandle, JobPool};
use crate::engine_state::generation::tasks::TaskState;
use crate::engine_state::generation::workspace::{ChunkWorkspace, SurfaceColumn, WorkspaceState};
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::Block;
use crate::engine_state::settings::GenerationSettings;
use crate::engine_state::voxels::chunk::{
    Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_PLANE_SIZE, CHUNK_SIZE, CHUNK_WIDTH,
};

/// Scaling factor applied to world coordinates when sampling the broad
/// height noise.
pub const BROAD_NOISE_SCALE: f64 = 0.01;
/// Scaling factor applied to world coordinates when sampling the detail
/// height noise.
pub const DETAIL_NOISE_SCALE: f64 = 0.05;
/// Scaling factor applied to world coordinates when sampling the biome cell
/// noise.
pub const BIOME_NOISE_SCALE: f64 = 0.01;

/// The height a column has where both noise layers sample to zero.
const BASE_HEIGHT: f64 = 64.0;
/// How many blocks the broad noise raises or lowers a column.
const BROAD_AMPLITUDE: f64 = 24.0;
/// How many blocks the detail noise roughens the broad shape.
const DETAIL_AMPLITUDE: f64 = 6.0;
/// How many blocks of surface material cap the stone base of each column.
const SURFACE_LAYER_DEPTH: i32 = 3;

/// The blocks and surface summary of one generated chunk.
struct LandscapeOutput {
    blocks: Vec<Block>,
    surface: Vec<SurfaceColumn>,
}

/// The landscape generation task: fills a freshly created chunk with terrain.
///
/// Runs as a single job; folding the result writes the blocks into the chunk
/// under a short write lock and stores the surface summary on the workspace
/// for the decoration stage.
pub struct LandscapeTask {
    state: TaskState,
    pending: Option<JobHandle<LandscapeOutput>>,
}

impl LandscapeTask {
    /// Creates the task in its deferred state.
    pub fn new() -> Self {
        LandscapeTask {
            state: TaskState::Deferred,
            pending: None,
        }
    }

    /// Returns the task's lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Submits the terrain job.
    ///
    /// # Panics
    /// Panics if the workspace has already progressed past `Created`.
    pub fn launch(
        &mut self,
        workspace: &mut ChunkWorkspace,
        jobs: &JobPool,
        settings: GenerationSettings,
    ) {
        workspace.assert_state(WorkspaceState::Created);
        let position = workspace.position;
        self.pending = Some(jobs.submit(move || generate_landscape(position, settings)));
        self.state = TaskState::Launched;
    }

    /// Collects the terrain job if it has finished, without blocking.
    pub fn poll(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.as_mut() {
            if let Some(output) = handle.try_take() {
                self.pending = None;
                self.finish(workspace, output);
            }
        }
        self.state
    }

    /// Blocks until the terrain job has finished and is folded back.
    pub fn wait(&mut self, workspace: &mut ChunkWorkspace) -> TaskState {
        if self.state != TaskState::Launched {
            return self.state;
        }
        if let Some(handle) = self.pending.take() {
            let output = handle.wait_take();
            self.finish(workspace, output);
        }
        self.state
    }

    fn finish(&mut self, workspace: &mut ChunkWorkspace, output: LandscapeOutput) {
        workspace
            .chunk
            .get_mut()
            .blocks_mut()
            .copy_from_slice(&output.blocks);
        workspace.surface = output.surface;
        workspace.advance_state(WorkspaceState::Created, WorkspaceState::LandscapeDone);
        self.state = TaskState::Done;
    }
}

impl Default for LandscapeTask {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates the full block array and surface summary of one chunk.
///
/// # Arguments
/// * `position` - The chunk's world position
/// * `settings` - Seed, water level and biome surface materials
fn generate_landscape(position: Point3<i32>, settings: GenerationSettings) -> LandscapeOutput {
    let broad = Perlin::new(settings.seed);
    let detail = Perlin::new(settings.seed.wrapping_add(1));
    let biomes = Worley::new(settings.seed).set_return_type(ReturnType::Value);

    let mut blocks = vec![Block::new(BlockType::AIR); CHUNK_SIZE as usize];
    let mut surface = Vec::with_capacity(CHUNK_PLANE_SIZE as usize);

    for z in 0..CHUNK_DEPTH {
        for x in 0..CHUNK_WIDTH {
            let world = to_noise_pos(position, x, z);

            let broad_sample = broad.get(scaled(world, BROAD_NOISE_SCALE));
            let detail_sample = detail.get(scaled(world, DETAIL_NOISE_SCALE));
            let height = (BASE_HEIGHT
                + broad_sample * BROAD_AMPLITUDE
                + detail_sample * DETAIL_AMPLITUDE) as i32;
            let height = height.clamp(1, CHUNK_HEIGHT - 1);

            let biome_sample = biomes.get(scaled(world, BIOME_NOISE_SCALE));
            let surface_block = if biome_sample < 0.0 {
                settings.biome_surfaces[0]
            } else {
                settings.biome_surfaces[1]
            };

            for y in 0..height {
                let block_type = if y < height - SURFACE_LAYER_DEPTH {
                    BlockType::STONE
                } else {
                    surface_block
                };
                blocks[Chunk::index_of(x, y, z)] = Block::new(block_type);
            }

            let mut top = surface_block;
            if surface_block == BlockType::DIRT && height >= settings.water_level {
                top = BlockType::DIRT_WITH_GRASS;
                blocks[Chunk::index_of(x, height - 1, z)] = Block::new(top);
            }
            for y in height..settings.water_level {
                blocks[Chunk::index_of(x, y, z)] = Block::new(BlockType::WATER);
            }

            surface.push(SurfaceColumn {
                height,
                block_type: top,
            });
        }
    }

    LandscapeOutput { blocks, surface }
}

/// Converts chunk-relative column coordinates to world-space coordinates for
/// noise sampling.
fn to_noise_pos(position: Point3<i32>, x: i32, z: i32) -> [f64; 2] {
    [(position.x + x) as f64, (position.z + z) as f64]
}

fn scaled(world: [f64; 2], scale_factor: f64) -> [f64; 2] {
    [world[0] * scale_factor, world[1] * scale_factor]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MtResource;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            seed: 7,
            water_level: 58,
            biome_surfaces: [BlockType::DIRT, BlockType::STONE],
        }
    }

    #[test]
    fn terrain_is_deterministic_for_a_seed_and_position() {
        let position = Point3::new(32, 0, -16);
        let first = generate_landscape(position, settings());
        let second = generate_landscape(position, settings());
        assert_eq!(first.blocks, second.blocks);
        assert_eq!(first.surface, second.surface);
    }

    #[test]
    fn columns_are_terrain_below_their_surface_height() {
        let output = generate_landscape(Point3::new(0, 0, 0), settings());
        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                let column = output.surface[(x + z * CHUNK_WIDTH) as usize];
                assert!(column.height >= 1);
                for y in 0..column.height {
                    let block = output.blocks[Chunk::index_of(x, y, z)];
                    assert_ne!(block.block_type(), BlockType::AIR);
                    assert_ne!(block.block_type(), BlockType::WATER);
                }
                let top = output.blocks[Chunk::index_of(x, column.height - 1, z)];
                assert_eq!(top.block_type(), column.block_type);
            }
        }
    }

    #[test]
    fn water_floods_columns_up_to_the_water_level() {
        let mut flooded = settings();
        flooded.water_level = 80;
        let output = generate_landscape(Point3::new(0, 0, 0), flooded);

        let mut water_cells = 0;
        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                let column = output.surface[(x + z * CHUNK_WIDTH) as usize];
                for y in column.height..CHUNK_HEIGHT {
                    let block = output.blocks[Chunk::index_of(x, y, z)];
                    if y < flooded.water_level && column.height < flooded.water_level {
                        assert_eq!(block.block_type(), BlockType::WATER);
                        water_cells += 1;
                    } else {
                        assert_eq!(block.block_type(), BlockType::AIR);
                    }
                }
            }
        }
        assert!(water_cells > 0, "a water level of 80 must flood something");
    }

    #[test]
    fn grass_only_tops_dirt_columns_that_clear_the_water() {
        let output = generate_landscape(Point3::new(0, 0, 0), settings());
        for column in &output.surface {
            match column.block_type {
                BlockType::DIRT_WITH_GRASS => assert!(column.height >= settings().water_level),
                BlockType::DIRT => assert!(column.height < settings().water_level),
                BlockType::STONE => {}
                other => panic!("unexpected surface block {:?}", other),
            }
        }
    }

    #[test]
    fn the_task_fills_the_chunk_and_advances_the_workspace() {
        let jobs = JobPool::new(1);
        let chunk = MtResource::new(Chunk::empty(Point3::new(0, 0, 0)));
        let mut workspace = ChunkWorkspace::new(chunk, WorkspaceState::Created);

        let mut task = LandscapeTask::new();
        task.launch(&mut workspace, &jobs, settings());
        assert_eq!(task.state(), TaskState::Launched);
        assert_eq!(task.wait(&mut workspace), TaskState::Done);

        assert_eq!(workspace.state, WorkspaceState::LandscapeDone);
        assert_eq!(workspace.surface.len(), CHUNK_PLANE_SIZE as usize);
        let solid = workspace
            .chunk
            .get()
            .blocks()
            .iter()
            .filter(|block| block.block_type() != BlockType::AIR)
            .count();
        assert!(solid > 0, "terrain generation must write blocks");
    }
}
