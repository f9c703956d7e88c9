//! # Chunk Generation Module
//!
//! This module implements the staged chunk generation pipeline. Every chunk
//! moves through five stages in a fixed order: landscape, decorations, light,
//! geometry, and model packaging. Each stage runs as a single-use task whose
//! heavy work is pushed onto the shared job pool, while one driver thread
//! steps all workers once per engine tick.
//!
//! ## Architecture Overview
//!
//! * [`director`] - Owns the worker table and steps every worker once per tick
//! * [`worker`] - The per-chunk state machine deciding which task runs next
//! * [`workspace`] - Intermediate buffers a worker accumulates across stages
//! * [`tasks`] - The five generation tasks and their job-pool plumbing
//! * [`build`] - The immutable output handed back to the chunk when done
//!
//! ## Cross-Chunk Coordination
//!
//! Two stages gate on neighbors: decorations wait until all eight horizontal
//! neighbors have finished their landscape, and geometry waits until the four
//! edge-adjacent neighbors have finished their light. Preconditions are simply
//! re-checked every tick; there is no retry bookkeeping. Right before such a
//! stage launches, the worker copies the data it needs out of its neighbors
//! into its own workspace, so the stage itself never reaches across chunks.

pub mod build;
pub mod director;
pub mod tasks;
pub mod worker;
pub mod workspace;

/// How far a chunk has progressed through the generation pipeline.
///
/// The ordering of the variants is meaningful: progress is monotonic, and
/// neighbor preconditions are expressed as `status >= threshold` comparisons.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenerationStatus {
    /// No stage has completed yet.
    Nothing,

    /// Terrain columns have been written into the chunk.
    GeneratedLandscape,

    /// Trees and flowers have been placed.
    GeneratedDecorations,

    /// Block light levels have been computed and published.
    GeneratedLight,

    /// Geometry batches have been meshed from the blocks.
    GeneratedGeometry,

    /// The final models are packaged; the worker is done.
    GeneratedModel,
}

impl GenerationStatus {
    /// Returns `true` once the pipeline has nothing left to do for the chunk.
    pub fn is_terminal(self) -> bool {
        self == GenerationStatus::GeneratedModel
    }

    /// Returns the status the pipeline produces next.
    ///
    /// The terminal status returns itself.
    pub fn next(self) -> GenerationStatus {
        match self {
            GenerationStatus::Nothing => GenerationStatus::GeneratedLandscape,
            GenerationStatus::GeneratedLandscape => GenerationStatus::GeneratedDecorations,
            GenerationStatus::GeneratedDecorations => GenerationStatus::GeneratedLight,
            GenerationStatus::GeneratedLight => GenerationStatus::GeneratedGeometry,
            GenerationStatus::GeneratedGeometry => GenerationStatus::GeneratedModel,
            GenerationStatus::GeneratedModel => GenerationStatus::GeneratedModel,
        }
    }
}
