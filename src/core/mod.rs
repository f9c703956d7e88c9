//! # Core Module
//!
//! This module provides the concurrency primitives used throughout the chunk
//! generation pipeline: a thread-safe shared resource container and a job pool
//! for offloading CPU-bound generation work.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `JobPool`: Worker-thread pool executing generation sub-jobs
//! - `JobHandle`: Pollable receiver for one submitted job's result
//!
//! ## Usage
//! ```rust
//! use voxel_pipeline::core::{JobPool, MtResource};
//!
//! // Thread-safe resource
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! // Offloaded work, observed by polling
//! let pool = JobPool::new(2);
//! let handle = pool.submit(|| 2 + 2);
//! assert_eq!(handle.wait_take(), 4);
//! ```

pub mod job_system;

// Sub-modules for each core type
pub mod mt_resource;

// Re-export types for easier access
pub use job_system::{JobHandle, JobPool};
pub use mt_resource::MtResource;
