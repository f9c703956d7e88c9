//! # Chunk Pipeline Entry Point
//!
//! Runs a self-contained generation session with settings from an optional
//! `settings.json` in the working directory.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    voxel_pipeline::run();
}
