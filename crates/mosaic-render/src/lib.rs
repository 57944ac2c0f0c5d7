//! # mosaic-render
//!
//! Bias Correction Kernel (C5), Histogram/Scaling Engine (C6), and Tile
//! Renderer (C7): the three pure, CPU-bound stages between a decoded pixel
//! buffer and a composited RGB tile.
//!
//! None of these stages touch a cache, a file, or the network — they are
//! pure functions of their inputs, which is what lets the Cache Fabric
//! (`mosaic-cache`) memoize them independently and why the Render
//! Controller (`mosaic-controller`) can fan them out across the executor
//! without synchronization beyond the cache's own single-flight guarantee.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bias;
pub mod histogram_engine;
pub mod tile_renderer;

pub use bias::compute_correction;
pub use histogram_engine::{build_histogram, cdf, ScalingMap};
pub use tile_renderer::render_tile;
