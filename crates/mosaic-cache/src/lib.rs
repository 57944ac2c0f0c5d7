//! # mosaic-cache
//!
//! The Cache Fabric (C8): a directed acyclic graph of five asynchronous
//! single-flight caches (Index, Segment, RawData, BiasFactors,
//! RenderedTile) plus a cross-cutting GlobalHistogram cache.
//!
//! Every tier is built on `moka::future::Cache`, whose `try_get_with`
//! gives single-flight-per-key semantics (concurrent callers for the same
//! key share one in-flight loader future and a failed load is never
//! cached) and whose `weigher` gives byte-weighted eviction directly for
//! the two tiers the memory budget in `spec.md` §5 calls out (RawData,
//! RenderedTile). The DAG shape mirrors `spec.md` §4.8's "loader
//! dependencies" list: each loader calls `get` on the tiers leafward of it
//! rather than recomputing their work, and the graph is built bottom-up in
//! [`CacheFabric::new`] so no tier ever references one above it.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bias_factors_cache;
pub mod fabric;
pub mod global_histogram_cache;
pub mod index_cache;
pub mod keys;
pub mod raw_data_cache;
pub mod rendered_tile_cache;
pub mod segment_cache;
pub mod stats;

pub use bias_factors_cache::BiasFactorsCache;
pub use fabric::CacheFabric;
pub use global_histogram_cache::GlobalHistogramCache;
pub use index_cache::IndexCache;
pub use keys::{BiasFactorsKey, GlobalHistogramKey, RenderedTileKey, SegmentCacheKey, SegmentKey};
pub use raw_data_cache::RawDataCache;
pub use rendered_tile_cache::RenderedTileCache;
pub use segment_cache::SegmentCache;
pub use stats::{CacheStats, StatsSnapshot};
