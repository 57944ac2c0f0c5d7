//! The Cache Fabric (C8): `spec.md` §4.8.
//!
//! Ties the five single-flight caches plus the GlobalHistogram cache into
//! one object the Render Controller holds. Construction snapshots a
//! [`CoreConfig`] once; there is no runtime reconfiguration (`spec.md` §9).

use std::sync::Arc;
use std::time::Duration;

use mosaic_core::CoreConfig;
use mosaic_io::ByteReader;
use tracing::info;

use crate::bias_factors_cache::BiasFactorsCache;
use crate::global_histogram_cache::GlobalHistogramCache;
use crate::index_cache::IndexCache;
use crate::raw_data_cache::RawDataCache;
use crate::rendered_tile_cache::RenderedTileCache;
use crate::segment_cache::SegmentCache;

/// The full cache graph: Index, Segment, RawData, BiasFactors,
/// RenderedTile, and GlobalHistogram, plus the shared [`ByteReader`] every
/// fetch-backed tier uses.
pub struct CacheFabric {
    /// Index cache (C8 row 1).
    pub index: IndexCache,
    /// Segment cache (C8 row 2).
    pub segment: SegmentCache,
    /// RawData cache (C8 row 3).
    pub raw_data: RawDataCache,
    /// BiasFactors cache (C8 row 4).
    pub bias_factors: BiasFactorsCache,
    /// RenderedTile cache (C8 row 5).
    pub rendered_tile: RenderedTileCache,
    /// GlobalHistogram cache (C8 cross-cutting row).
    pub global_histogram: GlobalHistogramCache,
    /// The shared byte-range fetcher every fetch-backed tier calls through.
    pub byte_reader: ByteReader,
}

impl CacheFabric {
    /// Builds every tier from one snapshotted [`CoreConfig`].
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            index: IndexCache::new(config),
            segment: SegmentCache::new(config),
            raw_data: RawDataCache::new(config),
            bias_factors: BiasFactorsCache::new(config),
            rendered_tile: RenderedTileCache::new(config),
            global_histogram: GlobalHistogramCache::new(config),
            byte_reader: ByteReader::new(config.handle_idle_expiry),
        }
    }

    /// Builds a fabric from `CoreConfig::from_env()`.
    pub fn from_env() -> Self {
        Self::new(&CoreConfig::from_env())
    }

    /// Logs one `info!` line per tier with its current hit/miss/load-time/
    /// eviction snapshot. Never panics or propagates an error — intended to
    /// be driven by [`CacheFabric::spawn_stats_reporter`], and "periodic
    /// stats reporting never interrupts user operations" (`spec.md` §7).
    pub fn report_stats(&self) {
        for (name, stats) in [
            ("index", self.index.stats()),
            ("segment", self.segment.stats()),
            ("raw_data", self.raw_data.stats()),
            ("bias_factors", self.bias_factors.stats()),
            ("rendered_tile", self.rendered_tile.stats()),
            ("global_histogram", self.global_histogram.stats()),
        ] {
            let snap = stats.snapshot();
            info!(
                cache = name,
                hits = snap.hits,
                misses = snap.misses,
                load_time_total_ms = snap.load_time_total.as_millis() as u64,
                evictions = snap.evictions,
                "cache stats"
            );
        }
    }

    /// Spawns the periodic 60-second stats reporter and byte-reader
    /// idle-handle sweep (`spec.md` §4.3, §4.8) on the current Tokio
    /// runtime. The returned handle may be aborted to stop both tasks.
    pub fn spawn_stats_reporter(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let fabric = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                fabric.report_stats();
                fabric.byte_reader.sweep_idle();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn report_stats_does_not_panic_on_an_empty_fabric() {
        let fabric = CacheFabric::new(&CoreConfig::defaults());
        fabric.report_stats();
    }
}
