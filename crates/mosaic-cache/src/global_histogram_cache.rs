//! GlobalHistogram cache: `spec.md` §4.8 table, row 6.
//!
//! The loader fetches RawData + BiasFactors for every segment in the list,
//! builds each segment's per-segment histogram (`mosaic_render::build_histogram`),
//! and merges them in request order (`spec.md` §9: the merge is
//! commutative, but the Index cache fixes a deterministic request order so
//! results are reproducible across runs).

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use mosaic_core::{BiasKind, Error, GlobalHistogram, Result, Segment};
use mosaic_io::ByteReader;
use tracing::{instrument, trace};

use crate::bias_factors_cache::BiasFactorsCache;
use crate::keys::GlobalHistogramKey;
use crate::raw_data_cache::RawDataCache;
use crate::stats::CacheStats;

/// Caches an exposure-wide merged histogram by `(segment list, biasKind)`.
pub struct GlobalHistogramCache {
    cache: Cache<GlobalHistogramKey, Arc<GlobalHistogram>>,
    stats: Arc<CacheStats>,
}

impl GlobalHistogramCache {
    /// Builds an empty cache capped per `config.global_scaling_cache_size`.
    pub fn new(config: &mosaic_core::CoreConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        let eviction_stats = stats.clone();
        let cache = Cache::builder()
            .max_capacity(config.global_scaling_cache_size)
            .eviction_listener(move |_, _, _| eviction_stats.record_eviction())
            .build();
        Self { cache, stats }
    }

    /// Observability counters for this tier.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Merges every segment in `segments`'s per-segment histogram (under
    /// `bias_kind`) into one exposure-wide histogram, or returns the cached
    /// merge. Returns the resolved key alongside the histogram so callers
    /// can thread it into [`crate::RenderedTileCache::get`].
    pub async fn get(
        &self,
        segments: &[Arc<Segment>],
        bias_kind: BiasKind,
        raw_data: &RawDataCache,
        bias_factors: &BiasFactorsCache,
        byte_reader: &ByteReader,
    ) -> Result<(GlobalHistogramKey, Arc<GlobalHistogram>)> {
        let key = GlobalHistogramKey {
            segments: segments.iter().map(|s| s.cache_key()).collect(),
            bias_kind,
        };
        let histogram = self.get_by_key(key.clone(), segments, bias_kind, raw_data, bias_factors, byte_reader).await?;
        Ok((key, histogram))
    }

    #[instrument(skip_all, fields(segments = key.segments.len(), ?bias_kind))]
    async fn get_by_key(
        &self,
        key: GlobalHistogramKey,
        segments: &[Arc<Segment>],
        bias_kind: BiasKind,
        raw_data: &RawDataCache,
        bias_factors: &BiasFactorsCache,
        byte_reader: &ByteReader,
    ) -> Result<Arc<GlobalHistogram>> {
        let had_entry = self.cache.contains_key(&key);
        let stats = self.stats.clone();
        let segments = segments.to_vec();

        let result = self
            .cache
            .try_get_with(key, async move {
                let started = Instant::now();
                let mut merged = GlobalHistogram::new();
                for segment in &segments {
                    let raw = raw_data.get(segment, byte_reader).await?;
                    let factors = bias_factors.get(segment, bias_kind, raw_data, byte_reader).await?;
                    let histogram = mosaic_render::build_histogram(&raw, segment, factors.as_ref());
                    merged.merge(&histogram);
                }
                stats.record_miss(started.elapsed());
                trace!("global histogram merged");
                Ok::<_, Error>(Arc::new(merged))
            })
            .await;

        if had_entry {
            self.stats.record_hit();
        }

        result.map_err(|e: Arc<Error>| (*e).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{Affine, CoreConfig, FRect, Rect, SampleFormat};
    use std::io::Write;
    use std::time::Duration;

    fn segment_with_values(path: String, values: [i32; 4]) -> Arc<Segment> {
        let mut file = std::fs::File::create(&path).unwrap();
        for v in values {
            file.write_all(&v.to_be_bytes()).unwrap();
        }
        Arc::new(Segment {
            file: path,
            hdu_ordinal: 1,
            data_offset: 0,
            data_length: 16,
            file_size_witness: 0,
            dims: (2, 2),
            sample_format: SampleFormat::Int32,
            compression: None,
            tile_dims: (0, 0),
            datasec: Rect::new(0, 0, 2, 2),
            raft: "R22".into(),
            ccd_slot: "S11".into(),
            segment_name: "AMP00".into(),
            wcs_letter: '4',
            affine: Affine::IDENTITY,
            wcs: FRect::new(0.0, 0.0, 2.0, 2.0),
        })
    }

    #[tokio::test]
    async fn merges_histograms_in_request_order_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        let a = segment_with_values(dir.path().join("a.fits").to_str().unwrap().to_string(), [1, 1, 2, 2]);
        let b = segment_with_values(dir.path().join("b.fits").to_str().unwrap().to_string(), [5, 5, 5, 5]);

        let reader = ByteReader::new(Duration::from_secs(60));
        let raw_cache = RawDataCache::new(&CoreConfig::defaults());
        let bias_cache = BiasFactorsCache::new(&CoreConfig::defaults());
        let global_cache = GlobalHistogramCache::new(&CoreConfig::defaults());

        let (_, forward) = global_cache
            .get(&[a.clone(), b.clone()], BiasKind::None, &raw_cache, &bias_cache, &reader)
            .await
            .unwrap();
        let (_, reverse) = global_cache
            .get(&[b, a], BiasKind::None, &raw_cache, &bias_cache, &reader)
            .await
            .unwrap();

        assert_eq!(forward.bins(), reverse.bins());
        assert_eq!(global_cache.stats().snapshot().misses, 2);
    }
}
