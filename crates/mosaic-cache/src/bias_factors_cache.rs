//! BiasFactors cache: `spec.md` §4.8 table, row 4.
//!
//! The loader depends on RawData (fetched through [`RawDataCache`]) and the
//! Bias Correction Kernel (C5, `mosaic_render::compute_correction`).

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use mosaic_core::{BiasKind, CorrectionFactors, Error, Result, Segment};
use mosaic_io::ByteReader;
use tracing::{instrument, trace};

use crate::keys::BiasFactorsKey;
use crate::raw_data_cache::RawDataCache;
use crate::stats::CacheStats;

/// Caches a segment's computed [`CorrectionFactors`] by `(segment,
/// biasKind)`.
pub struct BiasFactorsCache {
    cache: Cache<BiasFactorsKey, Arc<dyn CorrectionFactors>>,
    stats: Arc<CacheStats>,
}

impl BiasFactorsCache {
    /// Builds an empty cache capped per `config.bias_correction_cache_size`.
    pub fn new(config: &mosaic_core::CoreConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        let eviction_stats = stats.clone();
        let cache = Cache::builder()
            .max_capacity(config.bias_correction_cache_size)
            .eviction_listener(move |_, _, _| eviction_stats.record_eviction())
            .build();
        Self { cache, stats }
    }

    /// Observability counters for this tier.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Computes (or returns the cached computation of) `segment`'s
    /// correction factors under `bias_kind`.
    #[instrument(skip(self, segment, raw_data, byte_reader), fields(file = %segment.file, hdu = segment.hdu_ordinal, ?bias_kind))]
    pub async fn get(
        &self,
        segment: &Arc<Segment>,
        bias_kind: BiasKind,
        raw_data: &RawDataCache,
        byte_reader: &ByteReader,
    ) -> Result<Arc<dyn CorrectionFactors>> {
        let key = BiasFactorsKey { segment: segment.cache_key(), bias_kind };
        let had_entry = self.cache.contains_key(&key);
        let stats = self.stats.clone();
        let segment = segment.clone();

        let result = self
            .cache
            .try_get_with(key, async move {
                let started = Instant::now();
                let raw = raw_data.get(&segment, byte_reader).await?;
                let factors: Arc<dyn CorrectionFactors> = Arc::from(mosaic_render::compute_correction(bias_kind, &raw)?);
                stats.record_miss(started.elapsed());
                trace!(overall = factors.overall_correction(), "bias factors computed");
                Ok::<_, Error>(factors)
            })
            .await;

        if had_entry {
            self.stats.record_hit();
        }

        result.map_err(|e: Arc<Error>| (*e).clone())
    }
}
