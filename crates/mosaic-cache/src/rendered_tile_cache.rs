//! RenderedTile cache: `spec.md` §4.8 table, row 5.
//!
//! The loader depends on RawData + BiasFactors and, when rendering under
//! `scaleMode = GLOBAL`, the caller's already-resolved [`GlobalHistogram`]
//! handle (the Cache Fabric does not recompute it here — the Render
//! Controller resolves it once per request through [`crate::GlobalHistogramCache`]
//! and passes the handle through).

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use mosaic_color::Colormap;
use mosaic_core::{BiasKind, Error, GlobalHistogram, RenderedTile, Result, Segment};
use mosaic_io::ByteReader;
use mosaic_render::tile_renderer::{render_tile, ScaleSource};
use tracing::{instrument, trace};

use crate::bias_factors_cache::BiasFactorsCache;
use crate::keys::{GlobalHistogramKey, RenderedTileKey};
use crate::raw_data_cache::RawDataCache;
use crate::stats::CacheStats;

/// Caches a segment's composited RGB raster by `(segment, biasKind,
/// globalHistogramHandle)`, weighted by byte size.
pub struct RenderedTileCache {
    cache: Cache<RenderedTileKey, Arc<RenderedTile>>,
    stats: Arc<CacheStats>,
}

impl RenderedTileCache {
    /// Builds an empty cache capped at
    /// `config.buffered_image_cache_size_bytes` total weight, where weight
    /// is `width * height * 4` bytes.
    pub fn new(config: &mosaic_core::CoreConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        let eviction_stats = stats.clone();
        let cache = Cache::builder()
            .max_capacity(config.buffered_image_cache_size_bytes)
            .weigher(|_: &RenderedTileKey, v: &Arc<RenderedTile>| v.byte_weight())
            .eviction_listener(move |_, _, _| eviction_stats.record_eviction())
            .build();
        Self { cache, stats }
    }

    /// Observability counters for this tier.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Renders (or returns the cached render of) `segment` under
    /// `bias_kind` and `colormap`.
    ///
    /// `global` is `Some((key, histogram))` for `scaleMode = GLOBAL`
    /// renders; `None` selects the per-segment ("AMPLIFIER") histogram
    /// path.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(file = %segment.file, hdu = segment.hdu_ordinal, ?bias_kind, colormap = colormap.name()))]
    pub async fn get(
        &self,
        segment: &Arc<Segment>,
        bias_kind: BiasKind,
        colormap: &Colormap,
        raw_data: &RawDataCache,
        bias_factors: &BiasFactorsCache,
        byte_reader: &ByteReader,
        global: Option<(GlobalHistogramKey, Arc<GlobalHistogram>)>,
    ) -> Result<Arc<RenderedTile>> {
        let key = RenderedTileKey {
            segment: segment.cache_key(),
            bias_kind,
            global_histogram: global.as_ref().map(|(k, _)| k.clone()),
        };
        let had_entry = self.cache.contains_key(&key);
        let stats = self.stats.clone();
        let segment = segment.clone();
        let colormap = colormap.clone();
        let global_histogram = global.map(|(_, h)| h);

        let result = self
            .cache
            .try_get_with(key, async move {
                let started = Instant::now();
                let raw = raw_data.get(&segment, byte_reader).await?;
                let factors = bias_factors.get(&segment, bias_kind, raw_data, byte_reader).await?;

                let source = match &global_histogram {
                    Some(histogram) => ScaleSource::Global(histogram),
                    None => ScaleSource::PerSegment,
                };
                let tile = render_tile(&segment, &raw, factors.as_ref(), source, &colormap);

                stats.record_miss(started.elapsed());
                trace!(bytes = tile.byte_weight(), "tile rendered");
                Ok::<_, Error>(Arc::new(tile))
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

    #[tokio::test]
    async fn renders_and_caches_a_tile() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for v in [10i32, 20, 30, 40] {
            tmp.write_all(&v.to_be_bytes()).unwrap();
        }
        let path = tmp.path().to_str().unwrap().to_string();

        let segment = Arc::new(Segment {
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
        });

        let reader = ByteReader::new(Duration::from_secs(60));
        let raw_cache = RawDataCache::new(&CoreConfig::defaults());
        let bias_cache = BiasFactorsCache::new(&CoreConfig::defaults());
        let tile_cache = RenderedTileCache::new(&CoreConfig::defaults());
        let colormap = Colormap::by_name("grey").unwrap();

        let tile = tile_cache
            .get(&segment, BiasKind::None, &colormap, &raw_cache, &bias_cache, &reader, None)
            .await
            .unwrap();
        assert_eq!(tile.width, 2);
        assert_eq!(tile_cache.stats().snapshot().misses, 1);

        let cached = tile_cache
            .get(&segment, BiasKind::None, &colormap, &raw_cache, &bias_cache, &reader, None)
            .await
            .unwrap();
        assert_eq!(cached.get(0, 0), tile.get(0, 0));
        assert_eq!(tile_cache.stats().snapshot().hits, 1);
    }
}
