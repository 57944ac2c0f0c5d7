//! RawData cache: `spec.md` §4.8 table, row 3.
//!
//! The loader fetches `(segment.file, segment.data_offset, segment.data_length)`
//! through the Byte Reader (C3) and hands the bytes to the Decompressor
//! (C4) if the segment is tile-compressed.

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use mosaic_core::{Error, RawData, Result, Segment};
use mosaic_io::ByteReader;
use tracing::{instrument, trace};

use crate::keys::SegmentCacheKey;
use crate::stats::CacheStats;

/// Caches decoded pixel buffers by segment identity, weighted by byte size.
pub struct RawDataCache {
    cache: Cache<SegmentCacheKey, Arc<RawData>>,
    stats: Arc<CacheStats>,
}

impl RawDataCache {
    /// Builds an empty cache capped at `config.raw_data_cache_size_bytes`
    /// total weight, where weight is `bufferElements * 4` bytes.
    pub fn new(config: &mosaic_core::CoreConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        let eviction_stats = stats.clone();
        let cache = Cache::builder()
            .max_capacity(config.raw_data_cache_size_bytes)
            .weigher(|_: &SegmentCacheKey, v: &Arc<RawData>| v.byte_weight())
            .eviction_listener(move |_, _, _| eviction_stats.record_eviction())
            .build();
        Self { cache, stats }
    }

    /// Observability counters for this tier.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Fetches and decodes `segment`'s raw pixel buffer, or returns it from
    /// cache.
    #[instrument(skip(self, segment, byte_reader), fields(file = %segment.file, hdu = segment.hdu_ordinal))]
    pub async fn get(&self, segment: &Arc<Segment>, byte_reader: &ByteReader) -> Result<Arc<RawData>> {
        let key = segment.cache_key();
        let had_entry = self.cache.contains_key(&key);
        let stats = self.stats.clone();
        let segment = segment.clone();

        let result = self
            .cache
            .try_get_with(key, async move {
                let started = Instant::now();
                let bytes = byte_reader
                    .read(&segment.file, segment.data_offset, segment.data_length)
                    .await?;
                let raw = mosaic_fits::decode_raw_data(segment.clone(), &bytes)?;
                stats.record_miss(started.elapsed());
                trace!(bytes = raw.byte_weight(), "raw data decoded");
                Ok::<_, Error>(Arc::new(raw))
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

    fn tiny_segment(file: String, data_offset: u64) -> Arc<Segment> {
        Arc::new(Segment {
            file,
            hdu_ordinal: 1,
            data_offset,
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
    async fn decodes_and_caches_raw_data() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for v in [1i32, 2, 3, 4] {
            tmp.write_all(&v.to_be_bytes()).unwrap();
        }
        let path = tmp.path().to_str().unwrap().to_string();

        let segment = tiny_segment(path, 0);
        let reader = ByteReader::new(Duration::from_secs(60));
        let cache = RawDataCache::new(&CoreConfig::defaults());

        let raw = cache.get(&segment, &reader).await.unwrap();
        assert_eq!(raw.buffer.sample_as_i32(0), 1);
        assert_eq!(cache.stats().snapshot().misses, 1);

        let raw2 = cache.get(&segment, &reader).await.unwrap();
        assert_eq!(raw2.buffer.sample_as_i32(3), 4);
        assert_eq!(cache.stats().snapshot().hits, 1);
    }
}
