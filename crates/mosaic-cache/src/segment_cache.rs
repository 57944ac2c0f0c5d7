//! Segment cache: `spec.md` §4.8 table, row 2.
//!
//! The loader is the Segment Metadata Decoder (C2, `mosaic_fits::decode_segments`),
//! which needs the source FITS file's bytes in full — unlike RawData's
//! loader, which only ever fetches the one byte range a segment's data
//! block occupies, C2 must walk every HDU header in sequence to discover
//! where the next one starts. That makes this tier's own fetch a whole-file
//! read rather than a call through `mosaic_io::ByteReader` (whose contract
//! is bounded ranged reads); see `DESIGN.md`.

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use mosaic_core::{Error, Result, Segment, SegmentDescriptor};
use mosaic_fits::FailureMode;
use mosaic_io::credentials;
use mosaic_io::objectstore::build_store;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::{instrument, trace};

use crate::keys::SegmentKey;
use crate::stats::CacheStats;

/// Caches the ordered list of [`Segment`]s decoded from one descriptor
/// under one WCS letter.
pub struct SegmentCache {
    cache: Cache<SegmentKey, Arc<Vec<Arc<Segment>>>>,
    stats: Arc<CacheStats>,
}

impl SegmentCache {
    /// Builds an empty cache capped per `config.segment_cache_size`.
    pub fn new(config: &mosaic_core::CoreConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        let eviction_stats = stats.clone();
        let cache = Cache::builder()
            .max_capacity(config.segment_cache_size)
            .eviction_listener(move |_, _, _| eviction_stats.record_eviction())
            .build();
        Self { cache, stats }
    }

    /// Observability counters for this tier.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Decodes (or returns the cached decode of) every amplifier segment
    /// named by `descriptor` under `wcs_letter`.
    #[instrument(skip(self))]
    pub async fn get(&self, descriptor: &str, wcs_letter: char) -> Result<Arc<Vec<Arc<Segment>>>> {
        let key = SegmentKey { descriptor: descriptor.to_string(), wcs_letter };
        let had_entry = self.cache.contains_key(&key);
        let stats = self.stats.clone();
        let owned_descriptor = descriptor.to_string();

        let result = self
            .cache
            .try_get_with(key, async move {
                let started = Instant::now();
                let parsed = SegmentDescriptor::parse(&owned_descriptor)?;
                let file = match parsed {
                    SegmentDescriptor::FileUrl(file) => file,
                    SegmentDescriptor::Daq { .. } => {
                        return Err(Error::Unsupported(format!("DAQ descriptor: {owned_descriptor}")));
                    }
                };

                let (bytes, file_size) = fetch_whole_file(&file).await?;
                let segments = mosaic_fits::decode_segments(&bytes, &file, file_size, wcs_letter, FailureMode::Tolerant)?
                    .into_iter()
                    .map(Arc::new)
                    .collect::<Vec<_>>();

                stats.record_miss(started.elapsed());
                trace!(count = segments.len(), "segments decoded");
                Ok::<_, Error>(Arc::new(segments))
            })
            .await;

        if had_entry {
            self.stats.record_hit();
        }

        result.map_err(|e: Arc<Error>| (*e).clone())
    }
}

/// Fetches an entire file's bytes plus its length, from either the local
/// filesystem or an `s3:` object-store endpoint.
async fn fetch_whole_file(file: &str) -> Result<(Vec<u8>, u64)> {
    if let Some(rest) = file.strip_prefix("s3:") {
        let (endpoint, bucket, object) = parse_s3_url(rest, file)?;
        let creds = credentials::resolve(&endpoint)?;
        let store = build_store(&creds, &bucket)?;
        let path = ObjectPath::from(object);
        let result = store
            .get(&path)
            .await
            .map_err(|e| Error::TransientIo(format!("{file}: {e}")))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| Error::TransientIo(format!("{file}: {e}")))?;
        let len = bytes.len() as u64;
        Ok((bytes.to_vec(), len))
    } else {
        let bytes = tokio::fs::read(file).await.map_err(|e| Error::Io(format!("{file}: {e}")))?;
        let len = bytes.len() as u64;
        Ok((bytes, len))
    }
}

fn parse_s3_url(rest: &str, whole: &str) -> Result<(String, String, String)> {
    let (endpoint, rest) = rest
        .split_once('/')
        .ok_or_else(|| Error::MalformedDescriptor(whole.to_string()))?;
    let (bucket, object) = rest
        .split_once('/')
        .ok_or_else(|| Error::MalformedDescriptor(whole.to_string()))?;
    Ok((endpoint.to_string(), bucket.to_string(), object.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::CoreConfig;

    #[tokio::test]
    async fn daq_descriptor_is_unsupported_and_not_cached() {
        let cache = SegmentCache::new(&CoreConfig::defaults());
        let err = cache.get("DAQ:p:f/i:r/b", '4').await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert_eq!(cache.stats().snapshot().misses, 0);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let cache = SegmentCache::new(&CoreConfig::defaults());
        let err = cache.get("/no/such/file.fits", '4').await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
