//! Index cache: `spec.md` §4.8 table, row 1.
//!
//! Keyed by the index stream's path; the loader reads the whole file and
//! runs it through the Source Index Reader (C1, `mosaic_io::read_index`).
//! Local filesystem paths only — the index stream is read once per render
//! and is not part of the byte-range-fetch contract `mosaic-io::ByteReader`
//! exists for, so a plain `tokio::fs` read stands in here (see
//! `DESIGN.md`).

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use mosaic_core::{CoreConfig, Error, Result};
use moka::future::Cache;
use tracing::{instrument, trace};

use crate::stats::CacheStats;

/// Caches an index stream's decoded descriptor list by path.
pub struct IndexCache {
    cache: Cache<String, Arc<Vec<String>>>,
    stats: Arc<CacheStats>,
}

impl IndexCache {
    /// Builds an empty cache capped per `config.lines_cache_size`.
    pub fn new(config: &CoreConfig) -> Self {
        let stats = Arc::new(CacheStats::default());
        let eviction_stats = stats.clone();
        let cache = Cache::builder()
            .max_capacity(config.lines_cache_size)
            .eviction_listener(move |_, _, _| eviction_stats.record_eviction())
            .build();
        Self { cache, stats }
    }

    /// Observability counters for this tier.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Returns the descriptor list for `path`, reading and parsing it on
    /// first access and serving every concurrent caller the same in-flight
    /// future thereafter.
    #[instrument(skip(self))]
    pub async fn get(&self, path: &str) -> Result<Arc<Vec<String>>> {
        let stats = self.stats.clone();
        let owned_path = path.to_string();
        let had_entry = self.cache.contains_key(path);
        let result = self
            .cache
            .try_get_with(path.to_string(), async move {
                let started = Instant::now();
                let bytes = tokio::fs::read(&owned_path)
                    .await
                    .map_err(|e| Error::Io(format!("{owned_path}: {e}")))?;
                let lines = mosaic_io::read_index(Cursor::new(bytes))?;
                stats.record_miss(started.elapsed());
                trace!(count = lines.len(), "index loaded");
                Ok::<_, Error>(Arc::new(lines))
            })
            .await;

        if had_entry {
            self.stats.record_hit();
        }

        result.map_err(|e: Arc<Error>| (*e).clone())
    }
}
