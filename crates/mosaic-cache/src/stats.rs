//! Per-cache observability counters (`spec.md` §4.8: "hit count, miss
//! count, load time, eviction count").

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Hit/miss/load-time/eviction counters for one cache tier.
///
/// All fields are atomics rather than behind a lock since every cache tier
/// is read from an unbounded number of worker threads (`spec.md` §5).
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    load_nanos_total: AtomicU64,
    evictions: AtomicU64,
}

/// A point-in-time read of a [`CacheStats`], suitable for the periodic
/// 60-second reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Total cache hits since construction.
    pub hits: u64,
    /// Total cache misses (loader invocations) since construction.
    pub misses: u64,
    /// Total time spent inside loaders, summed across every miss.
    pub load_time_total: Duration,
    /// Total entries evicted since construction.
    pub evictions: u64,
}

impl CacheStats {
    /// Records a cache hit (the key was already present).
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache miss and the loader's wall-clock duration.
    pub fn record_miss(&self, load_time: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.load_nanos_total
            .fetch_add(load_time.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records one evicted entry. Intended to be called from a
    /// `moka::future::Cache` eviction listener.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads the current counters without resetting them.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            load_time_total: Duration::from_nanos(self.load_nanos_total.load(Ordering::Relaxed)),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_calls() {
        let stats = CacheStats::default();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss(Duration::from_millis(5));
        stats.record_eviction();

        let snap = stats.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.evictions, 1);
        assert_eq!(snap.load_time_total, Duration::from_millis(5));
    }
}
