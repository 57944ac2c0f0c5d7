//! Process-wide cache-size configuration.
//!
//! Read once at core initialization and snapshotted into the Cache Fabric;
//! runtime reconfiguration is out of scope (`spec.md` §9).

use std::time::Duration;

/// The six cache-size knobs of `spec.md` §6, plus the byte-reader handle
/// idle-expiry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreConfig {
    /// Max Segment-cache entries.
    pub segment_cache_size: u64,
    /// Max RawData cache weight, in bytes.
    pub raw_data_cache_size_bytes: u64,
    /// Max BiasFactors cache entries.
    pub bias_correction_cache_size: u64,
    /// Max RenderedTile cache weight, in bytes.
    pub buffered_image_cache_size_bytes: u64,
    /// Max GlobalHistogram cache entries.
    pub global_scaling_cache_size: u64,
    /// Max Index cache entries.
    pub lines_cache_size: u64,
    /// Idle-expiry for cached byte-reader handles (`spec.md` §4.3: 1 minute).
    pub handle_idle_expiry: Duration,
}

impl CoreConfig {
    /// The documented defaults from `spec.md` §6.
    pub const fn defaults() -> Self {
        Self {
            segment_cache_size: 10_000,
            raw_data_cache_size_bytes: 1_000_000_000,
            bias_correction_cache_size: 10_000,
            buffered_image_cache_size_bytes: 5_000_000_000,
            global_scaling_cache_size: 10_000,
            lines_cache_size: 10_000,
            handle_idle_expiry: Duration::from_secs(60),
        }
    }

    /// Builds a config by reading `MOSAIC_<FIELD>` environment overrides
    /// over the documented defaults. Malformed values are ignored in favor
    /// of the default rather than failing process startup.
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            segment_cache_size: env_u64("MOSAIC_SEGMENT_CACHE_SIZE", defaults.segment_cache_size),
            raw_data_cache_size_bytes: env_u64(
                "MOSAIC_RAW_DATA_CACHE_SIZE_BYTES",
                defaults.raw_data_cache_size_bytes,
            ),
            bias_correction_cache_size: env_u64(
                "MOSAIC_BIAS_CORRECTION_CACHE_SIZE",
                defaults.bias_correction_cache_size,
            ),
            buffered_image_cache_size_bytes: env_u64(
                "MOSAIC_BUFFERED_IMAGE_CACHE_SIZE_BYTES",
                defaults.buffered_image_cache_size_bytes,
            ),
            global_scaling_cache_size: env_u64(
                "MOSAIC_GLOBAL_SCALING_CACHE_SIZE",
                defaults.global_scaling_cache_size,
            ),
            lines_cache_size: env_u64("MOSAIC_LINES_CACHE_SIZE", defaults.lines_cache_size),
            handle_idle_expiry: Duration::from_secs(env_u64(
                "MOSAIC_HANDLE_IDLE_EXPIRY_SECS",
                defaults.handle_idle_expiry.as_secs(),
            )),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
