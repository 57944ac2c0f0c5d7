//! Histogram / Scaling Engine (C6): `spec.md` §4.6.
//!
//! Builds an 18-bit histogram of bias-corrected samples over a segment's
//! `datasec`, and derives the CDF-based byte mapping used to compress that
//! range into 8-bit greyscale before the colormap lookup.

use mosaic_core::{CorrectionFactors, GlobalHistogram, Histogram, RawData, Segment, BIN_COUNT};
use mosaic_color::Colormap;

/// Builds a histogram of `raw`'s buffer over `segment.datasec`, after
/// subtracting `factors` at each pixel and clamping negatives to zero.
pub fn build_histogram(raw: &RawData, segment: &Segment, factors: &dyn CorrectionFactors) -> Histogram {
    let (n_axis1, _) = segment.dims;
    let mut histogram = Histogram::new();
    for y in segment.datasec.y..segment.datasec.bottom() {
        for x in segment.datasec.x..segment.datasec.right() {
            let sample = raw.buffer.sample_as_i32((y as usize) * n_axis1 as usize + x as usize);
            let corrected = (sample - factors.at(x, y)).max(0);
            histogram.record(corrected);
        }
    }
    histogram
}

/// Prefix-sum CDF of a histogram's bin counts, as `u32`. Saturates rather
/// than overflows, since a single segment's sample count fits comfortably
/// in `u32` but a `GlobalHistogram`'s per-bin `u64` counts may not.
pub fn cdf(bins: impl Iterator<Item = u64>) -> Vec<u32> {
    let mut out = Vec::with_capacity(BIN_COUNT);
    let mut running: u64 = 0;
    for count in bins {
        running += count;
        out.push(running.min(u32::MAX as u64) as u32);
    }
    out
}

/// The CDF-derived byte-scaling map: `map[i]` is the RGB triple a raw
/// 18-bit corrected sample value of `i` renders to.
///
/// Only the `[lowest_occupied, highest_occupied]` range is populated;
/// outside it the map holds the colormap's zero-fraction entry, since tile
/// rendering never samples outside that range (`spec.md` §4.6).
pub struct ScalingMap {
    map: Vec<[u8; 3]>,
}

impl ScalingMap {
    /// Builds a scaling map from a histogram's CDF, the histogram's
    /// highest-occupied bin (used to compute `range`), and the colormap to
    /// look RGB up through.
    ///
    /// `range = 1 + cdf[highest] / 256` per `spec.md` §4.6; each occupied
    /// bin `i` maps to `colormap.rgb(cdf[i] / range)`, where `cdf[i] /
    /// range` already lands in (approximately) `[0, 256)` — it is an 8-bit
    /// colormap index, not a `[0, 1]` fraction.
    pub fn build(cdf: &[u32], lowest_occupied: Option<usize>, highest_occupied: Option<usize>, colormap: &Colormap) -> Self {
        let mut map = vec![colormap.rgb_byte(0); BIN_COUNT];
        let (Some(lowest), Some(highest)) = (lowest_occupied, highest_occupied) else {
            return Self { map };
        };
        let range = 1.0 + cdf[highest] as f64 / 256.0;
        for (i, entry) in map.iter_mut().enumerate().take(highest + 1).skip(lowest) {
            let byte = (cdf[i] as f64 / range).round().clamp(0.0, 255.0) as u8;
            *entry = colormap.rgb_byte(byte);
        }
        Self { map }
    }

    /// Looks up the RGB triple a bias-corrected, clamped-to-`[0, 2^18)`
    /// sample value maps to.
    pub fn get(&self, value: i32) -> [u8; 3] {
        let idx = value.clamp(0, (BIN_COUNT - 1) as i32) as usize;
        self.map[idx]
    }
}

/// Builds a `ScalingMap` from a per-segment histogram (the `scaleMode =
/// AMPLIFIER` path).
pub fn scaling_map_from_histogram(histogram: &Histogram, colormap: &Colormap) -> ScalingMap {
    let cdf = cdf(histogram.bins().iter().map(|&b| b as u64));
    ScalingMap::build(&cdf, histogram.lowest_occupied(), histogram.highest_occupied(), colormap)
}

/// Builds a `ScalingMap` from a global histogram merged across every
/// segment of an exposure (the `scaleMode = GLOBAL` path).
pub fn scaling_map_from_global(global: &GlobalHistogram, colormap: &Colormap) -> ScalingMap {
    let cdf = cdf(global.bins().iter().copied());
    ScalingMap::build(&cdf, global.lowest_occupied(), global.highest_occupied(), colormap)
}
