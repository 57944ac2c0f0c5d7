//! Cache key types for the fabric's five tiers.
//!
//! Every key below is a plain, cheaply-`Clone`-able value rather than a
//! reference, since `moka::future::Cache` stores keys by value and a
//! single-flight `get_with` call needs to move one into its loader future.

use mosaic_core::BiasKind;

/// Identity of a [`mosaic_core::Segment`], reused verbatim as the RawData,
/// BiasFactors, and RenderedTile cache key component — see
/// [`mosaic_core::Segment::cache_key`].
pub type SegmentCacheKey = (String, usize, char);

/// Segment cache key: a descriptor string plus the WCS letter it was
/// decoded under.
///
/// `wcsOverride` is part of the Segment cache key in `spec.md` §4.8, but
/// the Segment Metadata Decoder this fabric calls into does not yet accept
/// an override parameter — see `DESIGN.md`. The key is shaped so adding it
/// later is a non-breaking field addition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    /// The raw descriptor string from the index stream.
    pub descriptor: String,
    /// The WCS alternate-axis letter requested.
    pub wcs_letter: char,
}

/// BiasFactors cache key: a segment identity plus the bias strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BiasFactorsKey {
    /// The segment this correction was computed for.
    pub segment: SegmentCacheKey,
    /// The bias strategy requested.
    pub bias_kind: BiasKind,
}

/// RenderedTile cache key: segment identity, bias strategy, and (if
/// `scaleMode = GLOBAL`) the global-histogram handle the tile was rendered
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderedTileKey {
    /// The segment this tile was rendered for.
    pub segment: SegmentCacheKey,
    /// The bias strategy applied before scaling.
    pub bias_kind: BiasKind,
    /// `Some(handle)` when rendered under a merged exposure-wide histogram.
    pub global_histogram: Option<GlobalHistogramKey>,
}

/// GlobalHistogram cache key: the ordered list of segment identities merged
/// together, plus the bias strategy applied before each per-segment
/// histogram was built.
///
/// Order is significant for reproducibility (`spec.md` §5) even though the
/// merge itself is commutative: two requests naming the same segments in a
/// different order are different cache entries, matching the literal key
/// shape in `spec.md` §4.8 ("list of Segments") rather than a
/// order-independent set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalHistogramKey {
    /// The segments merged into this histogram, in request order.
    pub segments: Vec<SegmentCacheKey>,
    /// The bias strategy applied to every segment before merging.
    pub bias_kind: BiasKind,
}
