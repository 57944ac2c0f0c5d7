//! Dispatches a segment's fetched data bytes to the decompressor or the
//! uncompressed reader, producing the shared [`RawData`] the cache hands
//! out to downstream consumers.

use std::sync::Arc;

use mosaic_core::{RawData, Result, Segment};
use tracing::trace;

use crate::decompress::decompress_tiles;
use crate::uncompressed::read_uncompressed;

/// Decodes `bytes` (the segment's data-block byte range, as fetched by the
/// Byte Reader) into a [`RawData`] for `segment`.
pub fn decode_raw_data(segment: Arc<Segment>, bytes: &[u8]) -> Result<RawData> {
    let is_float = matches!(segment.sample_format, mosaic_core::SampleFormat::Float32);

    let samples = if let Some(kind) = segment.compression {
        trace!(hdu = segment.hdu_ordinal, ?kind, "decompressing tiles");
        decompress_tiles(kind, bytes, segment.dims.0, segment.tile_dims.0, segment.tile_dims.1, is_float)?
    } else {
        let count = segment.dims.0 as usize * segment.dims.1 as usize;
        read_uncompressed(bytes, segment.sample_format, count)?
    };

    Ok(RawData::new(segment, samples.into_raw_buffer()))
}
