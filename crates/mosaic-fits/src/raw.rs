//! Decoded-but-not-yet-shared pixel samples, produced by the decompressor
//! or the uncompressed reader before being wrapped into the cache-facing
//! [`mosaic_core::RawBuffer`].

use std::sync::Arc;

use mosaic_core::RawBuffer;

/// Plain, unshared decoded samples in host-native byte order.
#[derive(Debug, Clone)]
pub enum DecodedSamples {
    /// `BITPIX = 32` samples.
    Int32(Vec<i32>),
    /// `BITPIX = -32` samples.
    Float32(Vec<f32>),
}

impl DecodedSamples {
    /// Wraps these samples into the shared, cache-facing [`RawBuffer`].
    pub fn into_raw_buffer(self) -> RawBuffer {
        match self {
            DecodedSamples::Int32(v) => RawBuffer::Int32(Arc::from(v)),
            DecodedSamples::Float32(v) => RawBuffer::Float32(Arc::from(v)),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            DecodedSamples::Int32(v) => v.len(),
            DecodedSamples::Float32(v) => v.len(),
        }
    }

    /// `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_into_shared_buffer() {
        let samples = DecodedSamples::Int32(vec![1, 2, 3]);
        let buf = samples.into_raw_buffer();
        assert_eq!(buf.len(), 3);
    }
}
