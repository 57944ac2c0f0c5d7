//! Reader for uncompressed FITS image data: big-endian samples, decoded to
//! host-native order.

use mosaic_core::{Error, Result, SampleFormat};

use crate::raw::DecodedSamples;

/// Decodes `count` samples of `format` from the big-endian byte range
/// `bytes`.
pub fn read_uncompressed(bytes: &[u8], format: SampleFormat, count: usize) -> Result<DecodedSamples> {
    let needed = count * 4;
    if bytes.len() < needed {
        return Err(Error::Internal(format!(
            "uncompressed data truncated: need {needed} bytes, have {}",
            bytes.len()
        )));
    }
    Ok(match format {
        SampleFormat::Int32 => DecodedSamples::Int32(
            bytes[..needed]
                .chunks_exact(4)
                .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        SampleFormat::Float32 => DecodedSamples::Float32(
            bytes[..needed]
                .chunks_exact(4)
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_int32() {
        let bytes = 7i32.to_be_bytes();
        let samples = read_uncompressed(&bytes, SampleFormat::Int32, 1).unwrap();
        match samples {
            DecodedSamples::Int32(v) => assert_eq!(v, vec![7]),
            _ => panic!("expected int32"),
        }
    }

    #[test]
    fn truncated_buffer_is_an_error() {
        let bytes = [0u8; 2];
        assert!(read_uncompressed(&bytes, SampleFormat::Int32, 1).is_err());
    }
}
