//! Tile-wise RICE_1 and GZIP_2 decompression of FITS compressed-image data
//! (`spec.md` §4.4).
//!
//! Compressed HDUs store a binary table whose rows are independently
//! compressed image rows: `cAxis1*cAxis2` bytes of tile directory followed
//! by the concatenated tile payloads. The directory is `(cAxis1*cAxis2)/4`
//! big-endian `i32` entries laid out as `(length_i, offset_i)` pairs; only
//! `length_i` is consulted since payloads are stored in directory order.

use mosaic_core::{CompressionKind, Error, Result};

use crate::raw::DecodedSamples;

/// Position of the most significant 1-bit for each byte value `0..256`,
/// used by the Rice "normal" branch to count leading zero bits without a
/// `leading_zeros` call per bit.
const NONZERO_COUNT: [i32; 256] = [
    0, 1, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5,
    6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6,
    7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7,
    7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7,
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
];

/// `FSBITS`/`FSMAX`/`BBITS` Rice tuning parameters. `spec.md` fixes
/// `bytePix=4` for this core; the full table is kept since it is a closed
/// expression of the cfitsio-compatible scheme and costs nothing extra.
struct RiceParams {
    fsbits: i32,
    fsmax: i32,
    bbits: i32,
    bytes_per_val: usize,
}

impl RiceParams {
    fn for_byte_pix(byte_pix: usize) -> Result<Self> {
        match byte_pix {
            1 => Ok(RiceParams { fsbits: 3, fsmax: 6, bbits: 8, bytes_per_val: 1 }),
            2 => Ok(RiceParams { fsbits: 4, fsmax: 14, bbits: 16, bytes_per_val: 2 }),
            4 => Ok(RiceParams { fsbits: 5, fsmax: 25, bbits: 32, bytes_per_val: 4 }),
            other => Err(Error::Internal(format!("unsupported Rice bytePix: {other}"))),
        }
    }
}

const RICE_BLOCK_SIZE: usize = 32;
const RICE_BYTE_PIX: usize = 4;

/// Decompresses one Rice-encoded tile into `num_pixels` 32-bit values.
fn rice_decompress(compressed: &[u8], num_pixels: usize) -> Result<Vec<i32>> {
    let params = RiceParams::for_byte_pix(RICE_BYTE_PIX)?;
    if compressed.len() < params.bytes_per_val {
        return Err(Error::Internal("Rice tile shorter than one sample".into()));
    }
    if num_pixels == 0 {
        return Ok(Vec::new());
    }

    let mut output = Vec::with_capacity(num_pixels);
    let mut pos = 0usize;

    let mut lastpix: i32 = match params.bytes_per_val {
        1 => compressed[0] as i8 as i32,
        2 => i16::from_be_bytes([compressed[0], compressed[1]]) as i32,
        4 => i32::from_be_bytes([compressed[0], compressed[1], compressed[2], compressed[3]]),
        _ => unreachable!(),
    };
    pos += params.bytes_per_val;

    if pos >= compressed.len() {
        return Ok(vec![lastpix; num_pixels]);
    }

    let mut b: u32 = compressed[pos] as u32;
    pos += 1;
    let mut nbits: i32 = 8;

    let nx = num_pixels as i32;
    let nblock = RICE_BLOCK_SIZE as i32;
    let mut pixel_idx: i32 = 0;

    while pixel_idx < nx {
        let imax = (pixel_idx + nblock).min(nx);

        nbits -= params.fsbits;
        while nbits < 0 {
            b = (b << 8) | (compressed.get(pos).copied().unwrap_or(0) as u32);
            pos += 1;
            nbits += 8;
        }
        let fs = ((b >> nbits) as i32) - 1;
        b &= (1u32 << nbits) - 1;

        if fs < 0 {
            while pixel_idx < imax {
                output.push(lastpix);
                pixel_idx += 1;
            }
        } else if fs == params.fsmax {
            while pixel_idx < imax {
                let mut k = params.bbits - nbits;
                let mut diff = (b as u64) << k;
                k -= 8;
                while k >= 0 {
                    b = compressed.get(pos).copied().unwrap_or(0) as u32;
                    pos += 1;
                    diff |= (b as u64) << k;
                    k -= 8;
                }
                if nbits > 0 {
                    b = compressed.get(pos).copied().unwrap_or(0) as u32;
                    pos += 1;
                    diff |= (b >> (-k)) as u64;
                    b &= (1u32 << nbits) - 1;
                } else {
                    b = 0;
                }
                let diff = zigzag_decode(diff as u32);
                lastpix = diff.wrapping_add(lastpix);
                output.push(lastpix);
                pixel_idx += 1;
            }
        } else {
            while pixel_idx < imax {
                while b == 0 {
                    nbits += 8;
                    match compressed.get(pos) {
                        Some(&byte) => {
                            b = byte as u32;
                            pos += 1;
                        }
                        None => break,
                    }
                }
                let nzero = nbits - NONZERO_COUNT[(b & 0xFF) as usize];
                nbits -= nzero + 1;
                if !(0..=31).contains(&nbits) {
                    while pixel_idx < imax {
                        output.push(lastpix);
                        pixel_idx += 1;
                    }
                    break;
                }
                b ^= 1u32 << nbits;

                nbits -= fs;
                while nbits < 0 {
                    b = (b << 8) | (compressed.get(pos).copied().unwrap_or(0) as u32);
                    pos += 1;
                    nbits += 8;
                }

                let diff = ((nzero as u32) << fs) | (b >> nbits);
                b &= (1u32 << nbits) - 1;

                let diff = zigzag_decode(diff);
                lastpix = diff.wrapping_add(lastpix);
                output.push(lastpix);
                pixel_idx += 1;
            }
        }
    }

    Ok(output)
}

#[inline]
fn zigzag_decode(v: u32) -> i32 {
    if v & 1 == 0 {
        (v >> 1) as i32
    } else {
        !(v >> 1) as i32
    }
}

/// Un-shuffles FITS `GZIP_2` tile bytes after inflation: the shuffle filter
/// groups all byte-0's of each `item_size`-byte value together, then all
/// byte-1's, etc. (the same transform as HDF5's byte-shuffle filter,
/// applied per FITS's `GZIP_2` tile-compression convention so that
/// multi-byte big-endian samples compress better under plain deflate).
fn unshuffle(shuffled: &[u8], item_size: usize) -> Vec<u8> {
    if item_size <= 1 || shuffled.is_empty() {
        return shuffled.to_vec();
    }
    let n = shuffled.len() / item_size;
    let mut out = vec![0u8; n * item_size];
    for byte_pos in 0..item_size {
        let plane_start = byte_pos * n;
        for i in 0..n {
            out[i * item_size + byte_pos] = shuffled[plane_start + i];
        }
    }
    out
}

fn gzip2_decompress(compressed: &[u8], item_size: usize) -> Result<Vec<u8>> {
    let inflated = flate2::read::GzDecoder::new(compressed);
    use std::io::Read;
    let mut raw = Vec::new();
    inflated
        .take(u64::MAX)
        .read_to_end(&mut raw)
        .map_err(|e| Error::Internal(format!("gzip inflate failed: {e}")))?;
    Ok(unshuffle(&raw, item_size))
}

/// The tile directory for one compressed HDU: `(length, offset)` pairs read
/// from the leading `cAxis1*cAxis2` bytes of the fetched data range.
struct TileDirectory {
    entries: Vec<(u32, u32)>,
}

impl TileDirectory {
    fn parse(bytes: &[u8], c_axis1: u32, c_axis2: u32) -> Result<Self> {
        let directory_len = c_axis1 as usize * c_axis2 as usize;
        if bytes.len() < directory_len {
            return Err(Error::Internal("tile directory truncated".into()));
        }
        let entry_count = directory_len / 4;
        let mut entries = Vec::with_capacity(entry_count / 2);
        let mut i = 0;
        while i + 8 <= directory_len {
            let length = u32::from_be_bytes(bytes[i..i + 4].try_into().unwrap());
            let offset = u32::from_be_bytes(bytes[i + 4..i + 8].try_into().unwrap());
            entries.push((length, offset));
            i += 8;
        }
        Ok(TileDirectory { entries })
    }
}

/// Decompresses all tiles (one tile = one row) of a compressed HDU's fetched
/// byte range into a flat, row-major pixel buffer.
///
/// `n_axis1` is the number of pixels per row in the *uncompressed* image;
/// `c_axis2` is the number of tiles (rows) in the compressed table.
pub fn decompress_tiles(
    kind: CompressionKind,
    bytes: &[u8],
    n_axis1: u32,
    c_axis1: u32,
    c_axis2: u32,
    is_float: bool,
) -> Result<DecodedSamples> {
    let directory = TileDirectory::parse(bytes, c_axis1, c_axis2)?;
    let mut cursor = c_axis1 as usize * c_axis2 as usize;

    let mut int_out = if is_float { Vec::new() } else { Vec::with_capacity((n_axis1 * c_axis2) as usize) };
    let mut float_out = if is_float { Vec::with_capacity((n_axis1 * c_axis2) as usize) } else { Vec::new() };

    for &(length, _offset) in &directory.entries {
        let length = length as usize;
        if cursor + length > bytes.len() {
            return Err(Error::Internal("tile payload exceeds fetched range".into()));
        }
        let payload = &bytes[cursor..cursor + length];
        cursor += length;

        match kind {
            CompressionKind::Rice1 => {
                let samples = rice_decompress(payload, n_axis1 as usize)?;
                if is_float {
                    float_out.extend(samples.iter().map(|&v| f32::from_bits(v as u32)));
                } else {
                    int_out.extend_from_slice(&samples);
                }
            }
            CompressionKind::Gzip2 => {
                let raw = gzip2_decompress(payload, 4)?;
                if is_float {
                    float_out.extend(raw.chunks_exact(4).map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]])));
                } else {
                    int_out.extend(raw.chunks_exact(4).map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]])));
                }
            }
        }
    }

    Ok(if is_float {
        DecodedSamples::Float32(float_out)
    } else {
        DecodedSamples::Int32(int_out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rice_low_entropy_repeats_first_pixel() {
        // First pixel 42 (i32 big-endian), then an all-zero FS nibble block.
        let mut data = vec![0u8, 0, 0, 42];
        data.push(0x00); // fsbits=5 zero nibble -> fs = -1 (low entropy)
        let out = rice_decompress(&data, 5).unwrap();
        assert_eq!(out, vec![42, 42, 42, 42, 42]);
    }

    #[test]
    fn unshuffle_inverts_shuffle_for_4_byte_items() {
        // Two 4-byte big-endian values: 0x01020304, 0x05060708.
        // Shuffled form: all byte0s, then byte1s, etc.
        let shuffled = [0x01, 0x05, 0x02, 0x06, 0x03, 0x07, 0x04, 0x08];
        let restored = unshuffle(&shuffled, 4);
        assert_eq!(restored, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn tile_directory_parses_length_offset_pairs() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&200u32.to_be_bytes());
        bytes.extend_from_slice(&100u32.to_be_bytes());
        let dir = TileDirectory::parse(&bytes, 16, 1).unwrap();
        assert_eq!(dir.entries, vec![(100, 0), (200, 100)]);
    }
}
