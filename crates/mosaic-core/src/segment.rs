//! The [`Segment`] record and the [`SegmentDescriptor`] string it is built
//! from.
//!
//! A `Segment` is immutable after construction: everything the downstream
//! decoder/renderer stages need (byte ranges, compression parameters, the
//! WCS affine) is resolved once by the Segment Metadata Decoder (C2) and
//! never mutated again. Caches hand out `Arc<Segment>` so sharing never
//! requires cloning the affine or the descriptor string.

use std::hash::{Hash, Hasher};

use crate::{Affine, Rect};

/// Pixel sample format of a segment's raw data, mirroring FITS `BITPIX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// `BITPIX = 32`: signed 32-bit integer samples.
    Int32,
    /// `BITPIX = -32`: IEEE single-precision float samples.
    Float32,
}

/// Tile-compression scheme used for a compressed image HDU.
///
/// Only the two kinds required by `spec.md` §1 (Non-goals) are modeled;
/// any other `ZCMPTYPE` value fails at decode time with
/// [`crate::Error::UnsupportedCompression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    /// `ZCMPTYPE = 'RICE_1'`.
    Rice1,
    /// `ZCMPTYPE = 'GZIP_2'` (byte-shuffled gzip).
    Gzip2,
}

/// An opaque string identifying one CCD/extension to render.
///
/// Two dialects are recognized (`spec.md` §3): a filesystem path or
/// object-store URL naming a FITS file directly, and the DAQ dialect
/// `DAQ:<partition>:<folder>/<image>:<raft>/<reb>`, which is parsed but not
/// implemented — decoding a DAQ descriptor always fails with
/// [`crate::Error::Unsupported`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentDescriptor {
    /// A filesystem path or `s3:`/other object-store URL naming a FITS file.
    FileUrl(String),
    /// The DAQ live-readout dialect. Recognized, never implemented.
    Daq {
        /// Partition name.
        partition: String,
        /// Folder/image pair identifying the exposure.
        folder_image: String,
        /// Raft/REB pair identifying the readout board.
        raft_reb: String,
    },
}

impl SegmentDescriptor {
    /// Parses a raw descriptor string from an index stream line.
    ///
    /// Recognizes the `DAQ:` prefix; anything else is treated as a file or
    /// object-store URL and accepted as-is (FITS opening happens later, at
    /// decode time, where a nonexistent path becomes an `Io` error rather
    /// than a parse error here).
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(crate::Error::MalformedDescriptor("empty descriptor".into()));
        }
        if let Some(rest) = raw.strip_prefix("DAQ:") {
            let mut parts = rest.splitn(3, ':');
            let partition = parts.next().unwrap_or_default();
            let folder_image = parts.next().unwrap_or_default();
            let raft_reb = parts.next().unwrap_or_default();
            if partition.is_empty() || folder_image.is_empty() || raft_reb.is_empty() {
                return Err(crate::Error::MalformedDescriptor(raw.to_string()));
            }
            return Ok(SegmentDescriptor::Daq {
                partition: partition.to_string(),
                folder_image: folder_image.to_string(),
                raft_reb: raft_reb.to_string(),
            });
        }
        Ok(SegmentDescriptor::FileUrl(raw.to_string()))
    }
}

/// Amplifier/CCD identity plus geometry and compression parameters for one
/// FITS image extension, resolved once by the Segment Metadata Decoder (C2).
///
/// # Invariants
///
/// - `datasec ⊆ [0, n_axis1) × [0, n_axis2)`.
/// - `wcs` is the axis-aligned bounding box of the affine's image of
///   `datasec` (see [`Rect::bounding_box`]).
/// - Identity for caching/equality purposes is `(file, hdu_ordinal,
///   wcs_letter)` only — see [`Segment::cache_key`].
#[derive(Debug, Clone)]
pub struct Segment {
    /// Source FITS file URL (filesystem path or object-store URL).
    pub file: String,
    /// Ordinal position of this HDU within the file.
    pub hdu_ordinal: usize,
    /// Byte offset of the data block within `file`.
    pub data_offset: u64,
    /// Byte length of the data block as stored on disk (compressed or not).
    pub data_length: u64,
    /// File size at decode time, used as a freshness witness.
    pub file_size_witness: u64,
    /// Full pixel dimensions `(n_axis1, n_axis2)`.
    pub dims: (u32, u32),
    /// Pixel sample format.
    pub sample_format: SampleFormat,
    /// `Some(kind)` if this HDU stores tile-compressed data.
    pub compression: Option<CompressionKind>,
    /// Compressed-table tile dimensions `(c_axis1, c_axis2)`, meaningful
    /// only when `compression.is_some()`.
    pub tile_dims: (u32, u32),
    /// The science-pixel data region, zero-based half-open.
    pub datasec: Rect,
    /// Raft bay name (`RAFTBAY`), e.g. `"R22"`.
    pub raft: String,
    /// CCD slot name (`CCDSLOT`/`SENSNAME`), e.g. `"S11"`.
    pub ccd_slot: String,
    /// Amplifier/segment name within the CCD.
    pub segment_name: String,
    /// WCS alternate-axis letter actually used to build `affine` (after the
    /// `Q`→`E` substitution described in `spec.md` §4.2).
    pub wcs_letter: char,
    /// Segment-local-pixel to focal-plane affine transform.
    pub affine: Affine,
    /// Axis-aligned bounding box of `affine` applied to `datasec`, used for
    /// source-region filtering.
    pub wcs: crate::FRect,
}

impl Segment {
    /// The `(file, hdu_ordinal, wcs_letter)` triple that defines this
    /// segment's cache identity, per the testable invariant in `spec.md`
    /// §8: two segments built from identical inputs must be equal.
    pub fn cache_key(&self) -> (String, usize, char) {
        (self.file.clone(), self.hdu_ordinal, self.wcs_letter)
    }

    /// `true` if this segment's raw data is tile-compressed.
    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cache_key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_descriptor() {
        let d = SegmentDescriptor::parse("/data/raw/MC_C_20231012_000123.fits").unwrap();
        assert_eq!(
            d,
            SegmentDescriptor::FileUrl("/data/raw/MC_C_20231012_000123.fits".into())
        );
    }

    #[test]
    fn parses_daq_descriptor() {
        let d = SegmentDescriptor::parse("DAQ:part0:folder/image:R22/Reb0").unwrap();
        match d {
            SegmentDescriptor::Daq { partition, folder_image, raft_reb } => {
                assert_eq!(partition, "part0");
                assert_eq!(folder_image, "folder/image");
                assert_eq!(raft_reb, "R22/Reb0");
            }
            _ => panic!("expected DAQ descriptor"),
        }
    }

    #[test]
    fn rejects_malformed_daq_descriptor() {
        assert!(SegmentDescriptor::parse("DAQ:only_partition").is_err());
        assert!(SegmentDescriptor::parse("").is_err());
    }

    fn sample_segment(hdu: usize, wcs_letter: char) -> Segment {
        Segment {
            file: "/data/exp.fits".into(),
            hdu_ordinal: hdu,
            data_offset: 2880,
            data_length: 4096 * 4004 * 4,
            file_size_witness: 123456,
            dims: (4096, 4004),
            sample_format: SampleFormat::Int32,
            compression: None,
            tile_dims: (0, 0),
            datasec: Rect::new(10, 0, 4000, 4000),
            raft: "R22".into(),
            ccd_slot: "S11".into(),
            segment_name: "AMP01".into(),
            wcs_letter,
            affine: Affine::IDENTITY,
            wcs: crate::FRect::new(0.0, 0.0, 4000.0, 4000.0),
        }
    }

    #[test]
    fn equality_depends_only_on_cache_key() {
        let mut a = sample_segment(12, '4');
        let mut b = sample_segment(12, '4');
        b.data_offset = 999; // differs, but not part of cache key
        assert_eq!(a, b);

        a.hdu_ordinal = 13;
        assert_ne!(a, b);
    }
}
