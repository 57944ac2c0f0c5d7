//! # mosaic-fits
//!
//! FITS header decoding and tile-wise decompression.
//!
//! This crate implements the Segment Metadata Decoder (C2) and the
//! Decompressor (C4): parsing FITS headers, resolving world-coordinate
//! affines, and inflating `RICE_1`/`GZIP_2` compressed-image tiles into
//! host-native pixel buffers. It operates on in-memory byte slices; the
//! asynchronous fetch of those bytes from a file or object store is
//! `mosaic-io`'s concern, and the orchestration across the cache graph is
//! `mosaic-cache`'s.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod datasec;
pub mod decompress;
pub mod header;
pub mod raw;
pub mod read_raw;
pub mod segment_decoder;
pub mod uncompressed;
pub mod wcs;

pub use datasec::parse_datasec;
pub use read_raw::decode_raw_data;
pub use segment_decoder::{decode_segments, FailureMode};
