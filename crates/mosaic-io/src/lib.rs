//! # mosaic-io
//!
//! Source Index Reader (C1) and Byte Reader (C3): ordered segment-descriptor
//! discovery and async ranged fetch of the raw bytes behind a segment, from
//! either a local file or an `s3:`-scheme object store endpoint.
//!
//! Decoding those bytes into pixels (`mosaic-fits`) and weaving the results
//! into a render (`mosaic-cache`, `mosaic-controller`) live elsewhere; this
//! crate only gets bytes off disk or the network.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod byte_reader;
pub mod credentials;
pub mod index;
pub mod objectstore;

pub use byte_reader::ByteReader;
pub use index::read_index;
