//! # mosaic-core
//!
//! Shared data model and error vocabulary for the focal-plane mosaic render
//! core.
//!
//! This crate provides the types every other `mosaic-*` crate builds on:
//!
//! - [`Segment`], [`SegmentDescriptor`] — one amplifier's identity and geometry
//! - [`RawData`], [`RawBuffer`] — decoded pixel buffers
//! - [`Histogram`], [`GlobalHistogram`] — 18-bit pixel-value histograms
//! - [`RenderedTile`] — the RGB raster produced per segment
//! - [`CorrectionFactors`], [`BiasKind`] — the bias-correction capability and menu
//! - [`Affine`], [`Rect`], [`FRect`] — geometry
//! - [`Error`], [`Result`] — the shared error vocabulary
//! - [`CoreConfig`] — process-wide cache-size configuration
//!
//! ## Crate structure
//!
//! This crate has no internal dependencies; every other crate in the
//! workspace depends on it:
//!
//! ```text
//! mosaic-core (this crate)
//!    ^
//!    |
//!    +-- mosaic-fits (FITS decode, decompression)
//!    +-- mosaic-io (index reader, byte reader)
//!    +-- mosaic-render (bias kernels, histogram engine, tile renderer)
//!    +-- mosaic-color (colormap menu)
//!    +-- mosaic-cache (the cache fabric)
//!    +-- mosaic-controller (render request orchestration)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod affine;
pub mod config;
pub mod correction;
pub mod error;
pub mod histogram;
pub mod raw;
pub mod rect;
pub mod segment;
pub mod tile;

pub use affine::Affine;
pub use config::CoreConfig;
pub use correction::{BiasKind, CorrectionFactors, NoOp};
pub use error::{Error, Result};
pub use histogram::{GlobalHistogram, Histogram, BIN_COUNT};
pub use raw::{RawBuffer, RawData};
pub use rect::{FRect, Rect};
pub use segment::{CompressionKind, SampleFormat, Segment, SegmentDescriptor};
pub use tile::RenderedTile;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use mosaic_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::affine::Affine;
    pub use crate::config::CoreConfig;
    pub use crate::correction::{BiasKind, CorrectionFactors, NoOp};
    pub use crate::error::{Error, Result};
    pub use crate::histogram::{GlobalHistogram, Histogram};
    pub use crate::raw::{RawBuffer, RawData};
    pub use crate::rect::{FRect, Rect};
    pub use crate::segment::{CompressionKind, SampleFormat, Segment, SegmentDescriptor};
    pub use crate::tile::RenderedTile;
}
