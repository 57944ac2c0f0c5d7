//! # mosaic-controller
//!
//! Render Controller (C9): the entry point a host calls to render one
//! rectangular region of the focal plane. Accepts a [`RenderRequest`],
//! walks the [`mosaic_cache::CacheFabric`] to resolve segments and their
//! rendered tiles, and composites them onto an [`OutputRaster`] under each
//! segment's affine.
//!
//! This crate owns none of the data model, decoding, or caching logic —
//! it is pure orchestration over `mosaic-cache`'s five-tier graph, fanning
//! requests out with `tokio::task::JoinSet` and joining them back into one
//! render call, per `spec.md` §4.9 and the fan-out/fan-in design note in
//! §9.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod controller;
pub mod output;
pub mod request;

pub use controller::{RenderController, RenderSummary};
pub use output::{OutputRaster, RasterBuffer};
pub use request::{RenderRequest, ScaleMode};
