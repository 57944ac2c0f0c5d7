//! # mosaic-color
//!
//! The named colormap menu used to turn a CDF-normalized or min/max-rescaled
//! intensity fraction into an 8-bit RGB triple.
//!
//! `spec.md` §6 fixes the menu to nine names: `grey, a, b, bb, cubehelix0,
//! cubehelix1, rainbow, standard, null`. Each is a precomputed 256-entry
//! `[u8; 3]` table built from a closed-form generator at construction time
//! (there is no colormap *file* format in scope here — that parser is an
//! external collaborator per `spec.md` §1). [`Colormap::by_name`] is the
//! registry; an unrecognized name is [`mosaic_core::Error::UnknownStrategy`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod colormap;
mod generators;

pub use colormap::Colormap;
