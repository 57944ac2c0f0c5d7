//! [`Colormap`]: a named, precomputed 256-entry RGB lookup table.

use mosaic_core::{Error, Result};

use crate::generators;

/// A named 8-bit RGB colormap, selectable from the fixed menu in `spec.md`
/// §6.
///
/// Built once (construction is a closed-form table fill, no I/O) and shared
/// by reference thereafter; [`Colormap::rgb`] is the hot-path lookup the
/// Tile Renderer (C7) calls once per data pixel.
#[derive(Debug, Clone)]
pub struct Colormap {
    name: &'static str,
    table: [[u8; 3]; 256],
}

impl Colormap {
    /// Resolves a colormap by name from the fixed menu:
    /// `grey, a, b, bb, cubehelix0, cubehelix1, rainbow, standard, null`.
    ///
    /// Any other name is [`Error::UnknownStrategy`], per `spec.md` §6.
    pub fn by_name(name: &str) -> Result<Self> {
        let (canonical, table) = match name {
            "grey" => ("grey", generators::grey()),
            "a" => ("a", generators::a()),
            "b" => ("b", generators::b()),
            "bb" => ("bb", generators::bb()),
            "cubehelix0" => ("cubehelix0", generators::cubehelix0()),
            "cubehelix1" => ("cubehelix1", generators::cubehelix1()),
            "rainbow" => ("rainbow", generators::rainbow()),
            "standard" => ("standard", generators::standard()),
            "null" => ("null", generators::null()),
            other => return Err(Error::UnknownStrategy(other.to_string())),
        };
        Ok(Self { name: canonical, table })
    }

    /// The default colormap (`standard`), used when a render request doesn't
    /// select one explicitly.
    pub fn default_map() -> Self {
        Self::by_name("standard").expect("standard is always a valid name")
    }

    /// This colormap's registry name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up the RGB triple for a normalized fraction in `[0.0, 1.0]`.
    /// Values outside the range are clamped rather than panicking, since
    /// upstream CDF/min-max computations can produce values fractionally
    /// outside `[0, 1]` from floating-point rounding.
    pub fn rgb(&self, fraction: f64) -> [u8; 3] {
        let idx = (fraction.clamp(0.0, 1.0) * 255.0).round() as usize;
        self.table[idx.min(255)]
    }

    /// Looks up the RGB triple for a raw 8-bit index, as produced by the
    /// CDF-normalized scaling path (`spec.md` §4.6/§4.7).
    pub fn rgb_byte(&self, byte: u8) -> [u8; 3] {
        self.table[byte as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_rejected() {
        let err = Colormap::by_name("not-a-colormap").unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy(_)));
    }

    #[test]
    fn every_menu_name_resolves() {
        for name in ["grey", "a", "b", "bb", "cubehelix0", "cubehelix1", "rainbow", "standard", "null"] {
            assert!(Colormap::by_name(name).is_ok(), "{name} should resolve");
        }
    }

    #[test]
    fn rgb_clamps_out_of_range_fractions() {
        let cm = Colormap::by_name("grey").unwrap();
        assert_eq!(cm.rgb(-1.0), cm.rgb(0.0));
        assert_eq!(cm.rgb(2.0), cm.rgb(1.0));
    }

    #[test]
    fn rgb_byte_indexes_directly() {
        let cm = Colormap::by_name("grey").unwrap();
        assert_eq!(cm.rgb_byte(128), [128, 128, 128]);
    }
}
