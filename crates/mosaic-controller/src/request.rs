//! The render-request surface: `spec.md` §6's
//! `{sourceRect?, colormap, biasKind, showBiasRegion, wcsLetter, scaleMode,
//! globalHistogram?, wcsOverride?}`.

use mosaic_color::Colormap;
use mosaic_core::{BiasKind, FRect};

/// Which histogram backs a render's CDF scaling map (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// One histogram merged across every segment of the exposure.
    Global,
    /// A fresh histogram built from each segment's own data alone.
    Amplifier,
}

/// One render call's full parameter surface.
///
/// `index_stream` names the path the Index cache reads descriptors from.
/// `source_rect` restricts compositing to segments whose `wcs` bounding box
/// intersects it; `None` renders every segment the index names.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Path to the index stream naming the exposure's segments.
    pub index_stream: String,
    /// Restrict to segments intersecting this focal-plane rectangle.
    pub source_rect: Option<FRect>,
    /// Colormap applied during tile rendering.
    pub colormap: Colormap,
    /// Bias-correction strategy applied before scaling.
    pub bias_kind: BiasKind,
    /// If `true`, composite each segment's full extent rather than
    /// cropping to `datasec`.
    pub show_bias_region: bool,
    /// WCS alternate-axis letter to resolve per segment.
    pub wcs_letter: char,
    /// Whether tiles scale against a per-segment or exposure-wide
    /// histogram.
    pub scale_mode: ScaleMode,
}

impl RenderRequest {
    /// Builds a request with the common defaults: no region restriction,
    /// the `standard` colormap, no bias correction, bias region cropped,
    /// WCS letter `'4'`, amplifier-local scaling.
    pub fn new(index_stream: impl Into<String>) -> Self {
        Self {
            index_stream: index_stream.into(),
            source_rect: None,
            colormap: Colormap::default_map(),
            bias_kind: BiasKind::None,
            show_bias_region: false,
            wcs_letter: '4',
            scale_mode: ScaleMode::Amplifier,
        }
    }
}
