//! Tile Renderer (C7): `spec.md` §4.7.
//!
//! Pure given its inputs: applies bias correction and either the CDF-based
//! histogram-equalization map (integer buffers) or a min/max "enhanced
//! scaling" rescale (float buffers) through a colormap, producing one
//! segment's [`RenderedTile`].

use mosaic_core::{CorrectionFactors, GlobalHistogram, RawBuffer, RawData, RenderedTile, Segment};
use mosaic_color::Colormap;

use crate::histogram_engine::{build_histogram, scaling_map_from_global, scaling_map_from_histogram};

/// Which histogram backs the CDF scaling map for an integer-buffer render.
pub enum ScaleSource<'a> {
    /// Build a fresh per-segment histogram (`scaleMode = AMPLIFIER`).
    PerSegment,
    /// Use a histogram already merged across the whole exposure
    /// (`scaleMode = GLOBAL`).
    Global(&'a GlobalHistogram),
}

/// Renders one segment's tile: `renderTile(segment, rawData, factors,
/// globalHistogramOrNull, colormap)` from `spec.md` §4.7.
///
/// For a float32 buffer, ignores `scale_source` and instead rescales the
/// dataset's own occupied min/max range onto `[0, 255]` before the
/// colormap lookup. For an int32 buffer, builds or reuses a
/// histogram-equalization CDF map depending on `scale_source`.
pub fn render_tile(
    segment: &Segment,
    raw: &RawData,
    factors: &dyn CorrectionFactors,
    scale_source: ScaleSource<'_>,
    colormap: &Colormap,
) -> RenderedTile {
    let mut tile = RenderedTile::new(segment.dims.0, segment.dims.1);

    match &raw.buffer {
        RawBuffer::Float32(_) => render_float(segment, raw, &mut tile, colormap),
        RawBuffer::Int32(_) => render_int(segment, raw, factors, scale_source, colormap, &mut tile),
    }

    tile
}

fn render_float(segment: &Segment, raw: &RawData, tile: &mut RenderedTile, colormap: &Colormap) {
    let (n_axis1, _) = segment.dims;
    let datasec = segment.datasec;

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for y in datasec.y..datasec.bottom() {
        for x in datasec.x..datasec.right() {
            let sample = raw.buffer.sample_as_f32((y as usize) * n_axis1 as usize + x as usize);
            min = min.min(sample);
            max = max.max(sample);
        }
    }
    let span = (max - min).max(f32::EPSILON);

    for y in datasec.y..datasec.bottom() {
        for x in datasec.x..datasec.right() {
            let sample = raw.buffer.sample_as_f32((y as usize) * n_axis1 as usize + x as usize);
            let fraction = ((sample - min) / span).clamp(0.0, 1.0) as f64;
            tile.put(x, y, colormap.rgb(fraction));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_int(
    segment: &Segment,
    raw: &RawData,
    factors: &dyn CorrectionFactors,
    scale_source: ScaleSource<'_>,
    colormap: &Colormap,
    tile: &mut RenderedTile,
) {
    let map = match scale_source {
        ScaleSource::Global(global) => scaling_map_from_global(global, colormap),
        ScaleSource::PerSegment => {
            let histogram = build_histogram(raw, segment, factors);
            scaling_map_from_histogram(&histogram, colormap)
        }
    };

    let (n_axis1, _) = segment.dims;
    let datasec = segment.datasec;
    for y in datasec.y..datasec.bottom() {
        for x in datasec.x..datasec.right() {
            let sample = raw.buffer.sample_as_i32((y as usize) * n_axis1 as usize + x as usize);
            let corrected = (sample - factors.at(x, y)).max(0);
            tile.put(x, y, map.get(corrected));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{Affine, FRect, NoOp, Rect, SampleFormat};
    use std::sync::Arc;

    fn tiny_segment(sample_format: SampleFormat) -> Arc<Segment> {
        Arc::new(Segment {
            file: "/x.fits".into(),
            hdu_ordinal: 1,
            data_offset: 0,
            data_length: 16,
            file_size_witness: 0,
            dims: (2, 2),
            sample_format,
            compression: None,
            tile_dims: (0, 0),
            datasec: Rect::new(0, 0, 2, 2),
            raft: "R22".into(),
            ccd_slot: "S11".into(),
            segment_name: "AMP00".into(),
            wcs_letter: '4',
            affine: Affine::IDENTITY,
            wcs: FRect::new(0.0, 0.0, 2.0, 2.0),
        })
    }

    #[test]
    fn int_render_produces_distinct_pixels_for_distinct_values() {
        let segment = tiny_segment(SampleFormat::Int32);
        let raw = RawData::new(segment.clone(), RawBuffer::Int32(Arc::from(vec![10, 20, 30, 40])));
        let colormap = Colormap::by_name("grey").unwrap();
        let tile = render_tile(&segment, &raw, &NoOp, ScaleSource::PerSegment, &colormap);
        assert_ne!(tile.get(0, 0), tile.get(1, 1));
    }

    #[test]
    fn float_render_rescales_min_max_to_full_byte_range() {
        let segment = tiny_segment(SampleFormat::Float32);
        let raw = RawData::new(segment.clone(), RawBuffer::Float32(Arc::from(vec![0.0f32, 5.0, 10.0, 15.0])));
        let colormap = Colormap::by_name("grey").unwrap();
        let tile = render_tile(&segment, &raw, &NoOp, ScaleSource::PerSegment, &colormap);
        assert_eq!(tile.get(0, 0), [0, 0, 0]);
        assert_eq!(tile.get(1, 1), [255, 255, 255]);
    }

    #[test]
    fn global_and_amplifier_scaling_both_conserve_histogram_count() {
        let segment = tiny_segment(SampleFormat::Int32);
        let raw = RawData::new(segment.clone(), RawBuffer::Int32(Arc::from(vec![5, 5, 5, 100])));

        let per_segment_histogram = build_histogram(&raw, &segment, &NoOp);
        assert_eq!(per_segment_histogram.total(), 4);

        let mut global = GlobalHistogram::new();
        global.merge(&per_segment_histogram);

        let colormap = Colormap::by_name("grey").unwrap();
        let global_tile = render_tile(&segment, &raw, &NoOp, ScaleSource::Global(&global), &colormap);
        let amp_tile = render_tile(&segment, &raw, &NoOp, ScaleSource::PerSegment, &colormap);
        // Same data, same merged histogram -> same result here, but the
        // code paths differ (reused vs freshly built histogram).
        assert_eq!(global_tile.get(0, 0), amp_tile.get(0, 0));
    }
}
