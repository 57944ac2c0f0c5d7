//! Render Controller (C9): `spec.md` §4.9.
//!
//! Accepts a [`RenderRequest`], walks the Cache Fabric to obtain rendered
//! tiles for every intersecting segment, and composites them onto the
//! caller's [`OutputRaster`] under each segment's affine. Fan-out within a
//! request is expressed as "spawn a task per item, collect handles, await
//! all" per the design note in `spec.md` §9 — never an inner blocking join
//! inside a loop.

use std::sync::Arc;

use mosaic_cache::CacheFabric;
use mosaic_core::{Error, Result, Segment};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::output::OutputRaster;
use crate::request::{RenderRequest, ScaleMode};

/// Counters describing one completed render, for logging/diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Total segments decoded from the index (before region filtering).
    pub segments_decoded: usize,
    /// Segments surviving the `sourceRect` intersection filter.
    pub segments_rendered: usize,
}

/// Orchestrates render requests against a shared [`CacheFabric`].
pub struct RenderController {
    fabric: Arc<CacheFabric>,
}

impl RenderController {
    /// Builds a controller over an already-constructed cache fabric.
    pub fn new(fabric: Arc<CacheFabric>) -> Self {
        Self { fabric }
    }

    /// Executes one render request end to end (`spec.md` §4.9 steps 1-6).
    #[instrument(skip_all, fields(index = %request.index_stream, bias_kind = %request.bias_kind, scale_mode = ?request.scale_mode))]
    pub async fn render(&self, request: &RenderRequest, output: &dyn OutputRaster) -> Result<RenderSummary> {
        // Step 1: resolve the descriptor list.
        let descriptors = self.fabric.index.get(&request.index_stream).await?;

        // Step 2: decode every descriptor's segments in parallel.
        let mut decode_tasks: JoinSet<Result<Arc<Vec<Arc<Segment>>>>> = JoinSet::new();
        for descriptor in descriptors.iter().cloned() {
            let fabric = self.fabric.clone();
            let wcs_letter = request.wcs_letter;
            decode_tasks.spawn(async move { fabric.segment.get(&descriptor, wcs_letter).await });
        }
        let decoded = join_all_mapped(decode_tasks).await?;

        let segments_decoded: usize = decoded.iter().map(|s| s.len()).sum();

        // Step 3: filter by source-region intersection.
        let segments: Vec<Arc<Segment>> = decoded
            .into_iter()
            .flat_map(|list| list.iter().cloned().collect::<Vec<_>>())
            .filter(|segment| match &request.source_rect {
                Some(rect) => segment.wcs.intersects(rect),
                None => true,
            })
            .collect();

        info!(segments_decoded, segments_surviving = segments.len(), "region filter applied");

        // Optional step: resolve the exposure-wide histogram once, under
        // `scaleMode = GLOBAL`, and thread its handle into every tile
        // request below.
        let global = match request.scale_mode {
            ScaleMode::Global if !segments.is_empty() => Some(
                self.fabric
                    .global_histogram
                    .get(
                        &segments,
                        request.bias_kind,
                        &self.fabric.raw_data,
                        &self.fabric.bias_factors,
                        &self.fabric.byte_reader,
                    )
                    .await?,
            ),
            _ => None,
        };

        // Step 4: render every surviving segment's tile in parallel.
        let mut render_tasks: JoinSet<Result<(Arc<Segment>, Arc<mosaic_core::RenderedTile>)>> = JoinSet::new();
        for segment in &segments {
            let fabric = self.fabric.clone();
            let segment = segment.clone();
            let colormap = request.colormap.clone();
            let bias_kind = request.bias_kind;
            let global = global.clone();
            render_tasks.spawn(async move {
                let tile = fabric
                    .rendered_tile
                    .get(
                        &segment,
                        bias_kind,
                        &colormap,
                        &fabric.raw_data,
                        &fabric.bias_factors,
                        &fabric.byte_reader,
                        global,
                    )
                    .await?;
                Ok((segment, tile))
            });
        }
        let rendered = join_all_mapped(render_tasks).await?;

        // Step 5/6: composite each tile under its segment's affine, then
        // return — every tile write lands on the completion thread of that
        // tile's own future, matching `spec.md` §4.9/§5.
        for (segment, tile) in &rendered {
            composite_tile(segment, tile, request.show_bias_region, output);
        }

        Ok(RenderSummary {
            segments_decoded,
            segments_rendered: rendered.len(),
        })
    }
}

/// Awaits every task in `tasks`, aggregating failures per `spec.md` §7:
/// `Io` surfaces as-is, everything else becomes a generic render failure.
async fn join_all_mapped<T: Send + 'static>(mut tasks: JoinSet<Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(tasks.len());
    let mut first_err: Option<Error> = None;
    while let Some(joined) = tasks.join_next().await {
        let result = match joined {
            Ok(r) => r,
            Err(join_err) => Err(Error::Internal(format!("render task panicked: {join_err}"))),
        };
        match result {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!(error = %e, "render sub-task failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    match first_err {
        Some(e @ Error::Io(_)) => Err(e),
        Some(e) => Err(Error::Internal(format!("render failed: {e}"))),
        None => Ok(out),
    }
}

/// Composites one segment's rendered tile onto `output` under its affine.
///
/// The affine's domain is the segment's `datasec`-local pixel coordinate
/// (`spec.md` §4.2: `T` is translated by `(datasec.x + 0.5, datasec.y +
/// 0.5)` so its image of `(0,0)` already lands at the datasec's center-of-
/// corner-pixel in focal-plane space). Compositing therefore re-origins
/// each full-image tile pixel to datasec-local coordinates before applying
/// the affine, whether or not the iterated region itself is cropped to
/// datasec.
fn composite_tile(segment: &Segment, tile: &mosaic_core::RenderedTile, show_bias_region: bool, output: &dyn OutputRaster) {
    let region = if show_bias_region {
        mosaic_core::Rect::from_size(segment.dims.0, segment.dims.1)
    } else {
        segment.datasec
    };

    for (x, y) in region.iter_coords() {
        let local_x = x as f64 - segment.datasec.x as f64;
        let local_y = y as f64 - segment.datasec.y as f64;
        let (fx, fy) = segment.affine.apply(local_x, local_y);
        output.put(fx.round() as i64, fy.round() as i64, tile.get(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RasterBuffer;
    use mosaic_core::{CoreConfig, FRect};
    use std::io::Write;

    fn write_index(dir: &std::path::Path, lines: &[&str]) -> String {
        let path = dir.join("index.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path.to_str().unwrap().to_string()
    }

    fn write_fits(dir: &std::path::Path, name: &str, raft: &str, ccd: &str, values: [i32; 4], translation: (f64, f64)) -> String {
        fn card(keyword: &str, value: &str) -> String {
            format!("{keyword:<8}= {value:<70}")
        }
        fn pad_block(mut s: Vec<u8>) -> Vec<u8> {
            const BLOCK: usize = 2880;
            s.resize(s.len().div_ceil(BLOCK) * BLOCK, b' ');
            s
        }

        let mut primary = String::new();
        primary.push_str(&card("RAFTBAY", &format!("'{raft:<8}'")));
        primary.push_str(&card("CCDSLOT", &format!("'{ccd:<8}'")));
        primary.push_str(&format!("{:<80}", "END"));
        let mut bytes = pad_block(primary.into_bytes());

        let mut amp = String::new();
        amp.push_str(&card("BITPIX", "32"));
        amp.push_str(&card("NAXIS1", "2"));
        amp.push_str(&card("NAXIS2", "2"));
        amp.push_str(&card("DATASEC", "[1:2,1:2]"));
        amp.push_str(&card("PC1_14", "1.0"));
        amp.push_str(&card("PC1_24", "0.0"));
        amp.push_str(&card("PC2_14", "0.0"));
        amp.push_str(&card("PC2_24", "1.0"));
        amp.push_str(&card("CRVAL14", &translation.0.to_string()));
        amp.push_str(&card("CRVAL24", &translation.1.to_string()));
        amp.push_str(&format!("{:<80}", "END"));
        let mut amp_bytes = pad_block(amp.into_bytes());
        for v in values {
            amp_bytes.extend_from_slice(&v.to_be_bytes());
        }
        let amp_bytes = pad_block(amp_bytes);
        // 16 copies: decode_segments expects 16 amp HDUs for a non-SW slot.
        for _ in 0..16 {
            bytes.extend_from_slice(&amp_bytes);
        }

        let path = dir.join(name);
        std::fs::write(&path, &bytes).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn renders_and_composites_a_single_segment_exposure() {
        let dir = tempfile::tempdir().unwrap();
        let fits = write_fits(dir.path(), "exp.fits", "R22", "S11", [10, 20, 30, 40], (0.0, 0.0));
        let index_path = write_index(dir.path(), &["# comment", &fits]);

        let fabric = Arc::new(CacheFabric::new(&CoreConfig::defaults()));
        let controller = RenderController::new(fabric);
        let request = RenderRequest::new(index_path);
        let output = RasterBuffer::new(64, 64);

        let summary = controller.render(&request, &output).await.unwrap();
        assert_eq!(summary.segments_decoded, 16);
        assert_eq!(summary.segments_rendered, 16);
        // datasec local (0,0) maps through identity affine + (0.5,0.5)
        // translation to focal-plane (0.5, 0.5) -> rounds to pixel (1,1)... but
        // we only assert some pixel in-bounds got painted non-black, since the
        // exact destination depends on the 0.5-pixel-center convention.
        let painted = (0..4).flat_map(|y| (0..4).map(move |x| (x, y))).any(|(x, y)| output.get(x, y) != [0, 0, 0]);
        assert!(painted, "expected at least one composited pixel near the origin");
    }

    #[tokio::test]
    async fn source_rect_filters_out_non_intersecting_segments() {
        let dir = tempfile::tempdir().unwrap();
        let fits = write_fits(dir.path(), "exp.fits", "R22", "S11", [1, 1, 1, 1], (0.0, 0.0));
        let index_path = write_index(dir.path(), &[&fits]);

        let fabric = Arc::new(CacheFabric::new(&CoreConfig::defaults()));
        let controller = RenderController::new(fabric);
        let mut request = RenderRequest::new(index_path);
        request.source_rect = Some(FRect::new(1000.0, 1000.0, 10.0, 10.0));
        let output = RasterBuffer::new(64, 64);

        let summary = controller.render(&request, &output).await.unwrap();
        assert_eq!(summary.segments_decoded, 16);
        assert_eq!(summary.segments_rendered, 0);
    }

    #[tokio::test]
    async fn missing_index_file_is_an_io_error() {
        let fabric = Arc::new(CacheFabric::new(&CoreConfig::defaults()));
        let controller = RenderController::new(fabric);
        let request = RenderRequest::new("/no/such/index.txt".to_string());
        let output = RasterBuffer::new(8, 8);
        let err = controller.render(&request, &output).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
