//! mosaic - standalone host binary for the focal-plane mosaic render core
//!
//! Wires `mosaic-cache`'s Cache Fabric and `mosaic-controller`'s Render
//! Controller into a runnable CLI, for manual testing of a render request
//! without a host image-I/O framework. The image-reader adapter, UI, and
//! object-store wire client this binary would sit behind in production are
//! all out of scope (`spec.md` §1) — this is a thin harness, not a server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use mosaic_cache::CacheFabric;
use mosaic_color::Colormap;
use mosaic_controller::{OutputRaster, RasterBuffer, RenderController, RenderRequest, ScaleMode};
use mosaic_core::{BiasKind, CoreConfig, FRect};

/// Initializes tracing based on verbosity level, mirroring the rest of
/// this workspace's `-v`/`-vv`/`-vvv` convention.
fn init_tracing(verbose: u8, log_path: Option<&PathBuf>) {
    let filter = match verbose {
        0 => "warn",
        1 => "mosaic=info",
        2 => "mosaic=debug",
        _ => "mosaic=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if let Some(path) = log_path {
        let log_dir = path.parent().unwrap_or(Path::new("."));
        let log_filename = path.file_name().unwrap_or(std::ffi::OsStr::new("mosaic.log"));
        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .with_ansi(false)
            .with_writer(file_appender)
            .init();
    } else if verbose > 0 {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .init();
    }
}

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(author, version, about = "Focal-plane mosaic render core CLI")]
#[command(long_about = "
Manual-testing harness for the focal-plane mosaic render core.

Examples:
  mosaic render --index exposure.idx --output tile.png --width 4096 --height 4096
  mosaic render --index exposure.idx --output tile.png --source-rect 0,0,2000,2000 --colormap rainbow
  mosaic segments exposure.fits --wcs-letter 4
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log to file (-l default, -l path.log custom)
    #[arg(short = 'l', long = "log", global = true)]
    log: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one focal-plane region to a PNG.
    Render(RenderArgs),

    /// Decode and list the amplifier segments of one FITS file (C2 only,
    /// no cache/render fan-out) — useful for inspecting a single exposure
    /// file's geometry without constructing an index stream.
    Segments(SegmentsArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Path to the index stream (one segment descriptor per line).
    #[arg(long)]
    index: PathBuf,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output raster width in pixels.
    #[arg(long, default_value_t = 4096)]
    width: u32,

    /// Output raster height in pixels.
    #[arg(long, default_value_t = 4096)]
    height: u32,

    /// Restrict compositing to `x,y,width,height` in focal-plane
    /// coordinates; the raster's own `(0,0)` is placed at `(x,y)`.
    #[arg(long, value_name = "X,Y,W,H")]
    source_rect: Option<String>,

    /// Colormap name: grey, a, b, bb, cubehelix0, cubehelix1, rainbow,
    /// standard, null.
    #[arg(long, default_value = "standard")]
    colormap: String,

    /// Bias-correction strategy: None, SimpleOverscanCorrection,
    /// SimpleOverscanSubtraction, SimpleOverscanSubtraction2,
    /// SimpleOverscanSubOnly.
    #[arg(long, default_value = "None")]
    bias: String,

    /// Composite each segment's full extent rather than cropping to its
    /// data region.
    #[arg(long)]
    show_bias_region: bool,

    /// WCS alternate-axis letter to resolve.
    #[arg(long, default_value = "4")]
    wcs_letter: char,

    /// Scaling mode: amplifier (per-segment histogram) or global
    /// (exposure-wide merged histogram).
    #[arg(long, default_value = "amplifier")]
    scale_mode: String,
}

#[derive(Args)]
struct SegmentsArgs {
    /// FITS file to decode.
    file: PathBuf,

    /// WCS alternate-axis letter to resolve.
    #[arg(long, default_value = "4")]
    wcs_letter: char,
}

fn parse_rect(s: &str) -> Result<FRect> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        bail!("--source-rect expects X,Y,W,H, got `{s}`");
    }
    let values: Vec<f64> = parts
        .iter()
        .map(|p| p.trim().parse::<f64>().context("--source-rect values must be numbers"))
        .collect::<Result<_>>()?;
    Ok(FRect::new(values[0], values[1], values[2], values[3]))
}

async fn run_render(args: RenderArgs) -> Result<()> {
    let colormap = Colormap::by_name(&args.colormap).map_err(anyhow::Error::from)?;
    let bias_kind = BiasKind::by_name(&args.bias).map_err(anyhow::Error::from)?;
    let scale_mode = match args.scale_mode.to_lowercase().as_str() {
        "amplifier" => ScaleMode::Amplifier,
        "global" => ScaleMode::Global,
        other => bail!("unknown scale mode `{other}`, expected `amplifier` or `global`"),
    };
    let source_rect = args.source_rect.as_deref().map(parse_rect).transpose()?;
    let origin = source_rect.map(|r| (r.x, r.y)).unwrap_or((0.0, 0.0));

    let fabric = Arc::new(CacheFabric::new(&CoreConfig::from_env()));
    fabric.spawn_stats_reporter();
    let controller = RenderController::new(fabric);

    let mut request = RenderRequest::new(args.index.to_string_lossy().into_owned());
    request.source_rect = source_rect;
    request.colormap = colormap;
    request.bias_kind = bias_kind;
    request.show_bias_region = args.show_bias_region;
    request.wcs_letter = args.wcs_letter;
    request.scale_mode = scale_mode;

    let canvas = RasterBuffer::new(args.width as i64, args.height as i64);
    let raster = OriginShiftedRaster { inner: &canvas, origin };

    let summary = controller.render(&request, &raster).await?;
    tracing::info!(
        segments_decoded = summary.segments_decoded,
        segments_rendered = summary.segments_rendered,
        "render complete"
    );

    let image_buffer = image::RgbImage::from_raw(args.width, args.height, canvas.as_bytes().to_vec())
        .context("rendered raster size mismatch")?;
    image_buffer.save(&args.output).with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "rendered {} of {} segments -> {}",
        summary.segments_rendered,
        summary.segments_decoded,
        args.output.display()
    );
    Ok(())
}

/// Shifts focal-plane coordinates by `(-origin.0, -origin.1)` before
/// delegating to an inner raster sized to the requested region, so a
/// `--source-rect` far from the focal-plane origin still lands on a
/// reasonably-sized output image.
struct OriginShiftedRaster<'a> {
    inner: &'a RasterBuffer,
    origin: (f64, f64),
}

impl OutputRaster for OriginShiftedRaster<'_> {
    fn width(&self) -> i64 {
        self.inner.width()
    }

    fn height(&self) -> i64 {
        self.inner.height()
    }

    fn put(&self, fx: i64, fy: i64, rgb: [u8; 3]) {
        let x = fx - self.origin.0.round() as i64;
        let y = fy - self.origin.1.round() as i64;
        self.inner.put(x, y, rgb);
    }
}

fn run_segments(args: SegmentsArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let file_size = bytes.len() as u64;
    let segments = mosaic_fits::decode_segments(
        &bytes,
        &args.file.to_string_lossy(),
        file_size,
        args.wcs_letter,
        mosaic_fits::FailureMode::Tolerant,
    )
    .map_err(anyhow::Error::from)?;

    if segments.is_empty() {
        println!("no segments decoded (guider file, or no matching HDUs)");
        return Ok(());
    }

    println!("{:<4} {:<8} {:<10} {:<20} {:<28} {:<10}", "HDU", "AMP", "DIMS", "DATASEC", "WCS BBOX", "COMPRESSED");
    for segment in &segments {
        println!(
            "{:<4} {:<8} {:<10} {:<20} {:<28} {:<10}",
            segment.hdu_ordinal,
            segment.segment_name,
            format!("{}x{}", segment.dims.0, segment.dims.1),
            format!("{}", segment.datasec),
            format!(
                "({:.1},{:.1})+({:.1}x{:.1})",
                segment.wcs.x, segment.wcs.y, segment.wcs.width, segment.wcs.height
            ),
            segment.is_compressed(),
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log.as_ref().and_then(|l| l.clone()).as_ref());

    match cli.command {
        Commands::Render(args) => run_render(args).await,
        Commands::Segments(args) => run_segments(args),
    }
}
