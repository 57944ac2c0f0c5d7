//! Benchmarks for the mosaic render core's hot paths.
//!
//! Run with: `cargo bench -p mosaic-bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mosaic_color::Colormap;
use mosaic_core::{Affine, BiasKind, FRect, RawBuffer, RawData, Rect, SampleFormat, Segment};
use mosaic_fits::decompress::decompress_tiles;
use mosaic_render::{bias::compute_correction, build_histogram, tile_renderer::{render_tile, ScaleSource}};

fn segment(n_axis1: u32, n_axis2: u32) -> Arc<Segment> {
    Arc::new(Segment {
        file: "/bench/exp.fits".into(),
        hdu_ordinal: 1,
        data_offset: 0,
        data_length: n_axis1 as u64 * n_axis2 as u64 * 4,
        file_size_witness: 0,
        dims: (n_axis1, n_axis2),
        sample_format: SampleFormat::Int32,
        compression: None,
        tile_dims: (0, 0),
        datasec: Rect::new(10, 0, n_axis1 - 20, n_axis2),
        raft: "R22".into(),
        ccd_slot: "S11".into(),
        segment_name: "AMP00".into(),
        wcs_letter: '4',
        affine: Affine::IDENTITY,
        wcs: FRect::new(0.0, 0.0, n_axis1 as f64, n_axis2 as f64),
    })
}

/// A full 509x2000 amplifier's worth of samples, biased around a
/// representative ADC baseline so the histogram spans a realistic range.
fn sample_buffer(n_axis1: u32, n_axis2: u32) -> Vec<i32> {
    (0..(n_axis1 as usize * n_axis2 as usize))
        .map(|i| 20_000 + ((i * 37) % 4000) as i32)
        .collect()
}

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");
    for &(w, h) in &[(542u32, 2000u32), (2048, 2048)] {
        let segment = segment(w, h);
        let raw = RawData::new(segment.clone(), RawBuffer::Int32(Arc::from(sample_buffer(w, h))));
        let factors = compute_correction(BiasKind::SimpleOverscanSubtraction, &raw).unwrap();

        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_with_input(BenchmarkId::new("build_histogram", format!("{w}x{h}")), &raw, |b, raw| {
            b.iter(|| black_box(build_histogram(raw, &segment, factors.as_ref())))
        });
    }
    group.finish();
}

fn bench_bias_correction(c: &mut Criterion) {
    let mut group = c.benchmark_group("bias_correction");
    let segment = segment(542, 2000);
    let raw = RawData::new(segment.clone(), RawBuffer::Int32(Arc::from(sample_buffer(542, 2000))));

    for kind in [
        BiasKind::None,
        BiasKind::SimpleOverscanSubtraction,
        BiasKind::SimpleOverscanCorrection,
        BiasKind::SimpleOverscanSubtraction2,
    ] {
        group.bench_with_input(BenchmarkId::new("compute_correction", format!("{kind:?}")), &raw, |b, raw| {
            b.iter(|| black_box(compute_correction(kind, raw).unwrap()))
        });
    }
    group.finish();
}

fn bench_tile_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile_render");
    let segment = segment(542, 2000);
    let raw = RawData::new(segment.clone(), RawBuffer::Int32(Arc::from(sample_buffer(542, 2000))));
    let factors = compute_correction(BiasKind::SimpleOverscanSubtraction, &raw).unwrap();
    let colormap = Colormap::by_name("grey").unwrap();

    group.throughput(Throughput::Elements((542 * 2000) as u64));
    group.bench_function("render_tile_amplifier_scale", |b| {
        b.iter(|| black_box(render_tile(&segment, &raw, factors.as_ref(), ScaleSource::PerSegment, &colormap)))
    });
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    use mosaic_core::CompressionKind;

    let mut group = c.benchmark_group("decompress");
    let n_axis1 = 542u32;
    let n_axis2 = 64u32;

    // A directory-plus-payload byte range holding `n_axis2` GZIP_2 tiles,
    // each one row of `n_axis1` samples.
    let mut bytes = Vec::new();
    let mut payloads = Vec::new();
    for row in 0..n_axis2 {
        let samples: Vec<u8> = (0..n_axis1)
            .flat_map(|col| ((row * n_axis1 + col) as i32).to_be_bytes())
            .collect();
        let mut shuffled = vec![0u8; samples.len()];
        let n = samples.len() / 4;
        for (i, chunk) in samples.chunks_exact(4).enumerate() {
            for (byte_pos, &b) in chunk.iter().enumerate() {
                shuffled[byte_pos * n + i] = b;
            }
        }
        use std::io::Write;
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(&shuffled).unwrap();
        payloads.push(encoder.finish().unwrap());
    }

    let c_axis1 = n_axis1;
    let c_axis2 = n_axis2;
    let directory_len = (c_axis1 * c_axis2) as usize;
    bytes.resize(directory_len, 0);
    let mut cursor = 0u32;
    for (i, payload) in payloads.iter().enumerate() {
        let entry_offset = i * 8;
        bytes[entry_offset..entry_offset + 4].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes[entry_offset + 4..entry_offset + 8].copy_from_slice(&cursor.to_be_bytes());
        cursor += payload.len() as u32;
    }
    for payload in &payloads {
        bytes.extend_from_slice(payload);
    }

    group.throughput(Throughput::Elements((n_axis1 * n_axis2) as u64));
    group.bench_function("decompress_tiles_gzip2", |b| {
        b.iter(|| {
            black_box(decompress_tiles(CompressionKind::Gzip2, &bytes, n_axis1, c_axis1, c_axis2, false).unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_histogram, bench_bias_correction, bench_tile_render, bench_decompress);
criterion_main!(benches);
