//! Segment Metadata Decoder (C2): `spec.md` §4.2.
//!
//! Walks a FITS file's HDUs, using the primary HDU to establish CCD
//! identity and amplifier count, then builds one [`Segment`] per
//! non-primary image HDU.

use std::sync::Arc;

use mosaic_core::{Affine, CompressionKind, Error, Rect, Result, SampleFormat, Segment};
use tracing::{debug, instrument, warn};

use crate::header::{Header, BLOCK_SIZE};
use crate::{datasec, wcs};

/// Whether a failure decoding a later HDU should discard the whole result
/// or only that HDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Any HDU failure discards the entire segment list.
    Strict,
    /// A later HDU's failure is skipped; earlier successes are kept.
    Tolerant,
}

fn align_up_2880(n: usize) -> usize {
    n.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Decodes every amplifier segment of a FITS file from its raw bytes.
///
/// `file` names the source for the returned [`Segment`]s; `file_size` is
/// recorded as the freshness witness. `wcs_letter` selects the WCS solution
/// to resolve per segment; `wcs_override`, if given, replaces both the
/// `DATASEC`/dims-derived data region and the resolved affine (used for the
/// DM-single-CCD synthesis path internally, and available to callers who
/// already know the override they want).
#[instrument(skip(bytes), fields(file = %file))]
pub fn decode_segments(
    bytes: &[u8],
    file: &str,
    file_size: u64,
    wcs_letter: char,
    failure_mode: FailureMode,
) -> Result<Vec<Segment>> {
    if bytes.len() < BLOCK_SIZE {
        return Err(Error::Io("file shorter than one FITS block".into()));
    }

    let primary = Header::parse(bytes)?;
    if primary.get_i64("N_STAMPS").is_some() {
        debug!("guider file detected (N_STAMPS present); returning empty segment list");
        return Ok(Vec::new());
    }

    let raft = primary.get_str("RAFTBAY").unwrap_or("").to_string();
    let ccd_slot = primary
        .get_str("CCDSLOT")
        .or_else(|| primary.get_str("SENSNAME"))
        .unwrap_or("")
        .to_string();
    let exp_id = primary.get_i64("EXPID").unwrap_or(0);

    let dm_single_image = exp_id != 0;
    let amp_count = if dm_single_image {
        1
    } else if ccd_slot.starts_with("SW") {
        8
    } else {
        16
    };

    let mut offset = align_up_2880(primary.byte_length);
    let mut segments = Vec::with_capacity(amp_count);

    for hdu_ordinal in 1..=amp_count {
        match decode_one_segment(bytes, &mut offset, file, file_size, wcs_letter, &raft, &ccd_slot, dm_single_image, hdu_ordinal) {
            Ok(segment) => segments.push(segment),
            Err(e) => {
                if failure_mode == FailureMode::Tolerant && hdu_ordinal > 1 {
                    warn!(hdu = hdu_ordinal, error = %e, "skipping HDU in tolerant mode");
                    continue;
                }
                return Err(e);
            }
        }
    }

    Ok(segments)
}

#[allow(clippy::too_many_arguments)]
fn decode_one_segment(
    bytes: &[u8],
    offset: &mut usize,
    file: &str,
    file_size: u64,
    wcs_letter: char,
    raft: &str,
    ccd_slot: &str,
    dm_single_image: bool,
    hdu_ordinal: usize,
) -> Result<Segment> {
    if *offset + BLOCK_SIZE > bytes.len() {
        return Err(Error::Io(format!("truncated file before HDU {hdu_ordinal}")));
    }
    let header = Header::parse(&bytes[*offset..])?;
    let header_len = header.byte_length;
    let data_offset = (*offset + header_len) as u64;

    let is_compressed = header.get_bool("ZIMAGE").unwrap_or(false);

    let (sample_format, dims, compression, tile_dims, data_length) = if is_compressed {
        let zbitpix = header.require_i64("ZBITPIX")?;
        let cmptype = header.require_str("ZCMPTYPE")?;
        let kind = match cmptype {
            "RICE_1" => CompressionKind::Rice1,
            "GZIP_2" => CompressionKind::Gzip2,
            other => return Err(Error::UnsupportedCompression(other.to_string())),
        };
        let z_axis1 = header.require_i64("ZNAXIS1")? as u32;
        let z_axis2 = header.require_i64("ZNAXIS2")? as u32;
        let c_axis1 = header.require_i64("NAXIS1")? as u32;
        let c_axis2 = header.require_i64("NAXIS2")? as u32;
        let pcount = header.get_i64("PCOUNT").unwrap_or(0) as u64;
        let length = c_axis1 as u64 * c_axis2 as u64 + pcount;
        let format = if zbitpix == -32 { SampleFormat::Float32 } else { SampleFormat::Int32 };
        (format, (z_axis1, z_axis2), Some(kind), (c_axis1, c_axis2), length)
    } else {
        let bitpix = header.require_i64("BITPIX")?;
        let n_axis1 = header.require_i64("NAXIS1")? as u32;
        let n_axis2 = header.require_i64("NAXIS2")? as u32;
        let format = if bitpix == -32 { SampleFormat::Float32 } else { SampleFormat::Int32 };
        let length = n_axis1 as u64 * n_axis2 as u64 * 4;
        (format, (n_axis1, n_axis2), None, (0, 0), length)
    };

    let (datasec, affine, effective_letter) = if dm_single_image {
        let rect = Rect::from_size(dims.0, dims.1);
        let affine = wcs::synthesize_dm_wcs(ccd_slot, dims.0, dims.1)?;
        (rect, affine.translated(rect.x as f64 + 0.5, rect.y as f64 + 0.5), 'D')
    } else {
        let raw_datasec = header.require_str("DATASEC")?;
        let rect = datasec::parse_datasec(raw_datasec)?;
        let full = Rect::from_size(dims.0, dims.1);
        if !full.contains_rect(&rect) {
            return Err(Error::MalformedDatasec(format!(
                "datasec {rect} exceeds image bounds {full}"
            )));
        }
        let (raw_affine, letter) = wcs::resolve_wcs(&header, wcs_letter, raft)?;
        let affine = raw_affine.translated(rect.x as f64 + 0.5, rect.y as f64 + 0.5);
        (rect, affine, letter)
    };

    let wcs_bbox = datasec.bounding_box(&affine);

    let data_block_len = align_up_2880(data_length as usize);
    *offset += header_len + data_block_len;

    Ok(Segment {
        file: file.to_string(),
        hdu_ordinal,
        data_offset,
        data_length,
        file_size_witness: file_size,
        dims,
        sample_format,
        compression,
        tile_dims,
        datasec,
        raft: raft.to_string(),
        ccd_slot: ccd_slot.to_string(),
        segment_name: format!("AMP{:02}", hdu_ordinal - 1),
        wcs_letter: effective_letter,
        affine,
        wcs: wcs_bbox,
    })
}

/// Wraps a [`Segment`] in an `Arc`, the form the cache fabric hands out.
pub fn shared(segment: Segment) -> Arc<Segment> {
    Arc::new(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(keyword: &str, value: &str) -> String {
        format!("{:<8}= {:<70}", keyword, value)
    }

    fn build_header_block(cards: &[String]) -> Vec<u8> {
        let mut raw = String::new();
        for c in cards {
            raw.push_str(c);
        }
        raw.push_str(&format!("{:<80}", "END"));
        let mut bytes = raw.into_bytes();
        bytes.resize(align_up_2880(bytes.len()), b' ');
        bytes
    }

    fn amp_header(naxis1: u32, naxis2: u32) -> Vec<String> {
        vec![
            card("BITPIX", "32"),
            card("NAXIS1", &naxis1.to_string()),
            card("NAXIS2", &naxis2.to_string()),
            card("DATASEC", "[11:522,1:2000]"),
            card("PC1_14", "1.0"),
            card("PC1_24", "0.0"),
            card("PC2_14", "0.0"),
            card("PC2_24", "1.0"),
            card("CRVAL14", "1000.0"),
            card("CRVAL24", "2000.0"),
        ]
    }

    #[test]
    fn decodes_single_amp_uncompressed_file() {
        let mut primary = build_header_block(&[
            card("RAFTBAY", "'R22 '"),
            card("CCDSLOT", "'S22 '"),
        ]);
        let mut amp = build_header_block(&amp_header(540, 2000));
        // amp data block
        let data_len = align_up_2880(540 * 2000 * 4);
        amp.resize(amp.len() + data_len, 0);

        primary.append(&mut amp);

        // Force amp_count to 1 for this test by using an SW slot? SW implies 8.
        // Instead directly exercise decode_one_segment via a 16-amp file but
        // only assert on the first segment's geometry.
        let segments = decode_segments(&primary, "/data/exp.fits", primary.len() as u64, '4', FailureMode::Tolerant);
        // 16 amps expected but only one HDU present -> later HDUs error and
        // are skipped in tolerant mode, leaving exactly one segment.
        let segments = segments.unwrap();
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.dims, (540, 2000));
        assert_eq!(seg.datasec, Rect::new(10, 0, 512, 2000));
        assert_eq!(seg.wcs_letter, '4');
        assert_eq!(seg.raft, "R22");
        assert_eq!(seg.ccd_slot, "S22");
    }

    #[test]
    fn unsupported_compression_is_rejected() {
        let mut primary = build_header_block(&[card("RAFTBAY", "'R22 '"), card("CCDSLOT", "'S22 '")]);
        let mut amp = build_header_block(&[
            card("ZIMAGE", "T"),
            card("ZBITPIX", "32"),
            card("ZCMPTYPE", "'HCOMPRESS_1'"),
            card("ZNAXIS1", "540"),
            card("ZNAXIS2", "2000"),
            card("NAXIS1", "100"),
            card("NAXIS2", "2000"),
        ]);
        amp.resize(amp.len() + BLOCK_SIZE, 0);
        primary.append(&mut amp);

        let err = decode_segments(&primary, "/data/exp.fits", primary.len() as u64, '4', FailureMode::Strict)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression(_)));
    }

    #[test]
    fn guider_file_with_n_stamps_is_empty() {
        let primary = build_header_block(&[card("N_STAMPS", "4")]);
        let segments = decode_segments(&primary, "/data/guider.fits", primary.len() as u64, '4', FailureMode::Strict)
            .unwrap();
        assert!(segments.is_empty());
    }
}
