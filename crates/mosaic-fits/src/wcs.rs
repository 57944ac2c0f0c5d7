//! World-coordinate affine resolution (`spec.md` §4.2).

use mosaic_core::{Affine, Error, Result};

use crate::header::Header;

/// Raft-grid spacing, in focal-plane pixels, between adjacent raft centers
/// (`spec.md` §4.2: "12700 pixels per step in each axis").
const RAFT_GRID_STEP: f64 = 12700.0;

/// CCD-grid gutter widths used when synthesizing the DM-single-CCD WCS
/// override (`spec.md` §4.2).
const DM_GUTTER_X: f64 = 150.0;
const DM_GUTTER_Y: f64 = 200.0;

/// Reads the six `PC`/`CRVAL` doubles for `letter` and builds the raw
/// (untranslated-by-datasec) affine, applying the `Q`->`E` raft-grid
/// special case.
///
/// Returns the affine and the WCS letter actually used (after the
/// substitution).
pub fn resolve_wcs(header: &Header, letter: char, raft_bay: &str) -> Result<(Affine, char)> {
    let effective_letter = if letter == 'Q' { 'E' } else { letter };

    let pc1_1 = header.require_f64(&format!("PC1_1{effective_letter}"))?;
    let pc1_2 = header.require_f64(&format!("PC1_2{effective_letter}"))?;
    let pc2_1 = header.require_f64(&format!("PC2_1{effective_letter}"))?;
    let pc2_2 = header.require_f64(&format!("PC2_2{effective_letter}"))?;
    let crval1 = header.require_f64(&format!("CRVAL1{effective_letter}"))?;
    let crval2 = header.require_f64(&format!("CRVAL2{effective_letter}"))?;

    let mut affine = Affine::new(pc1_1, pc2_1, pc1_2, pc2_2, crval1, crval2);

    if letter == 'Q' {
        let (dx, dy) = raft_grid_shift(raft_bay)?;
        affine = affine.shifted_by(dx, dy);
    }

    Ok((affine, effective_letter))
}

/// Parses the raft-grid offset from the two digits at positions 1 and 2 of
/// a four-character `RAFTBAY` name (e.g. `"R22 "` -> grid `(2, 2)`),
/// centered on the focal plane's central raft `R22`.
fn raft_grid_shift(raft_bay: &str) -> Result<(f64, f64)> {
    let chars: Vec<char> = raft_bay.chars().collect();
    if chars.len() < 3 {
        return Err(Error::MalformedDescriptor(format!(
            "RAFTBAY too short for grid decode: {raft_bay:?}"
        )));
    }
    let grid_x = chars[1]
        .to_digit(10)
        .ok_or_else(|| Error::MalformedDescriptor(format!("bad RAFTBAY digits: {raft_bay:?}")))?;
    let grid_y = chars[2]
        .to_digit(10)
        .ok_or_else(|| Error::MalformedDescriptor(format!("bad RAFTBAY digits: {raft_bay:?}")))?;
    Ok((
        (grid_x as f64 - 2.0) * RAFT_GRID_STEP,
        (grid_y as f64 - 2.0) * RAFT_GRID_STEP,
    ))
}

/// Synthesizes the WCS override used for DM-produced single-image files
/// (`EXPID != 0`): identity rotation, translation derived from `CCDSLOT`'s
/// grid digits with fixed gutters, letter `'D'`.
pub fn synthesize_dm_wcs(ccd_slot: &str, width: u32, height: u32) -> Result<Affine> {
    let chars: Vec<char> = ccd_slot.chars().collect();
    if chars.len() < 3 {
        return Err(Error::MalformedDescriptor(format!(
            "CCDSLOT too short for grid decode: {ccd_slot:?}"
        )));
    }
    let grid_x = chars[1]
        .to_digit(10)
        .ok_or_else(|| Error::MalformedDescriptor(format!("bad CCDSLOT digits: {ccd_slot:?}")))?
        as f64;
    let grid_y = chars[2]
        .to_digit(10)
        .ok_or_else(|| Error::MalformedDescriptor(format!("bad CCDSLOT digits: {ccd_slot:?}")))?
        as f64;

    let tx = grid_x * (width as f64 + DM_GUTTER_X);
    let ty = grid_y * (height as f64 + DM_GUTTER_Y);
    Ok(Affine::new(1.0, 0.0, 0.0, 1.0, tx, ty))
}
