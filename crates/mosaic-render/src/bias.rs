//! Bias Correction Kernel (C5): `spec.md` §4.5.
//!
//! A bias-correction strategy is a pure function `(pixel buffer, Segment) ->
//! CorrectionFactors`, selectable by name from [`mosaic_core::BiasKind`].
//! The overscan regions consulted are derived from the segment's `datasec`:
//! the *serial* overscan is the columns of the full image outside
//! `datasec`'s column range, restricted to `datasec`'s rows; the *parallel*
//! overscan is the rows outside `datasec`'s row range, restricted to
//! `datasec`'s column range.

use mosaic_core::{BiasKind, CorrectionFactors, NoOp, RawData, Result, Segment};

/// A correction that is the same scalar everywhere in `datasec`.
#[derive(Debug, Clone, Copy)]
pub struct ScalarCorrection(pub i32);

impl CorrectionFactors for ScalarCorrection {
    fn at(&self, _x: u32, _y: u32) -> i32 {
        self.0
    }

    fn overall_correction(&self) -> i32 {
        self.0
    }
}

/// A correction with one scalar per row, keyed by the row's `y` coordinate
/// within the full image (`spec.md` §4.5's "row-wise serial" variant).
#[derive(Debug, Clone)]
pub struct RowCorrection {
    /// `table[y - datasec.y]` is the correction for row `y`.
    table: Vec<i32>,
    datasec_y: u32,
}

impl CorrectionFactors for RowCorrection {
    fn at(&self, _x: u32, y: u32) -> i32 {
        self.table
            .get((y.saturating_sub(self.datasec_y)) as usize)
            .copied()
            .unwrap_or(0)
    }

    fn overall_correction(&self) -> i32 {
        if self.table.is_empty() {
            return 0;
        }
        let sum: i64 = self.table.iter().map(|&v| v as i64).sum();
        (sum / self.table.len() as i64) as i32
    }
}

/// Computes the bias-correction strategy named by `kind` over `raw`'s
/// buffer and the segment metadata it was decoded from. Returns a boxed
/// [`CorrectionFactors`] so callers (`BiasFactors` cache loader) don't need
/// to know which concrete strategy backs it.
pub fn compute_correction(kind: BiasKind, raw: &RawData) -> Result<Box<dyn CorrectionFactors>> {
    let segment = raw.segment.as_ref();
    Ok(match kind {
        BiasKind::None => Box::new(NoOp),
        BiasKind::SimpleOverscanSubtraction | BiasKind::SimpleOverscanSubOnly => {
            Box::new(ScalarCorrection(serial_overscan_mean(raw, segment)))
        }
        BiasKind::SimpleOverscanCorrection => {
            let serial = serial_overscan_mean(raw, segment);
            let parallel = parallel_overscan_mean(raw, segment);
            Box::new(ScalarCorrection(serial + parallel))
        }
        BiasKind::SimpleOverscanSubtraction2 => {
            Box::new(row_wise_serial_correction(raw, segment))
        }
    })
}

/// Mean of all samples in the serial overscan region: columns of the full
/// image outside `datasec`'s column span, over `datasec`'s row span.
fn serial_overscan_mean(raw: &RawData, segment: &Segment) -> i32 {
    let (n_axis1, _) = segment.dims;
    let datasec = segment.datasec;
    let mut sum: i64 = 0;
    let mut count: i64 = 0;
    for y in datasec.y..datasec.bottom() {
        for x in 0..n_axis1 {
            if x >= datasec.x && x < datasec.right() {
                continue;
            }
            sum += raw.buffer.sample_as_i32((y as usize) * n_axis1 as usize + x as usize) as i64;
            count += 1;
        }
    }
    mean_round(sum, count)
}

/// Mean of all samples in the parallel overscan region: rows of the full
/// image outside `datasec`'s row span, over `datasec`'s column span.
fn parallel_overscan_mean(raw: &RawData, segment: &Segment) -> i32 {
    let (n_axis1, n_axis2) = segment.dims;
    let datasec = segment.datasec;
    let mut sum: i64 = 0;
    let mut count: i64 = 0;
    for y in 0..n_axis2 {
        if y >= datasec.y && y < datasec.bottom() {
            continue;
        }
        for x in datasec.x..datasec.right() {
            sum += raw.buffer.sample_as_i32((y as usize) * n_axis1 as usize + x as usize) as i64;
            count += 1;
        }
    }
    mean_round(sum, count)
}

/// Per-row serial overscan mean: one scalar per row of `datasec`, each
/// averaged over that row's own serial-overscan columns.
fn row_wise_serial_correction(raw: &RawData, segment: &Segment) -> RowCorrection {
    let (n_axis1, _) = segment.dims;
    let datasec = segment.datasec;
    let mut table = Vec::with_capacity(datasec.height as usize);
    for y in datasec.y..datasec.bottom() {
        let mut sum: i64 = 0;
        let mut count: i64 = 0;
        for x in 0..n_axis1 {
            if x >= datasec.x && x < datasec.right() {
                continue;
            }
            sum += raw.buffer.sample_as_i32((y as usize) * n_axis1 as usize + x as usize) as i64;
            count += 1;
        }
        table.push(mean_round(sum, count));
    }
    RowCorrection { table, datasec_y: datasec.y }
}

fn mean_round(sum: i64, count: i64) -> i32 {
    if count == 0 {
        return 0;
    }
    // Round-half-away-from-zero, matching the "rounded to i32" wording in
    // spec.md §4.5 rather than truncating toward zero.
    let half = count / 2;
    let rounded = if sum >= 0 { (sum + half) / count } else { (sum - half) / count };
    rounded as i32
}
