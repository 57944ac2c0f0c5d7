//! 2D affine transform mapping segment-local pixel coordinates to
//! focal-plane coordinates (the per-segment "WCS translation").
//!
//! # Convention
//!
//! Built from the FITS `PC1_1, PC1_2, PC2_1, PC2_2` rotation matrix and
//! `CRVAL1, CRVAL2` reference point:
//!
//! ```text
//! | fx |   | pc1_1 pc1_2 |   | x |   | crval1 |
//! | fy | = | pc2_1 pc2_2 | * | y | + | crval2 |
//! ```
//!
//! Segment decoding (C2) additionally composes a translation by
//! `(datasec.x + 0.5, datasec.y + 0.5)` before this matrix is applied, per
//! `spec.md` §4.2 — callers should use [`Affine::translated`] to build that
//! composite rather than applying two affines independently, to avoid the
//! float-error accumulation the design notes warn about (§9).

/// A 2D affine transform: a 2x2 linear map plus a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Row-major 2x2 linear coefficients `[pc1_1, pc1_2, pc2_1, pc2_2]`.
    pub pc: [f64; 4],
    /// Translation applied after the linear map.
    pub translation: (f64, f64),
}

impl Affine {
    /// The identity transform: no rotation, no translation.
    pub const IDENTITY: Affine = Affine {
        pc: [1.0, 0.0, 0.0, 1.0],
        translation: (0.0, 0.0),
    };

    /// Builds an affine from the FITS `PC`/`CRVAL` keyword values.
    pub const fn new(pc1_1: f64, pc2_1: f64, pc1_2: f64, pc2_2: f64, crval1: f64, crval2: f64) -> Self {
        Self {
            pc: [pc1_1, pc1_2, pc2_1, pc2_2],
            translation: (crval1, crval2),
        }
    }

    /// Applies `(x, y) -> (fx, fy)`.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let fx = self.pc[0] * x + self.pc[1] * y + self.translation.0;
        let fy = self.pc[2] * x + self.pc[3] * y + self.translation.1;
        (fx, fy)
    }

    /// Returns a new affine equal to `self` pre-composed with a translation
    /// by `(dx, dy)` applied *before* the linear map — i.e. the transform
    /// that first shifts local pixel coordinates by `(dx, dy)` and then
    /// applies this affine's rotation and translation.
    ///
    /// This realizes the `datasec.x + 0.5, datasec.y + 0.5` shift from
    /// `spec.md` §4.2 without ever materializing an intermediate point in a
    /// separate floating-point pass.
    pub fn translated(&self, dx: f64, dy: f64) -> Affine {
        let (shift_x, shift_y) = self.apply(dx, dy);
        Affine {
            pc: self.pc,
            translation: (shift_x, shift_y),
        }
    }

    /// Returns a new affine whose translation is additionally shifted by
    /// `(dx, dy)` in focal-plane units. Used for the raft-grid correction
    /// applied to the `Q`→`E` WCS special case (`spec.md` §4.2).
    pub fn shifted_by(&self, dx: f64, dy: f64) -> Affine {
        Affine {
            pc: self.pc,
            translation: (self.translation.0 + dx, self.translation.1 + dy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        assert_eq!(Affine::IDENTITY.apply(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn translated_shifts_before_linear_map() {
        let rotate_90 = Affine::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let shifted = rotate_90.translated(10.5, 20.5);
        // apply(10.5, 20.5) under rotate_90 becomes the new translation.
        assert_eq!(shifted.translation, rotate_90.apply(10.5, 20.5));
        // Then a local-origin point maps to that same translation.
        assert_eq!(shifted.apply(0.0, 0.0), shifted.translation);
    }

    #[test]
    fn shifted_by_adds_in_focal_plane_units() {
        let a = Affine::new(1.0, 0.0, 0.0, 1.0, 100.0, 200.0);
        let shifted = a.shifted_by(12700.0, 0.0);
        assert_eq!(shifted.translation, (12800.0, 200.0));
    }
}
