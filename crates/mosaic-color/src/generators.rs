//! Closed-form 256-entry table generators for each named colormap.

/// Identity greyscale ramp: `value == value`.
pub fn grey() -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = [i as u8; 3];
    }
    table
}

/// Pass-through identity used for `showBiasRegion`/debugging; distinct from
/// `grey` only in name, per `spec.md` §6's menu (`null` is its own entry).
pub fn null() -> [[u8; 3]; 256] {
    grey()
}

/// The Green (2011) cubehelix formula, parameterized by start hue, number of
/// rotations, saturation, and gamma. Produces a perceptually-monotonic ramp
/// that sweeps through hue without the banding a plain HSV rainbow shows.
fn cubehelix(start: f64, rotations: f64, hue: f64, gamma: f64) -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let fract = i as f64 / 255.0;
        let lambda = fract.powf(gamma);
        let phi = std::f64::consts::TAU * (start / 3.0 + rotations * fract);
        let amp = hue * lambda * (1.0 - lambda) / 2.0;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let r = lambda + amp * (-0.14861 * cos_phi + 1.78277 * sin_phi);
        let g = lambda + amp * (-0.29227 * cos_phi - 0.90649 * sin_phi);
        let b = lambda + amp * (1.97294 * cos_phi);
        *entry = [to_byte(r), to_byte(g), to_byte(b)];
    }
    table
}

/// `cubehelix0`: the default Green (2011) parameterization (start=0.5,
/// 1.5 rotations, full saturation).
pub fn cubehelix0() -> [[u8; 3]; 256] {
    cubehelix(0.5, -1.5, 1.0, 1.0)
}

/// `cubehelix1`: a second rotation/start combination giving a visibly
/// different sweep, used where the default cubehelix's hue order doesn't
/// suit the data.
pub fn cubehelix1() -> [[u8; 3]; 256] {
    cubehelix(2.0, 1.0, 1.2, 0.9)
}

/// A plain HSV hue sweep from red through violet, full saturation and value.
pub fn rainbow() -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let hue = i as f64 / 255.0 * 300.0; // red (0) to violet (300), degrees
        *entry = hsv_to_rgb(hue, 1.0, 1.0);
    }
    table
}

fn hsv_to_rgb(hue_deg: f64, s: f64, v: f64) -> [u8; 3] {
    let h = hue_deg / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;
    let (r1, g1, b1) = match h as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [to_byte(r1 + m), to_byte(g1 + m), to_byte(b1 + m)]
}

/// DS9-style piecewise linear ramp defined by fractional `(position, [r,g,b])`
/// control points, linearly interpolated between them.
fn piecewise(points: &[(f64, [f64; 3])]) -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let t = i as f64 / 255.0;
        let mut lo = points[0];
        let mut hi = *points.last().unwrap();
        for window in points.windows(2) {
            if t >= window[0].0 && t <= window[1].0 {
                lo = window[0];
                hi = window[1];
                break;
            }
        }
        let span = (hi.0 - lo.0).max(f64::EPSILON);
        let frac = ((t - lo.0) / span).clamp(0.0, 1.0);
        let rgb = [
            lo.1[0] + (hi.1[0] - lo.1[0]) * frac,
            lo.1[1] + (hi.1[1] - lo.1[1]) * frac,
            lo.1[2] + (hi.1[2] - lo.1[2]) * frac,
        ];
        *entry = [to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2])];
    }
    table
}

/// `a`: a DS9-style ramp running black -> red -> yellow -> white.
pub fn a() -> [[u8; 3]; 256] {
    piecewise(&[
        (0.0, [0.0, 0.0, 0.0]),
        (0.33, [1.0, 0.0, 0.0]),
        (0.66, [1.0, 1.0, 0.0]),
        (1.0, [1.0, 1.0, 1.0]),
    ])
}

/// `b`: a DS9-style ramp running black -> blue -> cyan -> white.
pub fn b() -> [[u8; 3]; 256] {
    piecewise(&[
        (0.0, [0.0, 0.0, 0.0]),
        (0.33, [0.0, 0.0, 1.0]),
        (0.66, [0.0, 1.0, 1.0]),
        (1.0, [1.0, 1.0, 1.0]),
    ])
}

/// `bb`: a "blackbody" ramp running black -> deep red -> orange -> white.
pub fn bb() -> [[u8; 3]; 256] {
    piecewise(&[
        (0.0, [0.0, 0.0, 0.0]),
        (0.25, [0.5, 0.0, 0.0]),
        (0.5, [1.0, 0.35, 0.0]),
        (0.75, [1.0, 0.8, 0.3]),
        (1.0, [1.0, 1.0, 1.0]),
    ])
}

/// `standard`: the default DS9-style grey-with-a-midtone-lift ramp.
pub fn standard() -> [[u8; 3]; 256] {
    piecewise(&[
        (0.0, [0.0, 0.0, 0.0]),
        (0.25, [0.15, 0.15, 0.2]),
        (0.5, [0.5, 0.5, 0.55]),
        (0.75, [0.85, 0.85, 0.8]),
        (1.0, [1.0, 1.0, 1.0]),
    ])
}

#[inline]
fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
