use dendrite_roi::image::Stack;
use dendrite_roi::ControlPoint;
use std::ops::Range;

/// Stack with a rectangular bright band on a flat background. Band pixels
/// take `signal(t)` in frame `t`.
pub fn band_stack(
    width: usize,
    height: usize,
    frames: usize,
    rows: Range<usize>,
    cols: Range<usize>,
    background: f32,
    signal: impl Fn(usize) -> f32,
) -> Stack {
    assert!(width > 0 && height > 0 && frames > 0, "stack dimensions must be positive");
    let mut data = vec![background; width * height * frames];
    for y in rows {
        for x in cols.clone() {
            for t in 0..frames {
                data[(y * width + x) * frames + t] = signal(t);
            }
        }
    }
    Stack::from_vec(height, width, frames, data).expect("consistent shape")
}

/// Control points through `xy` with a constant radius, in the image plane.
pub fn polyline(xy: &[(f64, f64)], radius: f64) -> Vec<ControlPoint> {
    xy.iter()
        .map(|&(x, y)| ControlPoint::new(x, y, 0.0, radius))
        .collect()
}

/// Band around row 20 of an 80×40 stack, 6 frames, signal `10 + t`.
pub fn dendrite_stack() -> Stack {
    band_stack(80, 40, 6, 18..23, 4..76, 1.0, |t| 10.0 + t as f32)
}
