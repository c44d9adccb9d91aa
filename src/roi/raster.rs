//! Pixel membership for ROI geometries.
//!
//! Pixel `(x, y)` is the unit cell centred on integer coordinates, so column
//! `x` and row `y` of the image. Everything is clipped to the image; geometry
//! entirely outside yields an empty set.
use super::path::Path;

/// Thin paths still cover the pixels they cross.
const MIN_TUBE_RADIUS: f64 = 0.5;

/// Inclusive pixel bounds of `[min, max]` clipped to `[0, size)`.
fn clip_range(min: f64, max: f64, size: usize) -> Option<(usize, usize)> {
    if size == 0 || !min.is_finite() || !max.is_finite() {
        return None;
    }
    let lo = min.floor().max(0.0);
    let hi = max.ceil().min((size - 1) as f64);
    (lo <= hi).then_some((lo as usize, hi as usize))
}

/// Pixels whose centre lies within the interpolated radius of the xy
/// projection of `path`.
pub fn tube_pixels(path: &Path, width: usize, height: usize) -> Vec<(usize, usize)> {
    let pts = path.points();
    if pts.is_empty() {
        return Vec::new();
    }
    let reach = pts
        .iter()
        .map(|p| p.radius.max(MIN_TUBE_RADIUS))
        .fold(0.0, f64::max);
    let (min_x, max_x) = pts
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });
    let (min_y, max_y) = pts
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let (Some((x0, x1)), Some((y0, y1))) = (
        clip_range(min_x - reach, max_x + reach, width),
        clip_range(min_y - reach, max_y + reach, height),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if within_tube(path, x as f64, y as f64) {
                out.push((x, y));
            }
        }
    }
    out
}

fn within_tube(path: &Path, px: f64, py: f64) -> bool {
    let pts = path.points();
    if pts.len() == 1 {
        let p = &pts[0];
        return (px - p.x).hypot(py - p.y) <= p.radius.max(MIN_TUBE_RADIUS);
    }
    pts.windows(2).any(|pair| {
        let (a, b) = (&pair[0], &pair[1]);
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (cx, cy) = (a.x + dx * t, a.y + dy * t);
        let radius = (a.radius + (b.radius - a.radius) * t).max(MIN_TUBE_RADIUS);
        (px - cx).hypot(py - cy) <= radius
    })
}

/// Even-odd point-in-polygon test.
pub fn contains_point(outline: &[[f64; 2]], px: f64, py: f64) -> bool {
    let n = outline.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = outline[i];
        let [xj, yj] = outline[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Pixels whose centre lies inside the closed `outline`.
pub fn polygon_pixels(outline: &[[f64; 2]], width: usize, height: usize) -> Vec<(usize, usize)> {
    if outline.len() < 3 {
        return Vec::new();
    }
    let (min_x, max_x) = outline
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        });
    let (min_y, max_y) = outline
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[1]), hi.max(p[1]))
        });
    let (Some((x0, x1)), Some((y0, y1))) = (
        clip_range(min_x, max_x, width),
        clip_range(min_y, max_y, height),
    ) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if contains_point(outline, x as f64, y as f64) {
                out.push((x, y));
            }
        }
    }
    out
}
