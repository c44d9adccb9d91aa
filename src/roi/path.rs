//! Skeleton polylines with arc-length parametrization.
//!
//! A [`Path`] is an ordered list of `(x, y, z, radius)` control points. Its
//! length is the sum of 3D Euclidean distances between consecutive points.
//! Sub-paths are cut at arbitrary arc-length positions; the cut points are
//! linearly interpolated (radius included), so slicing `[0, a]` and `[a, L]`
//! reproduces the original geometry exactly.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Relative tolerance used when comparing arc-length positions.
const ARC_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

impl ControlPoint {
    pub fn new(x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self { x, y, z, radius }
    }

    #[inline]
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.radius]
    }

    pub fn from_array(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    fn lerp(&self, other: &ControlPoint, t: f64) -> ControlPoint {
        ControlPoint {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
            radius: self.radius + (other.radius - self.radius) * t,
        }
    }

    fn approx_eq(&self, other: &ControlPoint, tol: f64) -> bool {
        (self.position() - other.position()).norm() <= tol
            && (self.radius - other.radius).abs() <= tol
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    points: Vec<ControlPoint>,
}

impl Path {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Arc length at every control point; first entry is 0.
    pub fn cumulative(&self) -> Vec<f64> {
        if self.points.is_empty() {
            return Vec::new();
        }
        let mut acc = 0.0;
        let mut out = Vec::with_capacity(self.points.len());
        out.push(0.0);
        for pair in self.points.windows(2) {
            acc += (pair[1].position() - pair[0].position()).norm();
            out.push(acc);
        }
        out
    }

    pub fn length(&self) -> f64 {
        self.cumulative().last().copied().unwrap_or(0.0)
    }

    /// Interpolated point at arc length `s`, clamped to `[0, length]`.
    pub fn point_at(&self, s: f64) -> Option<ControlPoint> {
        let cum = self.cumulative();
        self.point_at_with(&cum, s)
    }

    fn point_at_with(&self, cum: &[f64], s: f64) -> Option<ControlPoint> {
        match self.points.len() {
            0 => None,
            1 => Some(self.points[0]),
            n => {
                let total = cum[n - 1];
                let s = s.clamp(0.0, total);
                let i = cum.partition_point(|&c| c <= s).saturating_sub(1).min(n - 2);
                let span = cum[i + 1] - cum[i];
                if span <= 0.0 {
                    return Some(self.points[i]);
                }
                let t = ((s - cum[i]) / span).clamp(0.0, 1.0);
                Some(self.points[i].lerp(&self.points[i + 1], t))
            }
        }
    }

    /// Sub-path covering arc lengths `[start, end]`.
    pub fn slice(&self, start: f64, end: f64) -> Path {
        let cum = self.cumulative();
        let (Some(first), Some(last)) = (
            self.point_at_with(&cum, start),
            self.point_at_with(&cum, end),
        ) else {
            return Path::new(Vec::new());
        };
        let eps = ARC_EPS * cum.last().copied().unwrap_or(0.0).max(1.0);
        let mut points = vec![first];
        points.extend(
            self.points
                .iter()
                .zip(&cum)
                .filter(|(_, &c)| c > start + eps && c < end - eps)
                .map(|(p, _)| *p),
        );
        points.push(last);
        Path::new(points)
    }

    /// Cut at the given interior arc-length positions, yielding
    /// `boundaries.len() + 1` consecutive pieces.
    pub fn split_at(&self, boundaries: &[f64]) -> Vec<Path> {
        let total = self.length();
        let mut edges = Vec::with_capacity(boundaries.len() + 2);
        edges.push(0.0);
        edges.extend_from_slice(boundaries);
        edges.push(total);
        edges.windows(2).map(|w| self.slice(w[0], w[1])).collect()
    }

    /// Join `self` with the path that continues it. A duplicated junction
    /// point is dropped, and so is a junction lying on the straight line
    /// between its neighbours (as left behind by a previous cut), unless it
    /// matches one of `anchors`.
    pub fn concat(&self, next: &Path, anchors: &[ControlPoint]) -> Path {
        let tol = ARC_EPS * (self.length() + next.length()).max(1.0);
        let mut points = self.points.clone();
        let mut tail = next.points.iter().peekable();
        if let (Some(last), Some(head)) = (points.last(), tail.peek()) {
            if last.approx_eq(head, tol) {
                tail.next();
            }
        }
        let junction = points.len().saturating_sub(1);
        points.extend(tail.copied());
        if junction > 0 && junction + 1 < points.len() {
            let (a, m, b) = (points[junction - 1], points[junction], points[junction + 1]);
            let anchored = anchors.iter().any(|p| p.approx_eq(&m, tol));
            if !anchored && is_on_chord(&a, &m, &b, tol) {
                points.remove(junction);
            }
        }
        Path::new(points)
    }

    /// Closed 2D outline obtained by offsetting the xy projection by the local
    /// radius on both sides: left side forward, right side backward.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        let n = self.points.len();
        if n == 0 {
            return Vec::new();
        }
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            let prev = &self.points[i.saturating_sub(1)];
            let next = &self.points[(i + 1).min(n - 1)];
            let (tx, ty) = (next.x - prev.x, next.y - prev.y);
            let norm = (tx * tx + ty * ty).sqrt();
            let (nx, ny) = if norm > 0.0 {
                (-ty / norm, tx / norm)
            } else {
                (0.0, 1.0)
            };
            let p = &self.points[i];
            left.push([p.x + nx * p.radius, p.y + ny * p.radius]);
            right.push([p.x - nx * p.radius, p.y - ny * p.radius]);
        }
        right.reverse();
        left.extend(right);
        left
    }

    /// True when `pieces` are consecutive and cover `self` end to end: each
    /// piece starts where the previous one ends, the outer endpoints match
    /// and the lengths add up, all within `tol` relative to the total length.
    pub fn is_partitioned_by(&self, pieces: &[Path], tol: f64) -> bool {
        let total = self.length();
        let tol = tol * total.max(1.0);
        let ends = |p: &Path| Some((*p.points.first()?, *p.points.last()?));
        let Some((start, end)) = ends(self) else {
            return false;
        };
        let mut cursor = start;
        let mut covered = 0.0;
        for piece in pieces {
            let Some((first, last)) = ends(piece) else {
                return false;
            };
            if !first.approx_eq(&cursor, tol) {
                return false;
            }
            cursor = last;
            covered += piece.length();
        }
        !pieces.is_empty() && cursor.approx_eq(&end, tol) && (covered - total).abs() <= tol
    }

    /// Point-wise comparison of positions and radii.
    pub fn approx_eq(&self, other: &Path, tol: f64) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.approx_eq(b, tol))
    }
}

/// True when `m` lies on segment `a`–`b` with a linearly interpolated radius.
fn is_on_chord(a: &ControlPoint, m: &ControlPoint, b: &ControlPoint, tol: f64) -> bool {
    let ab = b.position() - a.position();
    let len = ab.norm();
    if len <= tol {
        return false;
    }
    let am = m.position() - a.position();
    let t = am.dot(&ab) / (len * len);
    if !(0.0..=1.0).contains(&t) {
        return false;
    }
    let off_line = am.cross(&ab).norm() / len;
    off_line <= tol && a.lerp(b, t).approx_eq(m, tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> ControlPoint {
        ControlPoint::new(x, y, 0.0, 1.0)
    }

    /// Bent path of length 100: 40 right, 30 up, 30 right.
    fn bent() -> Path {
        Path::new(vec![p(0.0, 0.0), p(40.0, 0.0), p(40.0, 30.0), p(70.0, 30.0)])
    }

    #[test]
    fn length_sums_euclidean_steps() {
        assert!((bent().length() - 100.0).abs() < 1e-12);
        let tilted = Path::new(vec![
            ControlPoint::new(0.0, 0.0, 0.0, 1.0),
            ControlPoint::new(3.0, 0.0, 4.0, 1.0),
        ]);
        assert!((tilted.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn point_at_interpolates_radius() {
        let path = Path::new(vec![
            ControlPoint::new(0.0, 0.0, 0.0, 1.0),
            ControlPoint::new(10.0, 0.0, 0.0, 3.0),
        ]);
        let mid = path.point_at(5.0).unwrap();
        assert!((mid.x - 5.0).abs() < 1e-12);
        assert!((mid.radius - 2.0).abs() < 1e-12);
    }

    #[test]
    fn slice_keeps_interior_vertices() {
        let piece = bent().slice(30.0, 60.0);
        let expected = Path::new(vec![p(30.0, 0.0), p(40.0, 0.0), p(40.0, 20.0)]);
        assert!(piece.approx_eq(&expected, 1e-9), "{piece:?}");
        assert!((piece.length() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn split_pieces_cover_full_length() {
        let pieces = bent().split_at(&[30.0, 60.0, 90.0]);
        let lengths: Vec<f64> = pieces.iter().map(Path::length).collect();
        for (got, want) in lengths.iter().zip([30.0, 30.0, 30.0, 10.0]) {
            assert!((got - want).abs() < 1e-9, "{lengths:?}");
        }
    }

    #[test]
    fn concat_of_halves_restores_original() {
        let path = bent();
        let halves = path.split_at(&[50.0]);
        let joined = halves[0].concat(&halves[1], path.points());
        assert!(joined.approx_eq(&path, 1e-9), "{joined:?}");
    }

    #[test]
    fn concat_keeps_anchored_collinear_vertex() {
        let straight = Path::new(vec![p(0.0, 0.0), p(10.0, 0.0), p(20.0, 0.0)]);
        let halves = straight.split_at(&[10.0]);
        let kept = halves[0].concat(&halves[1], straight.points());
        assert!(kept.approx_eq(&straight, 1e-9), "{kept:?}");

        let cut = straight.split_at(&[5.0]);
        let healed = cut[0].concat(&cut[1], straight.points());
        assert!(healed.approx_eq(&straight, 1e-9), "{healed:?}");
        assert_eq!(halves[0].concat(&halves[1], &[]).point_count(), 2);
    }

    #[test]
    fn partition_check_requires_full_coverage() {
        let path = bent();
        let pieces = path.split_at(&[30.0, 60.0]);
        assert!(path.is_partitioned_by(&pieces, 1e-9));
        assert!(!path.is_partitioned_by(&pieces[..2], 1e-9));
        assert!(!path.is_partitioned_by(&[pieces[1].clone(), pieces[0].clone()], 1e-9));
        assert!(!path.is_partitioned_by(&[], 1e-9));
    }

    #[test]
    fn concat_keeps_real_corner() {
        let a = Path::new(vec![p(0.0, 0.0), p(40.0, 0.0)]);
        let b = Path::new(vec![p(40.0, 0.0), p(40.0, 30.0)]);
        let joined = a.concat(&b, &[]);
        assert_eq!(joined.point_count(), 3);
        assert!((joined.length() - 70.0).abs() < 1e-12);
    }

    #[test]
    fn outline_offsets_by_radius() {
        let path = Path::new(vec![p(0.0, 0.0), p(10.0, 0.0)]);
        let outline = path.outline();
        assert_eq!(
            outline,
            vec![[0.0, 1.0], [10.0, 1.0], [10.0, -1.0], [0.0, -1.0]]
        );
    }
}
