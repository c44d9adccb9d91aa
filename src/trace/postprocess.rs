//! Trace post-processing applied downstream of the cache.
//!
//! - Detrend: subtract the least-squares line through `(frame, value)`. Traces
//!   containing NaN or infinite values are passed through unchanged.
//! - Smoothen: centered moving sum of width `N` divided by `N`, zero padded at
//!   both ends, so edge frames are attenuated.
use crate::error::{RoiError, RoiResult};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcess {
    pub detrend: bool,
    /// Moving-average window in frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothen: Option<usize>,
}

impl PostProcess {
    pub fn is_identity(&self) -> bool {
        !self.detrend && self.smoothen.is_none()
    }

    pub fn apply(&self, trace: &[f64]) -> RoiResult<Vec<f64>> {
        let mut out = if self.detrend {
            detrend(trace)
        } else {
            trace.to_vec()
        };
        if let Some(window) = self.smoothen {
            out = smoothen(&out, window)?;
        }
        Ok(out)
    }
}

/// Remove the linear trend unless the trace has non-finite values.
pub fn detrend(trace: &[f64]) -> Vec<f64> {
    if trace.iter().any(|v| !v.is_finite()) {
        return trace.to_vec();
    }
    let n = trace.len();
    if n < 2 {
        let mean = trace.iter().sum::<f64>() / n.max(1) as f64;
        return trace.iter().map(|v| v - mean).collect();
    }
    let (mut sx, mut sxx, mut sy, mut sxy) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in trace.iter().enumerate() {
        let x = i as f64;
        sx += x;
        sxx += x * x;
        sy += y;
        sxy += x * y;
    }
    let normal = Matrix2::new(sxx, sx, sx, n as f64);
    let rhs = Vector2::new(sxy, sy);
    let Some(coef) = normal.lu().solve(&rhs) else {
        return trace.to_vec();
    };
    let (slope, intercept) = (coef[0], coef[1]);
    trace
        .iter()
        .enumerate()
        .map(|(i, &y)| y - (slope * i as f64 + intercept))
        .collect()
}

/// Centered moving average of width `window`; output has the input length.
pub fn smoothen(trace: &[f64], window: usize) -> RoiResult<Vec<f64>> {
    if window == 0 {
        return Err(RoiError::InvalidArgument(
            "smoothing window must be at least 1".into(),
        ));
    }
    let m = trace.len();
    let offset = (window.min(m.max(1)) - 1) / 2;
    let norm = window as f64;
    Ok((0..m)
        .map(|i| {
            let k = i + offset;
            let lo = k.saturating_sub(window - 1);
            let hi = k.min(m - 1);
            trace[lo..=hi].iter().sum::<f64>() / norm
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detrend_removes_line() {
        let trace: Vec<f64> = (0..10).map(|i| 3.0 + 0.5 * i as f64).collect();
        assert!(detrend(&trace).iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn detrend_skips_traces_with_nan() {
        let trace = vec![1.0, f64::NAN, 3.0];
        let out = detrend(&trace);
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn smoothen_matches_same_mode_convolution() {
        let trace = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = smoothen(&trace, 3).unwrap();
        let expected = [3.0 / 3.0, 6.0 / 3.0, 9.0 / 3.0, 12.0 / 3.0, 9.0 / 3.0];
        for (a, b) in out.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12, "{out:?}");
        }
        // Even window: numpy centers at (N - 1) / 2.
        let out = smoothen(&trace, 2).unwrap();
        assert_eq!(out, vec![0.5, 1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn zero_window_is_invalid() {
        assert!(matches!(
            smoothen(&[1.0], 0),
            Err(RoiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn apply_chains_detrend_then_smoothing() {
        let pp = PostProcess {
            detrend: true,
            smoothen: Some(1),
        };
        let out = pp.apply(&[2.0, 4.0, 6.0]).unwrap();
        assert!(out.iter().all(|v| v.abs() < 1e-9));
        assert!(PostProcess::default().is_identity());
    }
}
