//! Threshold-driven binary segmentation of the mean image.
//!
//! Pipeline per threshold `t`:
//! 1. Elevation map: normalized Sobel magnitude of the mean image
//!    (see [`crate::edges::elevation_map`]).
//! 2. Markers: background where `mean < t`, foreground where
//!    `mean > t * foreground_factor`, unlabeled in between.
//! 3. Flooding from the markers over the elevation map assigns every
//!    reachable pixel to one class; the mask is the foreground class.
//!
//! The mask is regenerated from scratch on every threshold change. Any
//! positive threshold is accepted, including ones yielding an empty or a full
//! mask. The elevation map does not depend on `t` and is computed once.

mod watershed;

pub use watershed::watershed;

use crate::edges::elevation_map;
use crate::image::ImageF32;
use log::debug;
use serde::{Deserialize, Serialize};

pub const BACKGROUND: u8 = 1;
pub const FOREGROUND: u8 = 2;

/// Binary foreground mask plus the threshold it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub w: usize,
    pub h: usize,
    pub threshold: f64,
    pub data: Vec<bool>,
}

impl Mask {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// Label pixels as background/foreground seeds. Foreground takes precedence
/// when both conditions hold (only possible for a non-positive threshold).
pub fn markers(mean: &ImageF32, threshold: f64, foreground_factor: f64) -> Vec<u8> {
    let fg = threshold * foreground_factor;
    mean.data
        .iter()
        .map(|&v| {
            let v = v as f64;
            if v > fg {
                FOREGROUND
            } else if v < threshold {
                BACKGROUND
            } else {
                0
            }
        })
        .collect()
}

/// `q`-th percentile (0..=100) with linear interpolation between order
/// statistics. NaN values are ignored; returns NaN when nothing is left.
pub fn percentile(values: &[f32], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| v as f64)
        .collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Owns the mean image, its elevation map and the current mask.
#[derive(Clone, Debug)]
pub struct MaskEngine {
    mean: ImageF32,
    elevation: ImageF32,
    foreground_factor: f64,
    mask: Mask,
}

impl MaskEngine {
    pub fn new(mean: ImageF32, threshold: f64, foreground_factor: f64) -> Self {
        let elevation = elevation_map(&mean);
        let mask = segment(&mean, &elevation, threshold, foreground_factor);
        Self {
            mean,
            elevation,
            foreground_factor,
            mask,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.mask.threshold
    }

    /// Regenerate the mask for a new threshold.
    pub fn set_threshold(&mut self, threshold: f64) -> &Mask {
        self.mask = segment(
            &self.mean,
            &self.elevation,
            threshold,
            self.foreground_factor,
        );
        &self.mask
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mean(&self) -> &ImageF32 {
        &self.mean
    }

    pub fn elevation(&self) -> &ImageF32 {
        &self.elevation
    }

    /// Replace the mask wholesale, e.g. when restoring a persisted session.
    pub(crate) fn restore(&mut self, mask: Mask) {
        self.mask = mask;
    }
}

fn segment(mean: &ImageF32, elevation: &ImageF32, threshold: f64, factor: f64) -> Mask {
    let seeds = markers(mean, threshold, factor);
    let labels = watershed(elevation, &seeds);
    let data: Vec<bool> = labels.iter().map(|&l| l == FOREGROUND).collect();
    let mask = Mask {
        w: mean.w,
        h: mean.h,
        threshold,
        data,
    };
    debug!(
        "MaskEngine::segment threshold={threshold:.4} foreground={} / {}",
        mask.count(),
        mask.data.len()
    );
    mask
}
