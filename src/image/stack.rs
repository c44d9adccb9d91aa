//! Time-resolved image stack of shape `[height, width, frames]`.
//!
//! Storage is frame-fastest: the time series of pixel (x, y) is the contiguous
//! slice `data[(y * w + x) * frames..][..frames]`, which keeps per-ROI trace
//! extraction a linear scan over each owned pixel.
use super::ImageF32;
use crate::error::{RoiError, RoiResult};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct Stack {
    pub w: usize,
    pub h: usize,
    pub frames: usize,
    pub data: Vec<f32>,
}

impl Stack {
    /// Wrap a frame-fastest buffer. Dimensions follow the `[h, w, frames]`
    /// array shape, unlike [`ImageF32::from_vec`] which takes `(w, h)`.
    pub fn from_vec(h: usize, w: usize, frames: usize, data: Vec<f32>) -> RoiResult<Self> {
        if frames == 0 {
            return Err(RoiError::InvalidArgument(
                "stack needs at least one frame".into(),
            ));
        }
        if data.len() != h * w * frames {
            return Err(RoiError::ShapeMismatch {
                expected: vec![h, w, frames],
                actual: vec![data.len()],
            });
        }
        Ok(Self { w, h, frames, data })
    }

    /// Interleave a sequence of equally sized frames.
    pub fn from_frames(frames: &[ImageF32]) -> RoiResult<Self> {
        let first = frames.first().ok_or_else(|| {
            RoiError::InvalidArgument("stack needs at least one frame".into())
        })?;
        let (w, h, n) = (first.w, first.h, frames.len());
        let mut data = vec![0.0f32; w * h * n];
        for (t, frame) in frames.iter().enumerate() {
            if frame.w != w || frame.h != h {
                return Err(RoiError::ShapeMismatch {
                    expected: vec![h, w],
                    actual: vec![frame.h, frame.w],
                });
            }
            for y in 0..h {
                for x in 0..w {
                    data[(y * w + x) * n + t] = frame.get(x, y);
                }
            }
        }
        Ok(Self {
            w,
            h,
            frames: n,
            data,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.h, self.w, self.frames]
    }

    /// Time series of a single pixel.
    #[inline]
    pub fn series(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.w + x) * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Copy out frame `t`.
    pub fn frame(&self, t: usize) -> RoiResult<ImageF32> {
        if t >= self.frames {
            return Err(RoiError::OutOfRange {
                what: "frame",
                index: t,
                len: self.frames,
            });
        }
        let mut out = ImageF32::new(self.w, self.h);
        for (dst, series) in out.data.iter_mut().zip(self.data.chunks_exact(self.frames)) {
            *dst = series[t];
        }
        Ok(out)
    }

    /// Average over the frame axis.
    pub fn mean_image(&self) -> ImageF32 {
        let mut out = ImageF32::new(self.w, self.h);
        let n = self.frames as f32;
        #[cfg(feature = "parallel")]
        out.data
            .par_iter_mut()
            .zip(self.data.par_chunks_exact(self.frames))
            .for_each(|(dst, series)| *dst = series.iter().sum::<f32>() / n);
        #[cfg(not(feature = "parallel"))]
        for (dst, series) in out.data.iter_mut().zip(self.data.chunks_exact(self.frames)) {
            *dst = series.iter().sum::<f32>() / n;
        }
        out
    }
}
