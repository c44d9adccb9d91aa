//! Image gradients used as the elevation map for marker-based flooding.
//!
//! Borders are handled by clamping indices (replicate), so the output has the
//! same shape as the input.

pub mod grad;

pub use grad::{elevation_map, sobel_gradients, Grad};
