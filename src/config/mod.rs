//! Configuration types, loaded from JSON.
//!
//! - [`SessionConfig`]: tunables of the analysis session.
//! - [`export`]: settings of the `roi_export` tool.

pub mod export;

use crate::trace::PostProcess;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Initial threshold as a percentile (0..=100) of the mean image.
    pub threshold_percentile: f64,
    /// Foreground markers need `mean > threshold * foreground_factor`.
    pub foreground_factor: f64,
    /// Number of trace comparison slots.
    pub hold_slots: usize,
    /// Applied by [`crate::Session::postprocessed_trace`].
    pub postprocess: PostProcess,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            threshold_percentile: 90.0,
            foreground_factor: 1.1,
            hold_slots: 3,
            postprocess: PostProcess::default(),
        }
    }
}
