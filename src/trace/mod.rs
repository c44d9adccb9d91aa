//! Per-ROI intensity traces.
//!
//! - [`extract`]: mean over a pixel set for every frame of a stack.
//! - [`TraceCache`]: lazily materialized traces keyed by ROI identity.
//! - [`HoldSlots`]: pinned trace snapshots for comparison.
//! - [`PostProcess`]: detrend/smoothing applied after cache retrieval.

mod cache;
mod extract;
mod hold;
mod postprocess;

pub use cache::TraceCache;
pub use extract::mean_trace;
pub use hold::{HeldTrace, HoldSlots};
pub use postprocess::{detrend, smoothen, PostProcess};

use std::rc::Rc;

/// One scalar per frame. Shared so that cache hits hand out the same buffer.
pub type Trace = Rc<[f64]>;
