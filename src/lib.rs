#![doc = include_str!("../README.md")]

// Core model
pub mod cyclic;
pub mod error;
pub mod roi;
pub mod selection;
pub mod session;

// Image side: stack, elevation map, mask
pub mod edges;
pub mod image;
pub mod mask;

// Derived data and edits
pub mod edit;
pub mod trace;

// Surfaces
pub mod config;
pub mod persist;
pub mod render;
pub mod skeleton;

// --- High-level re-exports -------------------------------------------------

pub use crate::config::SessionConfig;
pub use crate::error::{RoiError, RoiResult};
pub use crate::session::Session;

pub use crate::edit::JoinDirection;
pub use crate::roi::{ControlPoint, Roi, RoiId, RoiKind};
pub use crate::selection::Selected;
pub use crate::trace::{PostProcess, Trace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for scripts and tests.
///
/// ```no_run
/// use dendrite_roi::prelude::*;
///
/// # fn main() -> Result<(), RoiError> {
/// let (h, w, frames) = (64usize, 64usize, 10usize);
/// let stack = Stack::from_vec(h, w, frames, vec![0.0; h * w * frames])?;
/// let mut session = Session::new(stack, None, &SessionConfig::default())?;
///
/// let branch = session.add_branch(vec![
///     ControlPoint::new(4.0, 32.0, 0.0, 2.0),
///     ControlPoint::new(60.0, 32.0, 0.0, 2.0),
/// ])?;
/// session.split_branch(branch, 14.0)?;
/// let traces = session.linescan(branch)?;
/// println!("segments={}", traces.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, Stack};
    pub use crate::{
        ControlPoint, JoinDirection, RoiError, RoiId, Selected, Session, SessionConfig,
    };
}
