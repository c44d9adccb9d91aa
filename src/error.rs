//! Error taxonomy for core ROI operations.
//!
//! Every variant is raised at the point of violation and propagated to the
//! caller. Failed tree mutations leave the session untouched.
use crate::roi::RoiId;

/// Errors produced by the ROI core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoiError {
    /// Non-positive split length, part count or window size.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs a path with positive length.
    #[error("degenerate geometry: {0:?} has zero path length")]
    DegenerateGeometry(RoiId),

    /// Join requested at the first/last segment of a branch.
    #[error("segment {0:?} has no {1} neighbor")]
    NoSuchNeighbor(RoiId, &'static str),

    /// Item missing from a cyclic list.
    #[error("item not found in list")]
    NotFound,

    /// Navigation on an empty cyclic list.
    #[error("list is empty")]
    Empty,

    /// The ROI is not owned by any tracked collection.
    #[error("roi {0:?} is not managed by this session")]
    NotManaged(RoiId),

    /// Index outside `[0, len)`.
    #[error("{what} {index} out of range [0, {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Array dimensions do not agree.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Malformed SWC skeleton text.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Persisted container is missing an entry or has the wrong layout.
    #[error("malformed container: {0}")]
    Format(String),
}

pub type RoiResult<T> = Result<T, RoiError>;
