use super::path::{ControlPoint, Path};
use super::RoiId;
use std::collections::BTreeSet;

/// Skeleton branch. Children, when present, partition `path` in order.
#[derive(Clone, Debug)]
pub struct BranchRoi {
    pub path: Path,
    pub(crate) children: Vec<RoiId>,
    pub(crate) active: bool,
}

impl BranchRoi {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self {
            path: Path::new(points),
            children: Vec::new(),
            active: false,
        }
    }

    /// Segment ids in physical order along the path.
    pub fn children(&self) -> &[RoiId] {
        &self.children
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Contiguous piece of a branch path.
#[derive(Clone, Debug)]
pub struct SegmentRoi {
    pub path: Path,
    pub(crate) parent: RoiId,
    pub(crate) index: usize,
    pub(crate) active: bool,
}

impl SegmentRoi {
    pub(crate) fn new(path: Path, parent: RoiId, index: usize) -> Self {
        Self {
            path,
            parent,
            index,
            active: false,
        }
    }

    /// Owning branch (navigation only).
    pub fn parent(&self) -> RoiId {
        self.parent
    }

    /// Position among the parent's children.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Freehand closed outline.
#[derive(Clone, Debug)]
pub struct PolygonRoi {
    pub(crate) outline: Vec<[f64; 2]>,
    pub(crate) active: bool,
}

impl PolygonRoi {
    pub fn new(outline: Vec<[f64; 2]>) -> Self {
        Self {
            outline,
            active: false,
        }
    }

    pub fn outline(&self) -> &[[f64; 2]] {
        &self.outline
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Unordered set of `(x, y)` pixel coordinates. Coordinates outside the
/// image are kept but never contribute to a trace.
#[derive(Clone, Debug)]
pub struct PixelRoi {
    pub(crate) pixels: BTreeSet<(i64, i64)>,
    pub(crate) active: bool,
}

impl PixelRoi {
    pub fn new(pixels: impl IntoIterator<Item = (i64, i64)>) -> Self {
        Self {
            pixels: pixels.into_iter().collect(),
            active: false,
        }
    }

    pub fn pixels(&self) -> &BTreeSet<(i64, i64)> {
        &self.pixels
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
