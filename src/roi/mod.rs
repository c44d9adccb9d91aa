//! ROI entities and the arena that owns them.
//!
//! Every ROI lives in a [`RoiArena`] under a stable [`RoiId`] that is never
//! reused. Branches own their segments through the id list in
//! [`BranchRoi::children`]; a segment refers back to its branch by id, so no
//! ROI holds a pointer into another.
//!
//! The four kinds are variants of [`Roi`]:
//! - [`BranchRoi`]: a skeleton path, optionally split into segments.
//! - [`SegmentRoi`]: a contiguous sub-path of a branch.
//! - [`PolygonRoi`]: a closed freehand outline.
//! - [`PixelRoi`]: an explicit pixel set.
//!
//! Branch and segment pixels are intersected with the current mask when
//! traces are extracted; polygon and pixel ROIs are not.

mod kinds;
pub mod path;
pub mod raster;

pub use kinds::{BranchRoi, PixelRoi, PolygonRoi, SegmentRoi};
pub use path::{ControlPoint, Path};

use crate::error::{RoiError, RoiResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identity of a ROI within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoiId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiKind {
    Branch,
    Segment,
    Polygon,
    Pixel,
}

impl RoiKind {
    /// Whether extraction is restricted to mask foreground.
    pub fn is_mask_dependent(self) -> bool {
        matches!(self, RoiKind::Branch | RoiKind::Segment)
    }
}

#[derive(Clone, Debug)]
pub enum Roi {
    Branch(BranchRoi),
    Segment(SegmentRoi),
    Polygon(PolygonRoi),
    Pixel(PixelRoi),
}

impl Roi {
    pub fn kind(&self) -> RoiKind {
        match self {
            Roi::Branch(_) => RoiKind::Branch,
            Roi::Segment(_) => RoiKind::Segment,
            Roi::Polygon(_) => RoiKind::Polygon,
            Roi::Pixel(_) => RoiKind::Pixel,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Roi::Branch(b) => b.active,
            Roi::Segment(s) => s.active,
            Roi::Polygon(p) => p.active,
            Roi::Pixel(p) => p.active,
        }
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        match self {
            Roi::Branch(b) => b.active = active,
            Roi::Segment(s) => s.active = active,
            Roi::Polygon(p) => p.active = active,
            Roi::Pixel(p) => p.active = active,
        }
    }

    /// Skeleton path for branches and segments.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Roi::Branch(b) => Some(&b.path),
            Roi::Segment(s) => Some(&s.path),
            Roi::Polygon(_) | Roi::Pixel(_) => None,
        }
    }

    /// Pixels covered by the geometry, clipped to a `width × height` image.
    /// No mask is applied here.
    pub fn pixels(&self, width: usize, height: usize) -> Vec<(usize, usize)> {
        match self {
            Roi::Branch(b) => raster::tube_pixels(&b.path, width, height),
            Roi::Segment(s) => raster::tube_pixels(&s.path, width, height),
            Roi::Polygon(p) => raster::polygon_pixels(&p.outline, width, height),
            Roi::Pixel(p) => p
                .pixels
                .iter()
                .filter(|&&(x, y)| {
                    x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height
                })
                .map(|&(x, y)| (x as usize, y as usize))
                .collect(),
        }
    }
}

/// Owner of every ROI in a session.
#[derive(Clone, Debug, Default)]
pub struct RoiArena {
    next_id: u32,
    rois: HashMap<RoiId, Roi>,
}

impl RoiArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, roi: Roi) -> RoiId {
        let id = RoiId(self.next_id);
        self.next_id += 1;
        self.rois.insert(id, roi);
        id
    }

    pub fn remove(&mut self, id: RoiId) -> Option<Roi> {
        self.rois.remove(&id)
    }

    pub fn contains(&self, id: RoiId) -> bool {
        self.rois.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    pub fn get(&self, id: RoiId) -> RoiResult<&Roi> {
        self.rois.get(&id).ok_or(RoiError::NotManaged(id))
    }

    pub(crate) fn get_mut(&mut self, id: RoiId) -> RoiResult<&mut Roi> {
        self.rois.get_mut(&id).ok_or(RoiError::NotManaged(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoiId, &Roi)> {
        self.rois.iter().map(|(&id, roi)| (id, roi))
    }

    /// Ids of every ROI with the active flag set, sorted.
    pub fn active_ids(&self) -> Vec<RoiId> {
        let mut ids: Vec<RoiId> = self
            .iter()
            .filter(|(_, roi)| roi.is_active())
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    pub fn branch(&self, id: RoiId) -> RoiResult<&BranchRoi> {
        match self.get(id)? {
            Roi::Branch(b) => Ok(b),
            other => Err(wrong_kind(id, RoiKind::Branch, other.kind())),
        }
    }

    pub(crate) fn branch_mut(&mut self, id: RoiId) -> RoiResult<&mut BranchRoi> {
        match self.get_mut(id)? {
            Roi::Branch(b) => Ok(b),
            other => Err(wrong_kind(id, RoiKind::Branch, other.kind())),
        }
    }

    pub fn segment(&self, id: RoiId) -> RoiResult<&SegmentRoi> {
        match self.get(id)? {
            Roi::Segment(s) => Ok(s),
            other => Err(wrong_kind(id, RoiKind::Segment, other.kind())),
        }
    }

    pub(crate) fn segment_mut(&mut self, id: RoiId) -> RoiResult<&mut SegmentRoi> {
        match self.get_mut(id)? {
            Roi::Segment(s) => Ok(s),
            other => Err(wrong_kind(id, RoiKind::Segment, other.kind())),
        }
    }

    pub fn polygon(&self, id: RoiId) -> RoiResult<&PolygonRoi> {
        match self.get(id)? {
            Roi::Polygon(p) => Ok(p),
            other => Err(wrong_kind(id, RoiKind::Polygon, other.kind())),
        }
    }

    pub(crate) fn polygon_mut(&mut self, id: RoiId) -> RoiResult<&mut PolygonRoi> {
        match self.get_mut(id)? {
            Roi::Polygon(p) => Ok(p),
            other => Err(wrong_kind(id, RoiKind::Polygon, other.kind())),
        }
    }

    pub(crate) fn pixel_roi_mut(&mut self, id: RoiId) -> RoiResult<&mut PixelRoi> {
        match self.get_mut(id)? {
            Roi::Pixel(p) => Ok(p),
            other => Err(wrong_kind(id, RoiKind::Pixel, other.kind())),
        }
    }

    pub fn pixel_roi(&self, id: RoiId) -> RoiResult<&PixelRoi> {
        match self.get(id)? {
            Roi::Pixel(p) => Ok(p),
            other => Err(wrong_kind(id, RoiKind::Pixel, other.kind())),
        }
    }

    pub(crate) fn set_active(&mut self, id: RoiId, active: bool) {
        if let Some(roi) = self.rois.get_mut(&id) {
            roi.set_active(active);
        }
    }
}

fn wrong_kind(id: RoiId, expected: RoiKind, actual: RoiKind) -> RoiError {
    RoiError::InvalidArgument(format!("{id:?} is a {actual:?} roi, expected {expected:?}"))
}
