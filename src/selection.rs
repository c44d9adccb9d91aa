//! Single-active-ROI state machine.
//!
//! At most one ROI is selected. Selecting a segment also marks its parent
//! branch active; that flag is derived and cannot be set on its own. The
//! selection only touches `active` flags through [`Selection::set_active`]
//! and [`Selection::forget`].
use crate::error::RoiResult;
use crate::roi::{Roi, RoiArena, RoiId};
use log::debug;

/// The current selection as a tagged variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selected {
    #[default]
    None,
    Branch(RoiId),
    Segment { segment: RoiId, parent: RoiId },
    Polygon(RoiId),
    Pixel(RoiId),
}

impl Selected {
    fn of(arena: &RoiArena, id: RoiId) -> RoiResult<Self> {
        Ok(match arena.get(id)? {
            Roi::Branch(_) => Selected::Branch(id),
            Roi::Segment(s) => Selected::Segment {
                segment: id,
                parent: s.parent(),
            },
            Roi::Polygon(_) => Selected::Polygon(id),
            Roi::Pixel(_) => Selected::Pixel(id),
        })
    }

    pub fn id(&self) -> Option<RoiId> {
        match *self {
            Selected::None => None,
            Selected::Branch(id) | Selected::Polygon(id) | Selected::Pixel(id) => Some(id),
            Selected::Segment { segment, .. } => Some(segment),
        }
    }

    /// The selected branch, or the parent of the selected segment.
    pub fn branch(&self) -> Option<RoiId> {
        match *self {
            Selected::Branch(id) => Some(id),
            Selected::Segment { parent, .. } => Some(parent),
            Selected::None | Selected::Polygon(_) | Selected::Pixel(_) => None,
        }
    }

    pub fn segment(&self) -> Option<RoiId> {
        match *self {
            Selected::Segment { segment, .. } => Some(segment),
            _ => None,
        }
    }

    pub fn polygon(&self) -> Option<RoiId> {
        match *self {
            Selected::Polygon(id) => Some(id),
            _ => None,
        }
    }

    pub fn pixel(&self) -> Option<RoiId> {
        match *self {
            Selected::Pixel(id) => Some(id),
            _ => None,
        }
    }

    /// True if `id` is the selected ROI or the parent of the selected segment.
    pub fn involves(&self, id: RoiId) -> bool {
        self.id() == Some(id) || self.branch() == Some(id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Selection {
    current: Selected,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selected {
        self.current
    }

    /// Make `target` the active ROI. Returns `false` when it already was.
    pub fn set_active(&mut self, arena: &mut RoiArena, target: Option<RoiId>) -> RoiResult<bool> {
        let next = match target {
            Some(id) => Selected::of(arena, id)?,
            None => Selected::None,
        };
        if next == self.current {
            return Ok(false);
        }

        if let Some(id) = self.current.id() {
            arena.set_active(id, false);
        }
        if let Selected::Segment { parent, .. } = self.current {
            let same_parent = matches!(next, Selected::Segment { parent: p, .. } if p == parent);
            if !same_parent {
                arena.set_active(parent, false);
            }
        }

        debug!("Selection::set_active {:?} -> {:?}", self.current, next);
        self.current = next;

        if let Some(id) = next.id() {
            arena.set_active(id, true);
        }
        if let Selected::Segment { parent, .. } = next {
            arena.set_active(parent, true);
        }
        Ok(true)
    }

    /// Drop the selection if it involves `id`, clearing the flags of any ROI
    /// still in the arena. Returns whether the selection was dropped.
    pub fn forget(&mut self, arena: &mut RoiArena, id: RoiId) -> bool {
        if !self.current.involves(id) {
            return false;
        }
        if let Some(sel) = self.current.id() {
            arena.set_active(sel, false);
        }
        if let Some(branch) = self.current.branch() {
            arena.set_active(branch, false);
        }
        debug!("Selection::forget {:?} (removed {:?})", self.current, id);
        self.current = Selected::None;
        true
    }
}
