//! Split/join mutations of the branch → segment tree.
//!
//! Each operation validates everything it needs before touching the arena, so
//! a failing call leaves the tree unchanged. Cache entries of removed
//! segments are invalidated; new segments start without a cached trace.
//! Selection and redraw batching are handled by the session that calls in.

mod join;
mod split;

pub use join::join_segments;
pub use split::{segment_count, split_branch, split_segment, MAX_SEGMENTS};

use crate::error::RoiResult;
use crate::roi::{Path, Roi, RoiArena, RoiId, SegmentRoi};
use crate::trace::TraceCache;
use serde::{Deserialize, Serialize};

/// Which neighbour to merge with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinDirection {
    Next,
    Previous,
}

impl JoinDirection {
    pub fn label(self) -> &'static str {
        match self {
            JoinDirection::Next => "next",
            JoinDirection::Previous => "previous",
        }
    }
}

/// Segments created and removed by one edit, in child order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub created: Vec<RoiId>,
    pub removed: Vec<RoiId>,
}

/// Replace every child of `branch` with segments built from `paths`.
/// `branch` must exist.
pub(crate) fn replace_children(
    arena: &mut RoiArena,
    cache: &mut TraceCache,
    branch: RoiId,
    paths: Vec<Path>,
) -> RoiResult<EditOutcome> {
    let removed = std::mem::take(&mut arena.branch_mut(branch)?.children);
    for &old in &removed {
        arena.remove(old);
        cache.invalidate(old);
    }
    let created: Vec<RoiId> = paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| arena.insert(Roi::Segment(SegmentRoi::new(path, branch, i))))
        .collect();
    arena.branch_mut(branch)?.children = created.clone();
    Ok(EditOutcome { created, removed })
}

/// Refresh the sibling index stored in every child of `branch`.
fn reindex(arena: &mut RoiArena, branch: RoiId) -> RoiResult<()> {
    let children = arena.branch(branch)?.children.clone();
    for (i, child) in children.into_iter().enumerate() {
        arena.segment_mut(child)?.index = i;
    }
    Ok(())
}

#[cfg(test)]
mod tests;
