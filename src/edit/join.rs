use super::{reindex, EditOutcome, JoinDirection};
use crate::error::{RoiError, RoiResult};
use crate::roi::{Roi, RoiArena, RoiId, SegmentRoi};
use crate::trace::TraceCache;
use log::debug;

/// Merge `segment` with its neighbour in `direction`. The merged segment takes
/// the lower of the two indices; both originals are removed.
pub fn join_segments(
    arena: &mut RoiArena,
    cache: &mut TraceCache,
    segment: RoiId,
    direction: JoinDirection,
) -> RoiResult<EditOutcome> {
    let s = arena.segment(segment)?;
    let (parent, index) = (s.parent, s.index);
    let siblings = arena.branch(parent)?.children.len();
    let neighbour = match direction {
        JoinDirection::Next => (index + 1 < siblings).then_some(index + 1),
        JoinDirection::Previous => index.checked_sub(1),
    }
    .ok_or(RoiError::NoSuchNeighbor(segment, direction.label()))?;

    let lo = index.min(neighbour);
    let branch = arena.branch(parent)?;
    let (first, second) = (branch.children[lo], branch.children[lo + 1]);
    // Vertices of the branch itself survive the merge even when collinear.
    let path = arena
        .segment(first)?
        .path
        .concat(&arena.segment(second)?.path, branch.path.points());

    for old in [first, second] {
        arena.remove(old);
        cache.invalidate(old);
    }
    let joined = arena.insert(Roi::Segment(SegmentRoi::new(path, parent, lo)));
    let children = &mut arena.branch_mut(parent)?.children;
    children.remove(lo + 1);
    children[lo] = joined;
    reindex(arena, parent)?;
    debug!("join_segments {first:?} + {second:?} -> {joined:?}");
    Ok(EditOutcome {
        created: vec![joined],
        removed: vec![first, second],
    })
}
