use super::{reindex, replace_children, EditOutcome};
use crate::error::{RoiError, RoiResult};
use crate::roi::{Roi, RoiArena, RoiId, SegmentRoi};
use crate::trace::TraceCache;
use log::debug;

/// Relative slack when `total / length` is meant to be an integer.
const COUNT_EPS: f64 = 1e-9;

/// Upper bound on the number of segments one split may create.
pub const MAX_SEGMENTS: usize = 1 << 20;

/// `ceil(total / length)`, treating near-integral ratios as integral so that
/// float noise never produces a sliver segment. `None` when the count is not
/// finite or exceeds [`MAX_SEGMENTS`].
pub fn segment_count(total: f64, length: f64) -> Option<usize> {
    let q = total / length;
    let r = q.round();
    let k = if (q - r).abs() <= COUNT_EPS * q.max(1.0) {
        r
    } else {
        q.ceil()
    };
    if !k.is_finite() || k > MAX_SEGMENTS as f64 {
        return None;
    }
    Some((k as usize).max(1))
}

/// Resample `branch` into consecutive segments of path length `length`; the
/// last one takes the remainder. Pre-existing children are replaced.
pub fn split_branch(
    arena: &mut RoiArena,
    cache: &mut TraceCache,
    branch: RoiId,
    length: f64,
) -> RoiResult<EditOutcome> {
    if !(length.is_finite() && length > 0.0) {
        return Err(RoiError::InvalidArgument(format!(
            "split length must be positive, got {length}"
        )));
    }
    let b = arena.branch(branch)?;
    let total = b.path.length();
    if total <= 0.0 {
        return Err(RoiError::DegenerateGeometry(branch));
    }
    let k = segment_count(total, length).ok_or_else(|| {
        RoiError::InvalidArgument(format!(
            "split length {length} yields more than {MAX_SEGMENTS} segments"
        ))
    })?;
    let boundaries: Vec<f64> = (1..k).map(|i| i as f64 * length).collect();
    let paths = b.path.split_at(&boundaries);
    debug!("split_branch {branch:?} total={total:.3} length={length} segments={k}");
    replace_children(arena, cache, branch, paths)
}

/// Cut one segment into `parts` equal-length pieces in place. `parts == 1`
/// leaves the segment untouched.
pub fn split_segment(
    arena: &mut RoiArena,
    cache: &mut TraceCache,
    segment: RoiId,
    parts: usize,
) -> RoiResult<EditOutcome> {
    if parts < 1 {
        return Err(RoiError::InvalidArgument(
            "segment must be split into at least one part".into(),
        ));
    }
    let s = arena.segment(segment)?;
    let total = s.path.length();
    if total <= 0.0 {
        return Err(RoiError::DegenerateGeometry(segment));
    }
    if parts == 1 {
        return Ok(EditOutcome {
            created: vec![segment],
            removed: Vec::new(),
        });
    }
    let (parent, index) = (s.parent, s.index);
    let boundaries: Vec<f64> = (1..parts)
        .map(|i| total * i as f64 / parts as f64)
        .collect();
    let pieces = s.path.split_at(&boundaries);
    arena.branch(parent)?;

    arena.remove(segment);
    cache.invalidate(segment);
    let created: Vec<RoiId> = pieces
        .into_iter()
        .map(|path| arena.insert(Roi::Segment(SegmentRoi::new(path, parent, index))))
        .collect();
    let children = &mut arena.branch_mut(parent)?.children;
    children.remove(index);
    for (offset, &id) in created.iter().enumerate() {
        children.insert(index + offset, id);
    }
    reindex(arena, parent)?;
    debug!("split_segment {segment:?} parts={parts} -> {created:?}");
    Ok(EditOutcome {
        created,
        removed: vec![segment],
    })
}
