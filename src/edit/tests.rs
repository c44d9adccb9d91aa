use super::*;
use crate::error::RoiError;
use crate::roi::{BranchRoi, ControlPoint};

/// Four control points, path length 100 (40 + 30 + 30).
fn scenario() -> (RoiArena, TraceCache, RoiId) {
    let mut arena = RoiArena::new();
    let pts = vec![
        ControlPoint::new(0.0, 0.0, 0.0, 1.0),
        ControlPoint::new(40.0, 0.0, 0.0, 1.0),
        ControlPoint::new(40.0, 30.0, 0.0, 1.0),
        ControlPoint::new(70.0, 30.0, 0.0, 1.0),
    ];
    let branch = arena.insert(Roi::Branch(BranchRoi::new(pts)));
    (arena, TraceCache::new(), branch)
}

fn child_lengths(arena: &RoiArena, branch: RoiId) -> Vec<f64> {
    arena
        .branch(branch)
        .unwrap()
        .children()
        .iter()
        .map(|&c| arena.segment(c).unwrap().path.length())
        .collect()
}

fn assert_lengths(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "{got:?} vs {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-6, "{got:?} vs {want:?}");
    }
}

fn assert_indices(arena: &RoiArena, branch: RoiId) {
    for (i, &c) in arena.branch(branch).unwrap().children().iter().enumerate() {
        let seg = arena.segment(c).unwrap();
        assert_eq!(seg.index(), i);
        assert_eq!(seg.parent(), branch);
    }
}

#[test]
fn split_then_join_scenario() {
    let (mut arena, mut cache, branch) = scenario();
    let out = split_branch(&mut arena, &mut cache, branch, 30.0).unwrap();
    assert_eq!(out.created.len(), 4);
    assert_lengths(&child_lengths(&arena, branch), &[30.0, 30.0, 30.0, 10.0]);

    join_segments(&mut arena, &mut cache, out.created[0], JoinDirection::Next).unwrap();
    assert_lengths(&child_lengths(&arena, branch), &[60.0, 30.0, 10.0]);
    assert_indices(&arena, branch);
}

#[test]
fn split_coverage_sums_to_branch_length() {
    for length in [7.0, 12.5, 33.3, 100.0, 250.0] {
        let (mut arena, mut cache, branch) = scenario();
        split_branch(&mut arena, &mut cache, branch, length).unwrap();
        let lengths = child_lengths(&arena, branch);
        assert_eq!(lengths.len(), (100.0f64 / length).ceil() as usize);
        assert!((lengths.iter().sum::<f64>() - 100.0).abs() < 1e-6);
        let last = *lengths.last().unwrap();
        assert!(last > 0.0 && last <= length + 1e-9);
    }
}

#[test]
fn exact_multiple_produces_no_sliver() {
    let (mut arena, mut cache, branch) = scenario();
    split_branch(&mut arena, &mut cache, branch, 10.0).unwrap();
    assert_eq!(child_lengths(&arena, branch).len(), 10);
    assert_eq!(segment_count(0.3, 0.1), Some(3));
}

#[test]
fn resplitting_replaces_children_and_their_cache() {
    let (mut arena, mut cache, branch) = scenario();
    let first = split_branch(&mut arena, &mut cache, branch, 50.0).unwrap();
    cache.get_or_compute(first.created[0], true, || vec![1.0]);
    let second = split_branch(&mut arena, &mut cache, branch, 25.0).unwrap();
    assert_eq!(second.removed, first.created);
    assert!(!arena.contains(first.created[0]));
    assert!(cache.is_empty());
    assert_eq!(arena.branch(branch).unwrap().children(), &second.created[..]);
}

#[test]
fn split_rejects_non_positive_length() {
    let (mut arena, mut cache, branch) = scenario();
    for bad in [0.0, -3.0, f64::NAN] {
        assert!(matches!(
            split_branch(&mut arena, &mut cache, branch, bad),
            Err(RoiError::InvalidArgument(_))
        ));
    }
    assert!(arena.branch(branch).unwrap().children().is_empty());
}

#[test]
fn tiny_split_length_is_rejected() {
    let (mut arena, mut cache, branch) = scenario();
    assert_eq!(segment_count(100.0, 1e-300), None);
    assert_eq!(segment_count(100.0, 100.0 / MAX_SEGMENTS as f64), Some(MAX_SEGMENTS));
    for tiny in [1e-300, f64::MIN_POSITIVE, 1e-9] {
        assert!(matches!(
            split_branch(&mut arena, &mut cache, branch, tiny),
            Err(RoiError::InvalidArgument(_))
        ));
    }
    assert!(arena.branch(branch).unwrap().children().is_empty());
}

#[test]
fn collinear_vertex_survives_split_and_join() {
    let mut arena = RoiArena::new();
    let mut cache = TraceCache::new();
    let pts = vec![
        ControlPoint::new(0.0, 0.0, 0.0, 1.0),
        ControlPoint::new(10.0, 0.0, 0.0, 1.0),
        ControlPoint::new(20.0, 0.0, 0.0, 1.0),
        ControlPoint::new(20.0, 30.0, 0.0, 1.0),
    ];
    let branch = arena.insert(Roi::Branch(BranchRoi::new(pts)));
    let out = split_branch(&mut arena, &mut cache, branch, 20.0).unwrap();
    let original = arena.segment(out.created[0]).unwrap().path.clone();
    assert_eq!(original.point_count(), 3);

    let halves = split_segment(&mut arena, &mut cache, out.created[0], 2).unwrap();
    let joined =
        join_segments(&mut arena, &mut cache, halves.created[0], JoinDirection::Next).unwrap();
    let path = &arena.segment(joined.created[0]).unwrap().path;
    assert!(path.approx_eq(&original, 1e-9), "{path:?} vs {original:?}");
}

#[test]
fn split_segment_replaces_in_place() {
    let (mut arena, mut cache, branch) = scenario();
    let out = split_branch(&mut arena, &mut cache, branch, 30.0).unwrap();
    let tail = out.created[3];
    let parts = split_segment(&mut arena, &mut cache, out.created[1], 3).unwrap();
    assert_eq!(parts.created.len(), 3);
    assert_lengths(
        &child_lengths(&arena, branch),
        &[30.0, 10.0, 10.0, 10.0, 30.0, 10.0],
    );
    assert_eq!(arena.segment(tail).unwrap().index(), 5);
    assert_indices(&arena, branch);
}

#[test]
fn split_segment_validates_before_mutating() {
    let (mut arena, mut cache, branch) = scenario();
    let out = split_branch(&mut arena, &mut cache, branch, 50.0).unwrap();
    assert!(matches!(
        split_segment(&mut arena, &mut cache, out.created[0], 0),
        Err(RoiError::InvalidArgument(_))
    ));
    assert_eq!(arena.branch(branch).unwrap().children(), &out.created[..]);

    let single = split_segment(&mut arena, &mut cache, out.created[0], 1).unwrap();
    assert_eq!(single.created, vec![out.created[0]]);
    assert!(single.removed.is_empty());
}

#[test]
fn zero_length_geometry_is_degenerate() {
    let mut arena = RoiArena::new();
    let mut cache = TraceCache::new();
    let p = ControlPoint::new(5.0, 5.0, 0.0, 1.0);
    let branch = arena.insert(Roi::Branch(BranchRoi::new(vec![p, p])));
    assert_eq!(
        split_branch(&mut arena, &mut cache, branch, 1.0).unwrap_err(),
        RoiError::DegenerateGeometry(branch)
    );
    let paths = vec![crate::roi::Path::new(vec![p, p])];
    let seg = replace_children(&mut arena, &mut cache, branch, paths)
        .unwrap()
        .created[0];
    assert_eq!(
        split_segment(&mut arena, &mut cache, seg, 2).unwrap_err(),
        RoiError::DegenerateGeometry(seg)
    );
}

#[test]
fn split_join_round_trip_restores_path() {
    let (mut arena, mut cache, branch) = scenario();
    let out = split_branch(&mut arena, &mut cache, branch, 45.0).unwrap();
    let original = arena.segment(out.created[0]).unwrap().path.clone();
    let halves = split_segment(&mut arena, &mut cache, out.created[0], 2).unwrap();
    let joined =
        join_segments(&mut arena, &mut cache, halves.created[0], JoinDirection::Next).unwrap();
    let path = &arena.segment(joined.created[0]).unwrap().path;
    assert!(path.approx_eq(&original, 1e-6), "{path:?} vs {original:?}");
}

#[test]
fn join_at_boundaries_fails_atomically() {
    let (mut arena, mut cache, branch) = scenario();
    let out = split_branch(&mut arena, &mut cache, branch, 30.0).unwrap();
    assert_eq!(
        join_segments(&mut arena, &mut cache, out.created[0], JoinDirection::Previous)
            .unwrap_err(),
        RoiError::NoSuchNeighbor(out.created[0], "previous")
    );
    assert_eq!(
        join_segments(&mut arena, &mut cache, out.created[3], JoinDirection::Next).unwrap_err(),
        RoiError::NoSuchNeighbor(out.created[3], "next")
    );
    assert_eq!(arena.branch(branch).unwrap().children(), &out.created[..]);
}

#[test]
fn join_previous_inserts_at_lower_index() {
    let (mut arena, mut cache, branch) = scenario();
    let out = split_branch(&mut arena, &mut cache, branch, 30.0).unwrap();
    cache.get_or_compute(out.created[2], true, || vec![0.0]);
    let joined =
        join_segments(&mut arena, &mut cache, out.created[3], JoinDirection::Previous).unwrap();
    assert_eq!(joined.removed, vec![out.created[2], out.created[3]]);
    assert!(!cache.contains(out.created[2]));
    assert_eq!(arena.segment(joined.created[0]).unwrap().index(), 2);
    assert_lengths(&child_lengths(&arena, branch), &[30.0, 30.0, 40.0]);
}
