mod common;

use common::synthetic_stack::{dendrite_stack, polyline};
use dendrite_roi::persist::{
    decode, encode, load_container, save_container, Dataset, EncodeOptions, Group, Node,
};
use dendrite_roi::{RoiError, Session, SessionConfig};

fn populated_session() -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut s = Session::new(dendrite_stack(), None, &SessionConfig::default()).unwrap();
    s.set_threshold(5.0);
    let split = s
        .add_branch(polyline(&[(5.0, 20.0), (40.0, 20.0), (70.0, 22.0)], 2.0))
        .unwrap();
    s.add_branch(polyline(&[(10.0, 5.0), (60.0, 5.0)], 1.0))
        .unwrap();
    s.split_branch(split, 25.0).unwrap();
    s.add_polygon(vec![[2.0, 2.0], [12.0, 2.0], [12.0, 9.0], [2.0, 9.0]])
        .unwrap();
    s.add_pixel_roi([(3, 19), (4, 19), (4, 20)]).unwrap();
    s
}

fn member_names(group: &Group) -> Vec<&str> {
    group.members.keys().map(String::as_str).collect()
}

#[test]
fn encoded_layout_matches_file_format() {
    let mut s = populated_session();
    let root = encode(&mut s, EncodeOptions::default()).unwrap();

    assert_eq!(
        member_names(&root),
        ["branches", "circles", "mask", "pixels", "polygons"]
    );
    let mask = root.dataset("mask").unwrap();
    assert_eq!(mask.shape, vec![40, 80]);
    assert_eq!(mask.attrs.get("threshold"), Some(&5.0));
    assert!(root.group("circles").unwrap().members.is_empty());

    let split = root.group("branches/0").unwrap();
    assert_eq!(
        member_names(split),
        ["linescan", "outline", "roi", "segments", "trace"]
    );
    assert_eq!(split.dataset("roi").unwrap().shape, vec![3, 4]);
    assert_eq!(split.dataset("trace").unwrap().shape, vec![6]);
    let segments = split.group("segments").unwrap().indexed_groups().unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(split.dataset("linescan").unwrap().shape, vec![3, 6]);
    assert_eq!(
        member_names(segments[0]),
        ["outline", "roi", "trace"]
    );

    // Unsplit branches carry an empty segments group and no linescan.
    let plain = root.group("branches/1").unwrap();
    assert_eq!(member_names(plain), ["outline", "roi", "segments", "trace"]);
    assert!(plain.group("segments").unwrap().members.is_empty());

    assert_eq!(root.dataset("polygons/0/roi").unwrap().shape, vec![4, 2]);
    assert_eq!(root.dataset("pixels/0/roi").unwrap().shape, vec![2, 3]);
    assert!(root.lookup("data").is_none());
}

#[test]
fn container_round_trips_through_json() {
    let mut s = populated_session();
    let options = EncodeOptions {
        mask: true,
        data: true,
    };
    let root = encode(&mut s, options).unwrap();

    let path = std::env::temp_dir().join(format!("dendrite_roi_{}.json", std::process::id()));
    save_container(&path, &root).unwrap();
    let loaded = load_container(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded.dataset("mask").unwrap(), root.dataset("mask").unwrap());

    let mut restored = decode(&loaded, None, &SessionConfig::default()).unwrap();
    assert_eq!(restored.threshold(), 5.0);
    assert_eq!(restored.mask(), s.mask());
    assert_eq!(restored.branches().len(), 2);
    assert_eq!(restored.polygons().len(), 1);
    assert_eq!(restored.pixel_rois().len(), 1);

    let original_branch = *s.branches().get(0).unwrap();
    let branch = *restored.branches().get(0).unwrap();
    assert_eq!(restored.active_branch(), Some(branch));
    let want = s.branch(original_branch).unwrap().children().len();
    assert_eq!(restored.branch(branch).unwrap().children().len(), want);
    assert_eq!(
        &*restored.trace(branch).unwrap(),
        &*s.trace(original_branch).unwrap()
    );

    let pixel = *restored.pixel_rois().get(0).unwrap();
    let pixels: Vec<(i64, i64)> = restored
        .rois()
        .pixel_roi(pixel)
        .unwrap()
        .pixels()
        .iter()
        .copied()
        .collect();
    assert_eq!(pixels, vec![(3, 19), (4, 19), (4, 20)]);
}

#[test]
fn decode_needs_data_without_a_stack() {
    let mut s = populated_session();
    let root = encode(&mut s, EncodeOptions::default()).unwrap();
    assert!(matches!(
        decode(&root, None, &SessionConfig::default()),
        Err(RoiError::Format(_))
    ));
    let restored = decode(&root, Some(dendrite_stack()), &SessionConfig::default()).unwrap();
    assert_eq!(restored.branches().len(), 2);
}

#[test]
fn malformed_rois_are_rejected() {
    let mut root = Group::new();
    let mut pixel = Group::new();
    pixel.insert_dataset("roi", Dataset::i64(vec![3, 1], vec![1, 2, 3]));
    let mut pixels = Group::new();
    pixels.insert_group("0", pixel);
    root.insert_group("pixels", pixels);
    assert!(matches!(
        decode(&root, Some(dendrite_stack()), &SessionConfig::default()),
        Err(RoiError::Format(_))
    ));

    let mut branches = Group::new();
    branches.insert_group("first", Group::new());
    let mut root = Group::new();
    root.members.insert("branches".into(), Node::Group(branches));
    assert!(matches!(
        decode(&root, Some(dendrite_stack()), &SessionConfig::default()),
        Err(RoiError::Format(_))
    ));
}

#[test]
fn segments_must_partition_their_branch() {
    let mut s = populated_session();
    let mut root = encode(&mut s, EncodeOptions::default()).unwrap();
    let Some(Node::Group(branches)) = root.members.get_mut("branches") else {
        panic!("branches group missing");
    };
    let Some(Node::Group(split)) = branches.members.get_mut("0") else {
        panic!("branch 0 missing");
    };
    let Some(Node::Group(segments)) = split.members.get_mut("segments") else {
        panic!("segments group missing");
    };
    assert!(segments.members.remove("1").is_some());

    assert!(matches!(
        decode(&root, Some(dendrite_stack()), &SessionConfig::default()),
        Err(RoiError::Format(_))
    ));
}
