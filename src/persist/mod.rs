//! Saving and restoring a session as a hierarchical container.
//!
//! Layout of the root group:
//! - `mask`: `[h, w]` bool dataset with a `threshold` attribute (optional)
//! - `data`: `[h, w, frames]` raw stack (optional)
//! - `branches/<i>`: `roi` `[n, 4]` control points `(x, y, z, radius)`,
//!   `outline` `[m, 2]`, `trace`, `linescan` `[segments, frames]` when
//!   split, and `segments/<j>` holding `roi`, `outline`, `trace`
//! - `circles/<i>`: always empty, kept for layout compatibility
//! - `polygons/<i>`: `roi` `[n, 2]` outline and `trace`
//! - `pixels/<i>`: `roi` `[2, n]` (row 0 = x, row 1 = y) and `trace`
//!
//! Stored traces are informational; decoding recomputes them on demand.

mod container;

pub use container::{Dataset, DatasetData, Group, Node};

use crate::config::SessionConfig;
use crate::error::{RoiError, RoiResult};
use crate::image::io::{read_json_file, write_json_file};
use crate::image::Stack;
use crate::mask::Mask;
use crate::roi::{ControlPoint, Path as RoiPath, RoiId};
use crate::session::Session;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub mask: bool,
    pub data: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            mask: true,
            data: false,
        }
    }
}

fn trace_dataset(trace: &[f64]) -> Dataset {
    Dataset::f64(vec![trace.len()], trace.to_vec())
}

/// `roi` and `outline` datasets of a branch or segment path.
fn path_group(path: &RoiPath) -> Group {
    let points: Vec<f64> = path.points().iter().flat_map(|p| p.to_array()).collect();
    let outline = path.outline();
    let mut g = Group::new();
    g.insert_dataset("roi", Dataset::f64(vec![path.point_count(), 4], points));
    g.insert_dataset(
        "outline",
        Dataset::f64(vec![outline.len(), 2], outline.concat()),
    );
    g
}

fn branch_group(session: &mut Session, id: RoiId) -> RoiResult<Group> {
    let branch = session.branch(id)?;
    let mut g = path_group(&branch.path);
    let children = branch.children().to_vec();
    g.insert_dataset("trace", trace_dataset(&session.trace(id)?));

    if !children.is_empty() {
        let rows = session.linescan(id)?;
        let values: Vec<f64> = rows.iter().flat_map(|t| t.iter().copied()).collect();
        g.insert_dataset(
            "linescan",
            Dataset::f64(vec![rows.len(), session.frames()], values),
        );
    }

    let mut segments = Group::new();
    for (j, child) in children.into_iter().enumerate() {
        let mut s = path_group(&session.rois().segment(child)?.path);
        s.insert_dataset("trace", trace_dataset(&session.trace(child)?));
        segments.insert_group(j.to_string(), s);
    }
    g.insert_group("segments", segments);
    Ok(g)
}

/// Snapshot `session` into a container. Traces go through the session cache.
pub fn encode(session: &mut Session, options: EncodeOptions) -> RoiResult<Group> {
    let mut root = Group::new();
    if options.mask {
        let mask = session.mask();
        root.insert_dataset(
            "mask",
            Dataset::bool(vec![mask.h, mask.w], mask.data.clone())
                .with_attr("threshold", mask.threshold),
        );
    }
    if options.data {
        let stack = session.stack();
        let values = stack.data.iter().map(|&v| v as f64).collect();
        root.insert_dataset("data", Dataset::f64(stack.shape().to_vec(), values));
    }

    let mut pixels = Group::new();
    let ids: Vec<RoiId> = session.pixel_rois().iter().copied().collect();
    for (i, id) in ids.into_iter().enumerate() {
        let (xs, ys): (Vec<i64>, Vec<i64>) =
            session.rois().pixel_roi(id)?.pixels().iter().copied().unzip();
        let n = xs.len();
        let mut g = Group::new();
        g.insert_dataset("roi", Dataset::i64(vec![2, n], [xs, ys].concat()));
        g.insert_dataset("trace", trace_dataset(&session.trace(id)?));
        pixels.insert_group(i.to_string(), g);
    }
    root.insert_group("pixels", pixels);

    let mut polygons = Group::new();
    let ids: Vec<RoiId> = session.polygons().iter().copied().collect();
    for (i, id) in ids.into_iter().enumerate() {
        let outline = session.rois().polygon(id)?.outline().concat();
        let mut g = Group::new();
        g.insert_dataset("roi", Dataset::f64(vec![outline.len() / 2, 2], outline));
        g.insert_dataset("trace", trace_dataset(&session.trace(id)?));
        polygons.insert_group(i.to_string(), g);
    }
    root.insert_group("polygons", polygons);

    root.insert_group("circles", Group::new());

    let mut branches = Group::new();
    let ids: Vec<RoiId> = session.branches().iter().copied().collect();
    for (i, id) in ids.into_iter().enumerate() {
        branches.insert_group(i.to_string(), branch_group(session, id)?);
    }
    root.insert_group("branches", branches);

    debug!(
        "persist::encode branches={} polygons={} pixels={}",
        session.branches().len(),
        session.polygons().len(),
        session.pixel_rois().len()
    );
    Ok(root)
}

fn control_points(roi: &Dataset) -> RoiResult<Vec<ControlPoint>> {
    Ok(roi
        .rows("roi", 4)?
        .into_iter()
        .map(|r| ControlPoint::from_array([r[0], r[1], r[2], r[3]]))
        .collect())
}

/// Numbered subgroups of `name`; an absent group has none.
fn members<'a>(root: &'a Group, name: &str) -> RoiResult<Vec<&'a Group>> {
    match root.lookup(name) {
        None => Ok(Vec::new()),
        Some(Node::Group(g)) => g.indexed_groups(),
        Some(Node::Dataset(_)) => Err(RoiError::Format(format!("{name} is not a group"))),
    }
}

/// Rebuild a session from a container. Without `stack`, the stored `data`
/// dataset is used. A stored mask is installed as-is together with its
/// threshold; otherwise the configured percentile applies. The first branch
/// is selected.
pub fn decode(root: &Group, stack: Option<Stack>, config: &SessionConfig) -> RoiResult<Session> {
    let stack = match stack {
        Some(s) => s,
        None => {
            let ([h, w, frames], values) = root.dataset("data")?.volume("data")?;
            Stack::from_vec(h, w, frames, values.into_iter().map(|v| v as f32).collect())?
        }
    };
    let mut session = Session::new(stack, None, config)?;
    let batch = session.batch();

    if let Some(Node::Dataset(d)) = root.lookup("mask") {
        let (h, w, data) = d.bool_grid("mask")?;
        let threshold = d
            .attrs
            .get("threshold")
            .copied()
            .ok_or_else(|| RoiError::Format("mask has no threshold attribute".into()))?;
        session.restore_mask(Mask {
            w,
            h,
            threshold,
            data,
        })?;
    }

    for g in members(root, "branches")? {
        let id = session.add_branch(control_points(g.dataset("roi")?)?)?;
        let paths = members(g, "segments")?
            .into_iter()
            .map(|s| Ok(RoiPath::new(control_points(s.dataset("roi")?)?)))
            .collect::<RoiResult<Vec<_>>>()?;
        if !paths.is_empty() {
            session.restore_segments(id, paths)?;
        }
    }

    for g in members(root, "polygons")? {
        let outline = g
            .dataset("roi")?
            .rows("polygon roi", 2)?
            .into_iter()
            .map(|r| [r[0], r[1]])
            .collect();
        session.add_polygon(outline)?;
    }

    for g in members(root, "pixels")? {
        let (rows, n, values) = g.dataset("roi")?.matrix("pixel roi")?;
        if rows != 2 {
            return Err(RoiError::Format(format!(
                "pixel roi must have 2 rows, got {rows}"
            )));
        }
        let coords = (0..n).map(|k| (values[k] as i64, values[n + k] as i64));
        session.add_pixel_roi(coords)?;
    }

    let circles = members(root, "circles")?.len();
    if circles > 0 {
        warn!("persist::decode ignoring {circles} circle rois");
    }

    let first = session.branches().cur().copied();
    session.set_active(first)?;
    drop(batch);
    Ok(session)
}

pub fn save_container(path: &Path, root: &Group) -> Result<(), String> {
    write_json_file(path, root)
}

pub fn load_container(path: &Path) -> Result<Group, String> {
    read_json_file(path)
}
