//! SWC skeleton input.
//!
//! Each non-comment line reads `id type x y z radius parent`, with
//! `parent = -1` for roots. The tree is cut into simple paths: a new branch
//! starts at every root and at every child of a node that does not have
//! exactly one child. Non-root branches begin with their parent node so that
//! consecutive branches share the branch point.
use crate::error::{RoiError, RoiResult};
use crate::roi::ControlPoint;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub branches: Vec<Vec<ControlPoint>>,
}

struct Node {
    point: ControlPoint,
    parent: Option<i64>,
}

pub fn parse_swc(text: &str) -> RoiResult<Skeleton> {
    let mut order = Vec::new();
    let mut nodes: HashMap<i64, Node> = HashMap::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |message: String| RoiError::Parse {
            line: lineno + 1,
            message,
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(err(format!("expected 7 fields, got {}", fields.len())));
        }
        let id: i64 = fields[0]
            .parse()
            .map_err(|e| err(format!("bad id {:?}: {e}", fields[0])))?;
        let mut nums = [0.0f64; 4];
        for (slot, field) in nums.iter_mut().zip(&fields[2..6]) {
            *slot = field
                .parse()
                .map_err(|e| err(format!("bad number {field:?}: {e}")))?;
        }
        let parent: i64 = fields[6]
            .parse()
            .map_err(|e| err(format!("bad parent {:?}: {e}", fields[6])))?;
        if nodes.contains_key(&id) {
            return Err(err(format!("duplicate node id {id}")));
        }
        order.push(id);
        nodes.insert(
            id,
            Node {
                point: ControlPoint::from_array(nums),
                parent: (parent >= 0).then_some(parent),
            },
        );
    }

    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for &id in &order {
        if let Some(parent) = nodes[&id].parent {
            if !nodes.contains_key(&parent) {
                return Err(RoiError::Parse {
                    line: 0,
                    message: format!("node {id} references missing parent {parent}"),
                });
            }
            children.entry(parent).or_default().push(id);
        }
    }
    let child_count = |id: i64| children.get(&id).map_or(0, Vec::len);

    let mut branches = Vec::new();
    for &id in &order {
        let starts_branch = match nodes[&id].parent {
            None => true,
            Some(parent) => child_count(parent) != 1,
        };
        if !starts_branch {
            continue;
        }
        let mut points = Vec::new();
        if let Some(parent) = nodes[&id].parent {
            points.push(nodes[&parent].point);
        }
        let mut cur = id;
        loop {
            points.push(nodes[&cur].point);
            match children.get(&cur).map(Vec::as_slice) {
                Some([only]) => cur = *only,
                _ => break,
            }
        }
        branches.push(points);
    }
    Ok(Skeleton { branches })
}
