//! Hierarchical container of named groups and typed n-d datasets.
//!
//! Mirrors the HDF5 object model closely enough that a file writer only has
//! to walk the tree. Paths use `/` separators like HDF5.
use crate::error::{RoiError, RoiResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, f64>,
    #[serde(default)]
    pub members: BTreeMap<String, Node>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

/// Row-major n-d array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub shape: Vec<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, f64>,
    pub data: DatasetData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum DatasetData {
    Bool(Vec<bool>),
    I64(Vec<i64>),
    F64(#[serde(with = "nan_as_null")] Vec<f64>),
}

impl DatasetData {
    pub fn len(&self) -> usize {
        match self {
            DatasetData::Bool(v) => v.len(),
            DatasetData::I64(v) => v.len(),
            DatasetData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// JSON has no NaN; non-finite samples round-trip through `null` as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
        let opt: Vec<Option<f64>> = values
            .iter()
            .map(|&v| v.is_finite().then_some(v))
            .collect();
        opt.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let opt: Vec<Option<f64>> = Vec::deserialize(d)?;
        Ok(opt.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&mut self, name: impl Into<String>, group: Group) {
        self.members.insert(name.into(), Node::Group(group));
    }

    pub fn insert_dataset(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.members.insert(name.into(), Node::Dataset(dataset));
    }

    /// Resolve a `/`-separated path below this group.
    pub fn lookup(&self, path: &str) -> Option<&Node> {
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let mut node = self.members.get(parts.next()?)?;
        for part in parts {
            match node {
                Node::Group(g) => node = g.members.get(part)?,
                Node::Dataset(_) => return None,
            }
        }
        Some(node)
    }

    pub fn group(&self, path: &str) -> RoiResult<&Group> {
        match self.lookup(path) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(RoiError::Format(format!("{path} is not a group"))),
            None => Err(RoiError::Format(format!("missing group {path}"))),
        }
    }

    pub fn dataset(&self, path: &str) -> RoiResult<&Dataset> {
        match self.lookup(path) {
            Some(Node::Dataset(d)) => Ok(d),
            Some(Node::Group(_)) => Err(RoiError::Format(format!("{path} is not a dataset"))),
            None => Err(RoiError::Format(format!("missing dataset {path}"))),
        }
    }

    /// Subgroups named `0`, `1`, ... in numeric order. Any other member name
    /// is a format error.
    pub fn indexed_groups(&self) -> RoiResult<Vec<&Group>> {
        let mut indexed = Vec::with_capacity(self.members.len());
        for (name, node) in &self.members {
            let idx: usize = name
                .parse()
                .map_err(|_| RoiError::Format(format!("unexpected member {name:?}")))?;
            match node {
                Node::Group(g) => indexed.push((idx, g)),
                Node::Dataset(_) => {
                    return Err(RoiError::Format(format!("member {name} is not a group")))
                }
            }
        }
        indexed.sort_by_key(|&(i, _)| i);
        Ok(indexed.into_iter().map(|(_, g)| g).collect())
    }
}

impl Dataset {
    fn new(shape: Vec<usize>, data: DatasetData) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self {
            shape,
            attrs: BTreeMap::new(),
            data,
        }
    }

    pub fn f64(shape: Vec<usize>, values: Vec<f64>) -> Self {
        Self::new(shape, DatasetData::F64(values))
    }

    pub fn i64(shape: Vec<usize>, values: Vec<i64>) -> Self {
        Self::new(shape, DatasetData::I64(values))
    }

    pub fn bool(shape: Vec<usize>, values: Vec<bool>) -> Self {
        Self::new(shape, DatasetData::Bool(values))
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Value count must match the shape; `cols`, when given, is the required
    /// trailing dimension.
    fn check(&self, what: &str, rank: usize, cols: Option<usize>) -> RoiResult<()> {
        let numel: usize = self.shape.iter().product();
        if numel != self.data.len() {
            return Err(RoiError::Format(format!(
                "{what}: shape {:?} does not match {} values",
                self.shape,
                self.data.len()
            )));
        }
        let rank_ok = self.shape.len() == rank;
        let cols_ok = cols.map_or(true, |c| self.shape.last() == Some(&c));
        if rank_ok && cols_ok {
            Ok(())
        } else {
            Err(RoiError::Format(format!(
                "{what}: unexpected shape {:?}",
                self.shape
            )))
        }
    }

    /// Values as `f64`, converting integers.
    pub fn to_f64(&self) -> RoiResult<Vec<f64>> {
        match &self.data {
            DatasetData::F64(v) => Ok(v.clone()),
            DatasetData::I64(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            DatasetData::Bool(_) => Err(RoiError::Format("expected a numeric dataset".into())),
        }
    }

    /// Rows of a `[n, cols]` numeric dataset.
    pub fn rows(&self, what: &str, cols: usize) -> RoiResult<Vec<Vec<f64>>> {
        self.check(what, 2, Some(cols))?;
        Ok(self
            .to_f64()?
            .chunks(cols)
            .map(<[f64]>::to_vec)
            .collect())
    }

    /// Any 2-d numeric dataset as `(rows, cols, values)`.
    pub fn matrix(&self, what: &str) -> RoiResult<(usize, usize, Vec<f64>)> {
        self.check(what, 2, None)?;
        Ok((self.shape[0], self.shape[1], self.to_f64()?))
    }

    /// Values of a `[h, w]` boolean dataset.
    pub fn bool_grid(&self, what: &str) -> RoiResult<(usize, usize, Vec<bool>)> {
        self.check(what, 2, None)?;
        match &self.data {
            DatasetData::Bool(v) => Ok((self.shape[0], self.shape[1], v.clone())),
            _ => Err(RoiError::Format(format!("{what}: expected a boolean dataset"))),
        }
    }

    /// Values of a 3-d numeric dataset with its shape.
    pub fn volume(&self, what: &str) -> RoiResult<([usize; 3], Vec<f64>)> {
        self.check(what, 3, None)?;
        Ok(([self.shape[0], self.shape[1], self.shape[2]], self.to_f64()?))
    }
}
