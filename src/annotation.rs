//! Loader for the `{name}-arousal.mat` annotation container.
//!
//! The container is a MATLAB v7.3 file, i.e. HDF5. It is read into a small
//! in-memory tree first ([`Group`] / [`Node`] / [`Dataset`]) and the schema
//! checks run over that tree, so decoding does not depend on the backend.
//!
//! Expected layout:
//!
//! ```text
//! /#refs#/a                  shape (2,), both zero
//! /data/arousals             shape (L, 1), float64, values in {-1, 0, 1}
//! /data/sleep_stages/<name>  shape (1, L), uint8, one-hot across the 6 stages
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use ndarray::Array1;

use crate::types::*;

pub const REFS_GROUP: &str = "#refs#";
pub const REFS_ENTRY: &str = "a";
pub const DATA_GROUP: &str = "data";
pub const AROUSAL_DATASET: &str = "arousals";
pub const STAGES_GROUP: &str = "sleep_stages";

/// A group of named members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub members: BTreeMap<String, Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

/// A dataset with its shape and row-major values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub shape: Vec<usize>,
    pub values: Values,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Float64(Vec<f64>),
    UInt8(Vec<u8>),
    UInt64(Vec<u64>),
    /// Any other element type, kept only by name for error reporting
    Other(String),
}

impl Values {
    fn dtype_name(&self) -> &str {
        match self {
            Values::Float64(_) => "float64",
            Values::UInt8(_) => "uint8",
            Values::UInt64(_) => "uint64",
            Values::Other(name) => name,
        }
    }

    fn len(&self) -> usize {
        match self {
            Values::Float64(v) => v.len(),
            Values::UInt8(v) => v.len(),
            Values::UInt64(v) => v.len(),
            Values::Other(_) => 0,
        }
    }

    fn all_zero(&self) -> bool {
        match self {
            Values::Float64(v) => v.iter().all(|&x| x == 0.0),
            Values::UInt8(v) => v.iter().all(|&x| x == 0),
            Values::UInt64(v) => v.iter().all(|&x| x == 0),
            Values::Other(_) => false,
        }
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member, builder style.
    pub fn with(mut self, name: &str, node: Node) -> Self {
        self.members.insert(name.to_string(), node);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn group(&self, name: &str) -> Result<&Group> {
        match self.members.get(name) {
            Some(Node::Group(group)) => Ok(group),
            Some(Node::Dataset(_)) => Err(schema(format!("'{}' is a dataset, expected a group", name))),
            None => Err(schema(format!("missing group '{}'", name))),
        }
    }

    fn dataset(&self, name: &str) -> Result<&Dataset> {
        match self.members.get(name) {
            Some(Node::Dataset(dataset)) => Ok(dataset),
            Some(Node::Group(_)) => Err(schema(format!("'{}' is a group, expected a dataset", name))),
            None => Err(schema(format!("missing dataset '{}'", name))),
        }
    }
}

impl Dataset {
    pub fn new(shape: Vec<usize>, values: Values) -> Self {
        Self { shape, values }
    }

    fn expect_shape(&self, name: &str, shape: &[usize]) -> Result<()> {
        if self.shape != shape {
            return Err(schema(format!(
                "'{}' has shape {:?}, expected {:?}",
                name, self.shape, shape
            )));
        }
        if self.values.len() != shape.iter().product::<usize>() {
            return Err(schema(format!(
                "'{}' holds {} values for shape {:?}",
                name,
                self.values.len(),
                shape
            )));
        }
        Ok(())
    }
}

/// Decoded per-sample labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotations {
    /// Arousal label per sample: -1 unscored, 0 absent, 1 present
    pub arousal: Array1<i8>,
    /// Index into [`STAGE_NAMES`] per sample
    pub stages: Array1<u8>,
}

/// Loads the annotations of a recording, or `None` when the container is
/// absent (unlabeled recordings).
pub fn load_annotations<P: AsRef<Path>>(path: Option<P>, length: usize) -> Result<Option<Annotations>> {
    match path {
        Some(path) => {
            let root = read_container(path.as_ref())?;
            decode(&root, length).map(Some)
        }
        None => Ok(None),
    }
}

/// Validates a container tree and collapses it into per-sample labels.
pub fn decode(root: &Group, length: usize) -> Result<Annotations> {
    if root.len() != 2 {
        return Err(schema(format!(
            "annotation container has {} top-level entries, expected 2",
            root.len()
        )));
    }

    check_refs(root.group(REFS_GROUP)?)?;

    let data = root.group(DATA_GROUP)?;
    if data.len() != 2 {
        return Err(schema(format!(
            "'{}' group has {} entries, expected 2",
            DATA_GROUP,
            data.len()
        )));
    }

    let arousal = decode_arousal(data.dataset(AROUSAL_DATASET)?, length)?;
    let stages = decode_stages(data.group(STAGES_GROUP)?, length)?;

    debug!("Decoded {} annotated samples", length);

    Ok(Annotations { arousal, stages })
}

fn check_refs(refs: &Group) -> Result<()> {
    if refs.len() != 1 {
        return Err(schema(format!(
            "'{}' group has {} entries, expected 1",
            REFS_GROUP,
            refs.len()
        )));
    }
    let entry = refs.dataset(REFS_ENTRY)?;
    entry.expect_shape(REFS_ENTRY, &[2])?;
    if !entry.values.all_zero() {
        return Err(schema(format!("'{}/{}' is not all zero", REFS_GROUP, REFS_ENTRY)));
    }
    Ok(())
}

fn decode_arousal(dataset: &Dataset, length: usize) -> Result<Array1<i8>> {
    dataset.expect_shape(AROUSAL_DATASET, &[length, 1])?;
    let values = match &dataset.values {
        Values::Float64(values) => values,
        other => {
            return Err(schema(format!(
                "'{}' dtype is {}, expected float64",
                AROUSAL_DATASET,
                other.dtype_name()
            )));
        }
    };

    let mut arousal = Array1::<i8>::zeros(length);
    for (index, (&value, label)) in values.iter().zip(arousal.iter_mut()).enumerate() {
        let narrowed = value as i8;
        if f64::from(narrowed) != value || !(-1..=1).contains(&narrowed) {
            return Err(schema(format!(
                "arousal value {} at sample {} is not one of -1, 0, 1",
                value, index
            )));
        }
        *label = narrowed;
    }

    Ok(arousal)
}

fn decode_stages(stages: &Group, length: usize) -> Result<Array1<u8>> {
    if stages.len() != STAGE_NAMES.len() {
        return Err(schema(format!(
            "'{}' group has {} entries, expected {}",
            STAGES_GROUP,
            stages.len(),
            STAGE_NAMES.len()
        )));
    }

    let mut checksum = vec![0u32; length];
    let mut labels = Array1::<u8>::zeros(length);

    for (stage, &name) in STAGE_NAMES.iter().enumerate() {
        let dataset = stages.dataset(name)?;
        dataset.expect_shape(name, &[1, length])?;
        let indicator = match &dataset.values {
            Values::UInt8(values) => values,
            other => {
                return Err(schema(format!(
                    "stage '{}' dtype is {}, expected uint8",
                    name,
                    other.dtype_name()
                )));
            }
        };

        for (index, &flag) in indicator.iter().enumerate() {
            match flag {
                0 => {}
                1 => {
                    checksum[index] += 1;
                    labels[index] = stage as u8;
                }
                _ => {
                    return Err(schema(format!(
                        "stage '{}' has value {} at sample {}, expected 0 or 1",
                        name, flag, index
                    )));
                }
            }
        }
    }

    if let Some((index, &sum)) = checksum.iter().enumerate().find(|(_, &sum)| sum != 1) {
        return Err(schema(format!(
            "sample {} is marked with {} stages, expected exactly 1",
            index, sum
        )));
    }

    Ok(labels)
}

/// Reads an annotation container into memory.
#[cfg(feature = "hdf5")]
pub fn read_container(path: &Path) -> Result<Group> {
    h5::read_file(path)
}

/// Reads an annotation container into memory.
///
/// Built without the `hdf5` feature, so every container is rejected.
#[cfg(not(feature = "hdf5"))]
pub fn read_container(path: &Path) -> Result<Group> {
    Err(PsgError::UnsupportedContainer(format!(
        "{} needs the `hdf5` feature",
        path.display()
    )))
}

#[cfg(feature = "hdf5")]
mod h5 {
    use super::{Dataset, Group, Node, Values};
    use crate::types::{PsgError, Result};
    use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
    use std::path::Path;

    fn h5_err(e: hdf5::Error) -> PsgError {
        PsgError::Hdf5(e.to_string())
    }

    pub fn read_file(path: &Path) -> Result<Group> {
        let file = hdf5::File::open(path).map_err(h5_err)?;
        read_group(&file)
    }

    fn read_group(group: &hdf5::Group) -> Result<Group> {
        let mut out = Group::new();
        for name in group.member_names().map_err(h5_err)? {
            let node = match group.group(&name) {
                Ok(child) => Node::Group(read_group(&child)?),
                Err(group_err) => match group.dataset(&name) {
                    Ok(dataset) => Node::Dataset(read_dataset(&dataset)?),
                    Err(dataset_err) => {
                        return Err(PsgError::Hdf5(format!(
                            "'{}' is neither a group nor a dataset (as group: {}; as dataset: {})",
                            name, group_err, dataset_err
                        )));
                    }
                },
            };
            out.members.insert(name, node);
        }
        Ok(out)
    }

    fn read_dataset(dataset: &hdf5::Dataset) -> Result<Dataset> {
        let shape = dataset.shape();
        let descriptor = dataset
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(h5_err)?;

        let values = match descriptor {
            TypeDescriptor::Float(FloatSize::U8) => Values::Float64(dataset.read_raw::<f64>().map_err(h5_err)?),
            TypeDescriptor::Unsigned(IntSize::U1) => Values::UInt8(dataset.read_raw::<u8>().map_err(h5_err)?),
            TypeDescriptor::Unsigned(IntSize::U8) => Values::UInt64(dataset.read_raw::<u64>().map_err(h5_err)?),
            other => Values::Other(format!("{:?}", other)),
        };

        Ok(Dataset::new(shape, values))
    }
}
