//! Fixture builders shared by the unit tests.

use std::fs;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use ndarray::Array2;

use crate::annotation::*;
use crate::types::*;

const MI_INT8: u32 = 1;
const MI_INT16: u32 = 3;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;
const MX_INT16_CLASS: u32 = 10;

/// Header text in the `.hea` layout for a valid recording.
pub fn header_text(name: &str, length: usize) -> String {
    let mut text = format!("{} {} {} {}\n", name, NUM_CHANNELS, SAMPLE_RATE, length);
    for channel in CHANNELS.iter() {
        text.push_str(&format!(
            "{}.mat 16+24 {} 16 0 6 -22 0 {}\n",
            name, channel.unit, channel.name
        ));
    }
    text
}

/// A 13 x L matrix whose values identify channel and sample.
pub fn ramp_signal(length: usize) -> Array2<i16> {
    Array2::from_shape_fn((NUM_CHANNELS, length), |(c, t)| (c * 100 + t) as i16 - 600)
}

fn element(out: &mut Vec<u8>, data_type: u32, payload: &[u8]) {
    out.write_u32::<LittleEndian>(data_type).unwrap();
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    while out.len() % 8 != 0 {
        out.push(0);
    }
}

fn matrix(name: &str, class: u32, rows: usize, cols: usize, data_type: u32, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut flags = Vec::new();
    flags.write_u32::<LittleEndian>(class).unwrap();
    flags.write_u32::<LittleEndian>(0).unwrap();
    element(&mut body, MI_UINT32, &flags);

    let mut dims = Vec::new();
    dims.write_i32::<LittleEndian>(rows as i32).unwrap();
    dims.write_i32::<LittleEndian>(cols as i32).unwrap();
    element(&mut body, MI_INT32, &dims);

    element(&mut body, MI_INT8, name.as_bytes());
    element(&mut body, data_type, data);

    let mut file = vec![b' '; 116];
    let text = b"MATLAB 5.0 MAT-file, written by psg_importer tests";
    file[..text.len()].copy_from_slice(text);
    file.extend_from_slice(&[0u8; 8]);
    file.write_u16::<LittleEndian>(0x0100).unwrap();
    file.extend_from_slice(b"IM");
    element(&mut file, MI_MATRIX, &body);
    file
}

/// MATLAB v5 bytes holding one int16 matrix.
pub fn mat_bytes(name: &str, signal: &Array2<i16>) -> Vec<u8> {
    let (rows, cols) = signal.dim();
    let mut data = Vec::with_capacity(rows * cols * 2);
    // column-major
    for value in signal.t().iter() {
        data.write_i16::<LittleEndian>(*value).unwrap();
    }
    matrix(name, MX_INT16_CLASS, rows, cols, MI_INT16, &data)
}

/// MATLAB v5 bytes holding one float64 matrix, values already column-major.
pub fn mat_bytes_f64(name: &str, rows: usize, cols: usize, values: &[f64]) -> Vec<u8> {
    let mut data = Vec::with_capacity(values.len() * 8);
    for value in values {
        data.write_f64::<LittleEndian>(*value).unwrap();
    }
    matrix(name, MX_DOUBLE_CLASS, rows, cols, MI_DOUBLE, &data)
}

/// Writes `{name}.mat`, `{name}.hea` and the `{name}.arousal` marker.
pub fn write_recording(dir: &Path, name: &str, signal: &Array2<i16>) {
    fs::write(dir.join(format!("{}.mat", name)), mat_bytes("val", signal)).unwrap();
    fs::write(dir.join(format!("{}.hea", name)), header_text(name, signal.ncols())).unwrap();
    fs::write(dir.join(format!("{}.arousal", name)), b"").unwrap();
}

/// One indicator row per stage, one-hot at the given labels.
pub fn stage_rows(labels: &[u8]) -> Vec<Vec<u8>> {
    let mut rows = vec![vec![0u8; labels.len()]; STAGE_NAMES.len()];
    for (index, &label) in labels.iter().enumerate() {
        rows[label as usize][index] = 1;
    }
    rows
}

pub fn stages_group(rows: &[Vec<u8>]) -> Group {
    STAGE_NAMES.iter().zip(rows).fold(Group::new(), |group, (name, row)| {
        group.with(
            name,
            Node::Dataset(Dataset::new(vec![1, row.len()], Values::UInt8(row.clone()))),
        )
    })
}

/// A well-formed annotation container tree.
pub fn annotation_tree(arousal: &[f64], rows: &[Vec<u8>]) -> Group {
    let refs = Group::new().with(
        REFS_ENTRY,
        Node::Dataset(Dataset::new(vec![2], Values::UInt64(vec![0, 0]))),
    );
    let data = Group::new()
        .with(
            AROUSAL_DATASET,
            Node::Dataset(Dataset::new(vec![arousal.len(), 1], Values::Float64(arousal.to_vec()))),
        )
        .with(STAGES_GROUP, Node::Group(stages_group(rows)));

    Group::new()
        .with(REFS_GROUP, Node::Group(refs))
        .with(DATA_GROUP, Node::Group(data))
}
