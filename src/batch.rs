//! Unpacking of stacked batches into model inputs.
//!
//! A stack is N exported samples of equal length with a trailing singleton
//! axis, shape (N, 15, L, 1), as produced by the batching pipeline.

use log::debug;
use ndarray::{s, Array2, Array3, Array4, ArrayView4, Axis};

use crate::sample::Sample;
use crate::types::*;

/// Model-ready arrays split out of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedBatch {
    /// Signal leads as floats, shape (N, 13, L)
    pub signal: Array3<f32>,
    /// Arousal target in {0, 1}, shape (N, L)
    pub label: Array2<i32>,
    /// 0 where the arousal was unscored, 1 elsewhere, shape (N, L)
    pub mask: Array2<f32>,
    /// Stage index in 0..=5, shape (N, L)
    pub stage: Array2<i32>,
}

/// Splits a (N, 15, L, 1) stack into signal, label, mask and stage.
///
/// Unscored positions (-1) get mask 0 and label 0.
pub fn unpack(stack: ArrayView4<i16>) -> Result<UnpackedBatch> {
    let (n, rows, length, depth) = stack.dim();
    if rows != BATCH_ROWS || depth != 1 {
        return Err(PsgError::ContractViolation(format!(
            "stack shape is {:?}, expected [N, {}, L, 1]",
            stack.shape(),
            BATCH_ROWS
        )));
    }

    let planes = stack.index_axis(Axis(3), 0);
    let arousal = planes.index_axis(Axis(1), 0);

    let mask = arousal.mapv(|v| if v == i16::from(AROUSAL_UNSCORED) { 0.0 } else { 1.0 });
    let label = arousal.mapv(|v| i32::from(v).clamp(0, 1));
    let stage = planes.index_axis(Axis(1), 1).mapv(i32::from);
    let signal = planes.slice(s![.., 2.., ..]).mapv(f32::from);

    debug!("Unpacked stack of {} x {} samples", n, length);

    Ok(UnpackedBatch {
        signal,
        label,
        mask,
        stage,
    })
}

/// Stacks exported samples into a (N, 15, L, 1) array.
///
/// All samples must have the same length.
pub fn stack(samples: &[Sample]) -> Result<Array4<i16>> {
    let length = samples.first().map(Sample::len).unwrap_or(0);
    let mut out = Array4::<i16>::zeros((samples.len(), BATCH_ROWS, length, 1));

    for (index, sample) in samples.iter().enumerate() {
        if sample.len() != length {
            return Err(PsgError::ContractViolation(format!(
                "sample {} has length {}, expected {}",
                index,
                sample.len(),
                length
            )));
        }
        out.slice_mut(s![index, .., .., 0]).assign(&sample.export_batch());
    }

    Ok(out)
}
