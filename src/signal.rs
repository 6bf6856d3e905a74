//! Loader for the `{name}.mat` signal container (MATLAB v5).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use matfile::{MatFile, NumericData};
use ndarray::{Array2, ShapeBuilder};

use crate::types::*;

/// Loads the signal matrix, 13 x L, 16-bit signed.
pub fn load_signal<P: AsRef<Path>>(path: P) -> Result<Array2<i16>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::with_capacity(65536, file);
    read_signal(reader)
}

/// Parses a signal container from any reader.
pub fn read_signal<R: Read>(reader: R) -> Result<Array2<i16>> {
    let mat_file = MatFile::parse(reader).map_err(|e| PsgError::MatFile(format!("{:?}", e)))?;
    let arrays = mat_file.arrays();

    if arrays.len() != 1 {
        return Err(schema(format!(
            "signal container holds {} variables, expected 1",
            arrays.len()
        )));
    }
    let array = &arrays[0];
    if array.name() != SIGNAL_VARIABLE {
        return Err(schema(format!(
            "signal variable is named '{}', expected '{}'",
            array.name(),
            SIGNAL_VARIABLE
        )));
    }

    let size = array.size();
    if size.len() != 2 || size[0] != NUM_CHANNELS {
        return Err(schema(format!(
            "signal shape is {:?}, expected [{}, L]",
            size, NUM_CHANNELS
        )));
    }
    let length = size[1];

    let values = match array.data() {
        NumericData::Int16 { real, imag: None } => real.clone(),
        NumericData::Int16 { imag: Some(_), .. } => {
            return Err(schema("signal is complex, expected real int16"));
        }
        other => {
            return Err(schema(format!(
                "signal dtype is {}, expected int16",
                dtype_name(other)
            )));
        }
    };

    // MATLAB stores column-major; keep that layout rather than copying.
    let signal = Array2::from_shape_vec((NUM_CHANNELS, length).f(), values)
        .map_err(|e| schema(format!("signal data does not fill its shape: {}", e)))?;

    debug!("Loaded signal matrix {} x {}", NUM_CHANNELS, length);

    Ok(signal)
}

fn dtype_name(data: &NumericData) -> &'static str {
    match data {
        NumericData::Double { .. } => "float64",
        NumericData::Single { .. } => "float32",
        NumericData::Int8 { .. } => "int8",
        NumericData::Int16 { .. } => "int16",
        NumericData::Int32 { .. } => "int32",
        NumericData::Int64 { .. } => "int64",
        NumericData::UInt8 { .. } => "uint8",
        NumericData::UInt16 { .. } => "uint16",
        NumericData::UInt32 { .. } => "uint32",
        NumericData::UInt64 { .. } => "uint64",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{mat_bytes, mat_bytes_f64, ramp_signal};
    use std::io::Cursor;

    #[test]
    fn reads_int16_matrix() {
        let expected = ramp_signal(5);
        let bytes = mat_bytes("val", &expected);
        let signal = read_signal(Cursor::new(bytes)).unwrap();
        assert_eq!(signal.dim(), (NUM_CHANNELS, 5));
        assert_eq!(signal, expected);
    }

    #[test]
    fn rejects_wrong_variable_name() {
        let bytes = mat_bytes("data", &ramp_signal(3));
        let err = read_signal(Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("'data'"));
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let signal = Array2::<i16>::zeros((12, 3));
        let err = read_signal(Cursor::new(mat_bytes("val", &signal))).unwrap_err();
        assert!(matches!(err, PsgError::SchemaViolation(_)));
    }

    #[test]
    fn rejects_float_signal() {
        let bytes = mat_bytes_f64("val", NUM_CHANNELS, 3, &[0.0; NUM_CHANNELS * 3]);
        let err = read_signal(Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("float64"));
    }
}
