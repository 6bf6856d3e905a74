use std::io;
use thiserror::Error;

/// Number of signal leads in every recording.
pub const NUM_CHANNELS: usize = 13;

/// Native sample rate of the signal matrix (Hz).
pub const SAMPLE_RATE: u32 = 200;

/// Rows of the channel-stacked batch layout: arousal, stage, then the signals.
pub const BATCH_ROWS: usize = NUM_CHANNELS + 2;

/// Stride used by [`crate::Sample::downsample_default`].
pub const DEFAULT_DOWNSAMPLE_STRIDE: usize = 20;

/// Name of the single variable held by the signal container.
pub const SIGNAL_VARIABLE: &str = "val";

// Header descriptor constants
pub const SIGNAL_FORMAT: &str = "16+24";
pub const ADC_RESOLUTION: &str = "16";
pub const ADC_ZERO: &str = "0";
pub const BLOCK_SIZE: &str = "0";

// File naming convention, keyed off the recording name
pub const MARKER_SUFFIX: &str = ".arousal";
pub const SIGNAL_SUFFIX: &str = ".mat";
pub const ANNOTATION_SUFFIX: &str = "-arousal.mat";
pub const HEADER_SUFFIX: &str = ".hea";

// Raw waveform export
pub const RAW_CLIP: i32 = 30000;
pub const AROUSAL_RAW_SCALE: i32 = 15000;
pub const STAGE_RAW_SCALE: i32 = 5000;

/// Canonical sleep stage names. The position in this table is the stage label.
pub const STAGE_NAMES: [&str; 6] = ["nonrem1", "nonrem2", "nonrem3", "rem", "undefined", "wake"];

/// Stage label used when a recording carries no annotations.
pub const UNDEFINED_STAGE: u8 = 4;

/// Arousal label for samples that were never scored.
pub const AROUSAL_UNSCORED: i8 = -1;

/// Fixed description of one signal lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Lead name as written in the header
    pub name: &'static str,
    /// Physical unit token as written in the header
    pub unit: &'static str,
    /// Integer factor applied before clipping in the raw waveform export
    pub raw_scale: i32,
}

const UV: &str = "1/uV";

/// The 13 leads in storage order.
pub const CHANNELS: [ChannelSpec; NUM_CHANNELS] = [
    ChannelSpec { name: "F3-M2", unit: UV, raw_scale: 400 },
    ChannelSpec { name: "F4-M1", unit: UV, raw_scale: 400 },
    ChannelSpec { name: "C3-M2", unit: UV, raw_scale: 400 },
    ChannelSpec { name: "C4-M1", unit: UV, raw_scale: 400 },
    ChannelSpec { name: "O1-M2", unit: UV, raw_scale: 100 },
    ChannelSpec { name: "O2-M1", unit: UV, raw_scale: 100 },
    ChannelSpec { name: "E1-M2", unit: UV, raw_scale: 1 },
    ChannelSpec { name: "Chin1-Chin2", unit: UV, raw_scale: 100 },
    ChannelSpec { name: "ABD", unit: UV, raw_scale: 100 },
    ChannelSpec { name: "CHEST", unit: UV, raw_scale: 100 },
    ChannelSpec { name: "AIRFLOW", unit: UV, raw_scale: 1000 },
    ChannelSpec { name: "SaO2", unit: "655.35(-32768)/%", raw_scale: 10 },
    ChannelSpec { name: "ECG", unit: "1000/mV", raw_scale: 10 },
];

/// Errors raised while importing or re-encoding a recording.
///
/// Every check is a hard precondition; none of these are recoverable for the
/// recording that raised them.
#[derive(Debug, Error)]
pub enum PsgError {
    /// A structure, shape, dtype or value did not match the fixed schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Exactly one file was required but zero or several matched
    #[error("Expected exactly one file matching '{pattern}', found {found}")]
    CardinalityViolation { pattern: String, found: usize },

    /// A batch array broke the (N,) 15 x L x 1 interchange contract
    #[error("Batch contract violation: {0}")]
    ContractViolation(String),

    /// Downsampling needs a stride of at least one
    #[error("Invalid downsample stride: {0}")]
    InvalidStride(usize),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The signal container could not be parsed as a MATLAB file
    #[error("Failed to parse MATLAB file: {0}")]
    MatFile(String),

    /// The annotation container could not be read
    #[error("HDF5 error: {0}")]
    Hdf5(String),

    /// An annotation file exists but no backend can read it
    #[error("Unsupported annotation container: {0}")]
    UnsupportedContainer(String),
}

pub type Result<T> = std::result::Result<T, PsgError>;

pub(crate) fn schema(msg: impl Into<String>) -> PsgError {
    PsgError::SchemaViolation(msg.into())
}
