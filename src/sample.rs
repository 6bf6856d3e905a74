//! One recording held in memory: construction from a directory, decimation,
//! and the raw and batch exports.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, info};
use ndarray::{s, Array1, Array2, ArrayView3, Axis};

use crate::annotation::{self, Annotations, Group};
use crate::header;
use crate::signal;
use crate::types::*;

/// One recording: 13 signal leads plus the optional arousal and stage labels,
/// all of the same length.
///
/// Built either from a recording directory with [`Sample::open`] (every file
/// is validated) or from an exported batch with [`Sample::from_batch`]
/// (trusted, only the array shape is checked).
///
/// # Examples
///
/// ```no_run
/// use psg_importer::Sample;
///
/// let mut sample = Sample::open("data/training/tr03-0061").unwrap();
/// println!("{} samples at {} Hz", sample.len(), sample.sample_rate());
/// sample.downsample(20).unwrap();
/// let batch = sample.export_batch();
/// assert_eq!(batch.nrows(), 15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    name: Option<String>,
    sample_rate: f32,
    signal: Array2<i16>,
    labels: Option<Annotations>,
}

/// Paths of the files making up one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFiles {
    pub name: String,
    pub signal: PathBuf,
    /// `None` when the recording is unlabeled
    pub annotation: Option<PathBuf>,
    pub header: PathBuf,
}

/// Finds the single `*.arousal` marker in `dir` and derives the recording's
/// file set from its name.
pub fn discover<P: AsRef<Path>>(dir: P) -> Result<RecordingFiles> {
    let dir = dir.as_ref();

    let mut markers = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if file_name.ends_with(MARKER_SUFFIX) {
                markers.push(file_name.to_string());
            }
        }
    }

    if markers.len() != 1 {
        return Err(PsgError::CardinalityViolation {
            pattern: dir.join(format!("*{}", MARKER_SUFFIX)).display().to_string(),
            found: markers.len(),
        });
    }

    // The name is everything before the first dot: tr05-1176.arousal -> tr05-1176
    let marker = &markers[0];
    let name = marker.split('.').next().unwrap_or(marker).to_string();

    let annotation = dir.join(format!("{}{}", name, ANNOTATION_SUFFIX));
    Ok(RecordingFiles {
        signal: dir.join(format!("{}{}", name, SIGNAL_SUFFIX)),
        annotation: annotation.is_file().then_some(annotation),
        header: dir.join(format!("{}{}", name, HEADER_SUFFIX)),
        name,
    })
}

impl Sample {
    /// Loads and validates the recording stored in `dir`.
    ///
    /// Any failed check aborts the whole load; no partially built sample is
    /// ever returned.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with(dir, annotation::read_container)
    }

    pub(crate) fn open_with<P, F>(dir: P, read_annotations: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<Group>,
    {
        let tic = Instant::now();
        let files = discover(dir.as_ref())?;
        debug!("Opening recording {} in {}", files.name, dir.as_ref().display());

        let signal = signal::load_signal(&files.signal)?;
        let length = signal.ncols();

        let labels = match &files.annotation {
            Some(path) => Some(annotation::decode(&read_annotations(path)?, length)?),
            None => None,
        };

        header::read_header(&files.header, &files.name, length)?;

        let sample = Self::assemble(files.name, signal, labels)?;

        info!(
            "Loaded {}: {} samples, {}, {:.1} s",
            sample.name().unwrap_or_default(),
            sample.len(),
            if sample.is_labeled() { "labeled" } else { "unlabeled" },
            tic.elapsed().as_secs_f64()
        );

        Ok(sample)
    }

    fn assemble(name: String, signal: Array2<i16>, labels: Option<Annotations>) -> Result<Self> {
        if signal.nrows() != NUM_CHANNELS {
            return Err(schema(format!(
                "signal has {} channels, expected {}",
                signal.nrows(),
                NUM_CHANNELS
            )));
        }
        if let Some(labels) = &labels {
            let length = signal.ncols();
            if labels.arousal.len() != length || labels.stages.len() != length {
                return Err(schema(format!(
                    "label lengths {} / {} differ from signal length {}",
                    labels.arousal.len(),
                    labels.stages.len(),
                    length
                )));
            }
        }

        Ok(Self {
            name: Some(name),
            sample_rate: SAMPLE_RATE as f32,
            signal,
            labels,
        })
    }

    /// Rebuilds a sample from the batching pipeline's output, shape (15, L, 1).
    ///
    /// The producer is trusted: only the shape is checked and the label rows
    /// are narrowed without validating their domain. The result has no name
    /// and is assumed to be at the native sample rate.
    pub fn from_batch(batch: ArrayView3<i16>) -> Result<Self> {
        let (rows, length, depth) = batch.dim();
        if rows != BATCH_ROWS || depth != 1 {
            return Err(PsgError::ContractViolation(format!(
                "batch shape is {:?}, expected [{}, L, 1]",
                batch.shape(),
                BATCH_ROWS
            )));
        }

        let plane = batch.index_axis(Axis(2), 0);
        let arousal = plane.row(0).mapv(|v| v as i8);
        let stages = plane.row(1).mapv(|v| v as u8);
        let signal = plane.slice(s![2.., ..]).to_owned();
        debug!("Imported batch of {} samples", length);

        Ok(Self {
            name: None,
            sample_rate: SAMPLE_RATE as f32,
            signal,
            labels: Some(Annotations { arousal, stages }),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of samples per lead.
    pub fn len(&self) -> usize {
        self.signal.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Effective sample rate, lowered by every downsample.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Recording duration in seconds.
    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }

    /// Signal matrix, 13 x L.
    pub fn signal(&self) -> &Array2<i16> {
        &self.signal
    }

    pub fn arousal(&self) -> Option<&Array1<i8>> {
        self.labels.as_ref().map(|l| &l.arousal)
    }

    pub fn stages(&self) -> Option<&Array1<u8>> {
        self.labels.as_ref().map(|l| &l.stages)
    }

    pub fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }

    /// Keeps every `stride`-th sample, starting at the first. No filtering.
    pub fn downsample(&mut self, stride: usize) -> Result<()> {
        if stride == 0 {
            return Err(PsgError::InvalidStride(stride));
        }

        self.signal = self.signal.slice(s![.., ..;stride]).to_owned();
        if let Some(labels) = self.labels.as_mut() {
            labels.arousal = labels.arousal.slice(s![..;stride]).to_owned();
            labels.stages = labels.stages.slice(s![..;stride]).to_owned();
        }
        self.sample_rate /= stride as f32;

        Ok(())
    }

    /// [`Sample::downsample`] with the customary stride of 20 (200 Hz to 10 Hz).
    pub fn downsample_default(&mut self) -> Result<()> {
        self.downsample(DEFAULT_DOWNSAMPLE_STRIDE)
    }

    /// Channel-major (15, L) array: arousal, stage, then the 13 leads.
    ///
    /// An unlabeled sample exports every position as unscored arousal and
    /// undefined stage.
    pub fn export_batch(&self) -> Array2<i16> {
        let mut batch = Array2::<i16>::zeros((BATCH_ROWS, self.len()));
        match &self.labels {
            Some(labels) => {
                batch.row_mut(0).assign(&labels.arousal.mapv(i16::from));
                batch.row_mut(1).assign(&labels.stages.mapv(i16::from));
            }
            None => {
                batch.row_mut(0).fill(i16::from(AROUSAL_UNSCORED));
                batch.row_mut(1).fill(i16::from(UNDEFINED_STAGE));
            }
        }
        batch.slice_mut(s![2.., ..]).assign(&self.signal);
        batch
    }

    /// Writes the waveform viewer stream: sample-major little-endian int16,
    /// 15 columns per sample, each scaled and clipped.
    pub fn export_raw<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::with_capacity(65536, file);
        self.write_raw(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Same as [`Sample::export_raw`] into any writer.
    pub fn write_raw<W: Write>(&self, writer: &mut W) -> Result<()> {
        let batch = self.export_batch();
        let scales = raw_scales();

        for column in batch.columns() {
            for (&value, &scale) in column.iter().zip(scales.iter()) {
                let scaled = (i32::from(value) * scale).clamp(-RAW_CLIP, RAW_CLIP);
                writer.write_i16::<LittleEndian>(scaled as i16)?;
            }
        }

        Ok(())
    }
}

/// Per-row factors of the raw export, in batch row order.
pub fn raw_scales() -> [i32; BATCH_ROWS] {
    let mut scales = [0; BATCH_ROWS];
    scales[0] = AROUSAL_RAW_SCALE;
    scales[1] = STAGE_RAW_SCALE;
    for (scale, channel) in scales[2..].iter_mut().zip(CHANNELS.iter()) {
        *scale = channel.raw_scale;
    }
    scales
}
