//! Loading every recording under a dataset root.
//!
//! A root such as `data/training/` holds one directory per recording. Each is
//! opened independently; a recording that fails validation is reported and
//! skipped, never retried.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};

use crate::sample::Sample;
use crate::types::*;

/// Outcome of loading a dataset root.
#[derive(Debug, Default)]
pub struct CorpusReport {
    pub samples: Vec<Sample>,
    pub failures: Vec<(PathBuf, PsgError)>,
}

impl CorpusReport {
    /// Total number of recordings attempted.
    pub fn attempted(&self) -> usize {
        self.samples.len() + self.failures.len()
    }
}

/// Lists the immediate subdirectories of `root` holding a `.arousal` marker,
/// sorted by path.
pub fn find_recordings<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root.as_ref())? {
        let path = entry?.path();
        if path.is_dir() && has_marker(&path)? {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn has_marker(dir: &Path) -> Result<bool> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_marker = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(MARKER_SUFFIX));
        if is_marker && path.is_file() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Opens every recording under `root`, downsampling each by `stride` when
/// given.
///
/// Only a failure to list `root` itself is returned as an error.
pub fn load_all<P: AsRef<Path>>(root: P, stride: Option<usize>) -> Result<CorpusReport> {
    let tic = Instant::now();
    let dirs = find_recordings(root.as_ref())?;
    let mut report = CorpusReport::default();

    for (index, dir) in dirs.iter().enumerate() {
        info!("Loading recording {}/{}: {}", index + 1, dirs.len(), dir.display());

        let loaded = Sample::open(dir).and_then(|mut sample| {
            if let Some(stride) = stride {
                sample.downsample(stride)?;
            }
            Ok(sample)
        });

        match loaded {
            Ok(sample) => report.samples.push(sample),
            Err(e) => {
                warn!("Skipping {}: {}", dir.display(), e);
                report.failures.push((dir.clone(), e));
            }
        }
    }

    info!(
        "Loaded {} of {} recordings in {:.1} seconds",
        report.samples.len(),
        report.attempted(),
        tic.elapsed().as_secs_f64()
    );

    Ok(report)
}
