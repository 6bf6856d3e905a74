pub mod annotation;
pub mod batch;
pub mod corpus;
pub mod header;
pub mod sample;
pub mod signal;
pub mod types;

#[cfg(test)]
mod testutil;

use std::path::Path;

// Re-export types
pub use batch::{unpack, UnpackedBatch};
pub use sample::{discover, RecordingFiles, Sample};
pub use types::*;

/// Loads and validates the recording stored in a directory
///
/// # Examples
///
/// ```no_run
/// use psg_importer::load;
///
/// let result = load("data/training/tr03-0061");
/// match result {
///     Ok(sample) => println!("Samples: {} at {} Hz", sample.len(), sample.sample_rate()),
///     Err(e) => println!("Error loading recording: {}", e),
/// }
/// ```
pub fn load<P: AsRef<Path>>(dir: P) -> Result<Sample> {
    Sample::open(dir)
}
