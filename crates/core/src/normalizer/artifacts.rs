//! Artifact naming for pipeline outputs.

use std::path::{Path, PathBuf};

/// Extension of the two-pass loudness intermediate.
const LOUDNORM_EXTENSION: &str = "loudnorm.mkv";

/// Extension of the peak corrective intermediate.
const PEAK_EXTENSION: &str = "peakloud.mkv";

/// Extension of the final normalized output.
const NORMALIZED_EXTENSION: &str = "normalized.mkv";

/// Extension of a wav conversion output.
const WAV_EXTENSION: &str = "wav";

/// The artifact paths of one file's trip through the pipeline.
///
/// Every output derives from the input path with its extension swapped,
/// so artifacts land next to the input. The loudnorm and peak outputs are
/// intermediates, deleted or renamed away by the stage that supersedes
/// them; the input itself is never written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    input: PathBuf,
}

impl FileJob {
    /// Creates a job for one input path.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// The original input path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Output of the two-pass loudness stage.
    pub fn loudnorm_output(&self) -> PathBuf {
        self.input.with_extension(LOUDNORM_EXTENSION)
    }

    /// Output of the peak corrective stage.
    pub fn peak_output(&self) -> PathBuf {
        self.input.with_extension(PEAK_EXTENSION)
    }

    /// Final output the pipeline renames into.
    pub fn normalized_output(&self) -> PathBuf {
        self.input.with_extension(NORMALIZED_EXTENSION)
    }

    /// Output of a wav conversion.
    pub fn wav_output(&self) -> PathBuf {
        self.input.with_extension(WAV_EXTENSION)
    }
}
