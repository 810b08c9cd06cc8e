//! Core types shared across the engine module.

use std::borrow::Cow;
use std::fmt;

/// Which executable an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineProgram {
    /// The transcoder binary, `ffmpeg` by default.
    Transcoder,
    /// The probe binary, `ffprobe` by default.
    Prober,
}

/// The merged output of one engine run.
///
/// Each stream is drained into its own buffer while the process runs; the
/// buffers are concatenated once both drains finish, standard output first,
/// then standard error. Ordering between the two streams across that seam is
/// not preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    bytes: Vec<u8>,
}

impl CapturedOutput {
    /// Assembles the merged output from the two drained stream buffers.
    pub fn from_streams(stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        let mut bytes = stdout;
        bytes.extend_from_slice(&stderr);
        Self { bytes }
    }

    /// The raw merged bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The merged output decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Total number of merged bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the run produced no output at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
