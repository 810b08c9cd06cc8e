//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::types::EngineProgram;

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

/// Configuration for locating the engine binaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path to the transcoder binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Path to the probe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with explicit binary paths.
    pub fn with_paths(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// The binary path for the given program.
    pub fn program_path(&self, program: EngineProgram) -> &str {
        match program {
            EngineProgram::Transcoder => &self.ffmpeg_path,
            EngineProgram::Prober => &self.ffprobe_path,
        }
    }
}
