//! Error types for the diagnostics module.

use thiserror::Error;

/// Errors from parsing engine diagnostic text.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No duration line was found.
    #[error("No duration line in engine output")]
    MissingDuration,

    /// A duration token did not split into three clock components.
    #[error("Malformed duration token: {token}")]
    MalformedDuration { token: String },

    /// The text did not contain exactly two decibel readings.
    #[error("Expected exactly two decibel readings, found {found}")]
    AmbiguousVolumeStats { found: usize },

    /// A decibel reading failed to parse as a number.
    #[error("Malformed decibel reading: {token}")]
    MalformedVolume { token: String },

    /// No loudness measurement block was found.
    #[error("No loudness measurement in engine output")]
    MissingStats,

    /// The loudness measurement block failed to decode.
    #[error("Malformed loudness measurement: {0}")]
    InvalidStats(#[from] serde_json::Error),
}
