//! Error types for the normalizer module.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::ParseError;
use crate::engine::EngineError;

/// Errors that can occur while normalizing a file.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// An engine pass failed.
    #[error("Engine pass failed: {0}")]
    Engine(#[from] EngineError),

    /// Engine diagnostics did not contain the expected measurements.
    #[error("Diagnostics did not parse: {0}")]
    Parse(#[from] ParseError),

    /// I/O error while managing artifact files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    /// Whether this error is a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Engine(e) if e.is_cancelled())
    }
}
